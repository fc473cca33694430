use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::SchemaError;

/// Every column the pipeline knows about, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Column {
    Company,
    Channel,
    CampaignGoal,
    CustomerSegment,
    Clicks,
    Impressions,
    Roi,
    AcquisitionCost,
    ConversionRate,
    Date,
    Ctr,
    Month,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Company,
        Column::Channel,
        Column::CampaignGoal,
        Column::CustomerSegment,
        Column::Clicks,
        Column::Impressions,
        Column::Roi,
        Column::AcquisitionCost,
        Column::ConversionRate,
        Column::Date,
        Column::Ctr,
        Column::Month,
    ];

    /// Header name used in CSV files.
    pub fn header(self) -> &'static str {
        match self {
            Column::Company => "Company",
            Column::Channel => "Channel_Used",
            Column::CampaignGoal => "Campaign_Goal",
            Column::CustomerSegment => "Customer_Segment",
            Column::Clicks => "Clicks",
            Column::Impressions => "Impressions",
            Column::Roi => "ROI",
            Column::AcquisitionCost => "Acquisition_Cost",
            Column::ConversionRate => "Conversion_Rate",
            Column::Date => "Date",
            Column::Ctr => "CTR",
            Column::Month => "Month",
        }
    }

    pub fn from_header(name: &str) -> Option<Column> {
        let name = name.trim();
        Column::ALL.into_iter().find(|c| c.header() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One CSV row before any parsing. Absent columns deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRow {
    #[serde(rename = "Company", default)]
    pub company: Option<String>,
    #[serde(rename = "Channel_Used", default)]
    pub channel: Option<String>,
    #[serde(rename = "Campaign_Goal", default)]
    pub campaign_goal: Option<String>,
    #[serde(rename = "Customer_Segment", default)]
    pub customer_segment: Option<String>,
    #[serde(rename = "Clicks", default)]
    pub clicks: Option<String>,
    #[serde(rename = "Impressions", default)]
    pub impressions: Option<String>,
    #[serde(rename = "ROI", default)]
    pub roi: Option<String>,
    #[serde(rename = "Acquisition_Cost", default)]
    pub acquisition_cost: Option<String>,
    #[serde(rename = "Conversion_Rate", default)]
    pub conversion_rate: Option<String>,
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "CTR", default)]
    pub ctr: Option<String>,
    #[serde(rename = "Month", default)]
    pub month: Option<String>,
}

impl RawRow {
    pub fn cell(&self, column: Column) -> Option<&str> {
        let v = match column {
            Column::Company => &self.company,
            Column::Channel => &self.channel,
            Column::CampaignGoal => &self.campaign_goal,
            Column::CustomerSegment => &self.customer_segment,
            Column::Clicks => &self.clicks,
            Column::Impressions => &self.impressions,
            Column::Roi => &self.roi,
            Column::AcquisitionCost => &self.acquisition_cost,
            Column::ConversionRate => &self.conversion_rate,
            Column::Date => &self.date,
            Column::Ctr => &self.ctr,
            Column::Month => &self.month,
        };
        v.as_deref()
    }

    pub fn cell_mut(&mut self, column: Column) -> &mut Option<String> {
        match column {
            Column::Company => &mut self.company,
            Column::Channel => &mut self.channel,
            Column::CampaignGoal => &mut self.campaign_goal,
            Column::CustomerSegment => &mut self.customer_segment,
            Column::Clicks => &mut self.clicks,
            Column::Impressions => &mut self.impressions,
            Column::Roi => &mut self.roi,
            Column::AcquisitionCost => &mut self.acquisition_cost,
            Column::ConversionRate => &mut self.conversion_rate,
            Column::Date => &mut self.date,
            Column::Ctr => &mut self.ctr,
            Column::Month => &mut self.month,
        }
    }
}

/// A table exactly as it was read: the header set plus unparsed rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: BTreeSet<Column>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }
}

/// A typed campaign row. Every cell is nullable; `ctr` and `month` are derived
/// during validation unless the source table already carried them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CampaignRecord {
    pub company: Option<String>,
    pub channel: Option<String>,
    pub campaign_goal: Option<String>,
    pub customer_segment: Option<String>,
    pub clicks: Option<u64>,
    pub impressions: Option<u64>,
    pub roi: Option<f64>,
    pub acquisition_cost: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub date: Option<NaiveDate>,
    pub ctr: Option<f64>,
    pub month: Option<u32>,
}

impl CampaignRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Clicks => self.clicks.map(|v| v as f64),
            Metric::Impressions => self.impressions.map(|v| v as f64),
            Metric::Roi => self.roi,
            Metric::AcquisitionCost => self.acquisition_cost,
            Metric::ConversionRate => self.conversion_rate,
            Metric::Ctr => self.ctr,
        }
    }

    pub fn key(&self, dimension: Dimension) -> GroupKey {
        let text = |v: &Option<String>| match v.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => GroupKey::Text(s.to_string()),
            _ => GroupKey::Missing,
        };
        match dimension {
            Dimension::Company => text(&self.company),
            Dimension::Channel => text(&self.channel),
            Dimension::CampaignGoal => text(&self.campaign_goal),
            Dimension::CustomerSegment => text(&self.customer_segment),
            Dimension::Month => self.month.map_or(GroupKey::Missing, GroupKey::Month),
        }
    }
}

/// A validated table. Cheap to clone: rows are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignTable {
    columns: BTreeSet<Column>,
    rows: Arc<Vec<CampaignRecord>>,
}

impl CampaignTable {
    pub(crate) fn new(columns: BTreeSet<Column>, rows: Vec<CampaignRecord>) -> Self {
        Self {
            columns,
            rows: Arc::new(rows),
        }
    }

    pub fn rows(&self) -> &[CampaignRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Columns from `needed` that this table lacks, in canonical order.
    pub fn missing(&self, needed: &[Column]) -> Vec<String> {
        let mut missing: Vec<Column> = needed.iter().copied().filter(|c| !self.has(*c)).collect();
        missing.sort();
        missing.dedup();
        missing.into_iter().map(|c| c.header().to_string()).collect()
    }

    /// Gate for consumers that need columns beyond the validation minimum.
    pub fn require(&self, needed: &[Column]) -> Result<(), SchemaError> {
        let missing = self.missing(needed);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns(missing))
        }
    }

    /// Copy of this table restricted to the rows matching `keep`.
    pub fn filtered<F>(&self, keep: F) -> CampaignTable
    where
        F: Fn(&CampaignRecord) -> bool,
    {
        let rows = self.rows.iter().filter(|r| keep(r)).cloned().collect();
        CampaignTable::new(self.columns.clone(), rows)
    }
}

/// Categorical columns a table can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dimension {
    Company,
    Channel,
    CampaignGoal,
    CustomerSegment,
    Month,
}

impl Dimension {
    pub fn column(self) -> Column {
        match self {
            Dimension::Company => Column::Company,
            Dimension::Channel => Column::Channel,
            Dimension::CampaignGoal => Column::CampaignGoal,
            Dimension::CustomerSegment => Column::CustomerSegment,
            Dimension::Month => Column::Month,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column().header())
    }
}

/// Numeric columns that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Metric {
    Clicks,
    Impressions,
    Roi,
    AcquisitionCost,
    ConversionRate,
    Ctr,
}

impl Metric {
    pub fn column(self) -> Column {
        match self {
            Metric::Clicks => Column::Clicks,
            Metric::Impressions => Column::Impressions,
            Metric::Roi => Column::Roi,
            Metric::AcquisitionCost => Column::AcquisitionCost,
            Metric::ConversionRate => Column::ConversionRate,
            Metric::Ctr => Column::Ctr,
        }
    }
}

/// Value of one grouping column for one group. Null and blank cells share the
/// `Missing` group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Text(String),
    Month(u32),
    Missing,
}

impl GroupKey {
    pub fn as_month(&self) -> Option<u32> {
        match self {
            GroupKey::Month(m) => Some(*m),
            _ => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Text(s) => f.write_str(s),
            GroupKey::Month(m) => write!(f, "{m}"),
            GroupKey::Missing => f.write_str("(none)"),
        }
    }
}
