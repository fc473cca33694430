use crate::aggregate::{AggOp, AggregateRow, AggregationResult, GroupSummary, Kpis};
use crate::error::Result;
use crate::insights::Insight;
use crate::labels::{label, Label, Locale};
use crate::model::FeatureWeight;
use crate::projection::Projection;
use crate::types::{CampaignTable, Column, GroupKey};
use crate::util::{
    format_currency, format_fraction_percent, format_int, format_number, format_percent,
    format_roi, or_na,
};
use crate::views::MonthlyPoint;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct KpiRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PlatformRow {
    #[serde(rename = "Platform")]
    #[tabled(rename = "Platform")]
    pub platform: String,
    #[serde(rename = "Campaigns")]
    #[tabled(rename = "Campaigns")]
    pub campaigns: String,
    #[serde(rename = "Clicks")]
    #[tabled(rename = "Clicks")]
    pub clicks: String,
    #[serde(rename = "AvgROI")]
    #[tabled(rename = "Avg ROI")]
    pub avg_roi: String,
    #[serde(rename = "AvgCTR")]
    #[tabled(rename = "Avg CTR")]
    pub avg_ctr: String,
    #[serde(rename = "Conversion")]
    #[tabled(rename = "Conversion")]
    pub conversion: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct GroupValueRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MonthRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: u32,
    #[serde(rename = "AvgROI")]
    #[tabled(rename = "Avg ROI")]
    pub avg_roi: String,
    #[serde(rename = "Clicks")]
    #[tabled(rename = "Clicks")]
    pub clicks: String,
    #[serde(rename = "Conversion")]
    #[tabled(rename = "Conversion")]
    pub conversion: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct InsightRow {
    #[serde(rename = "Insight")]
    #[tabled(rename = "Insight")]
    pub title: String,
    #[serde(rename = "Rationale")]
    #[tabled(rename = "Rationale")]
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ForecastRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: u32,
    #[serde(rename = "ProjectedROI")]
    #[tabled(rename = "Projected ROI")]
    pub roi: String,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct FeatureRow {
    #[serde(rename = "Feature")]
    #[tabled(rename = "Feature")]
    pub feature: String,
    #[serde(rename = "Importance")]
    #[tabled(rename = "Importance")]
    pub importance: String,
}

pub fn kpi_rows(kpis: &Kpis, locale: Locale) -> Vec<KpiRow> {
    let row = |key: Label, value: String| KpiRow {
        metric: label(locale, key).to_string(),
        value,
    };
    vec![
        row(Label::TotalRecords, format_int(kpis.campaigns)),
        row(Label::TotalClicks, format_int(kpis.total_clicks)),
        row(Label::TotalImpressions, format_int(kpis.total_impressions)),
        row(Label::AvgRoi, or_na(kpis.avg_roi, format_roi)),
        row(Label::AvgCtr, or_na(kpis.avg_ctr, format_percent)),
        row(
            Label::AvgCost,
            or_na(kpis.avg_acquisition_cost, |v| format_currency(v, 0)),
        ),
        row(
            Label::AvgConversion,
            or_na(kpis.avg_conversion_rate, format_fraction_percent),
        ),
    ]
}

pub fn platform_rows(groups: &[GroupSummary]) -> Vec<PlatformRow> {
    groups
        .iter()
        .map(|g| PlatformRow {
            platform: g.key.to_string(),
            campaigns: format_int(g.campaigns),
            clicks: format_int(g.total_clicks),
            avg_roi: or_na(g.mean_roi, format_roi),
            avg_ctr: or_na(g.mean_ctr, format_percent),
            conversion: or_na(g.mean_conversion, format_fraction_percent),
        })
        .collect()
}

pub fn value_rows(rows: &[AggregateRow], fmt: fn(f64) -> String) -> Vec<GroupValueRow> {
    rows.iter()
        .map(|r| GroupValueRow {
            group: r.label(),
            value: or_na(r.value, fmt),
        })
        .collect()
}

pub fn month_rows(points: &[MonthlyPoint]) -> Vec<MonthRow> {
    points
        .iter()
        .map(|p| MonthRow {
            month: p.month,
            avg_roi: or_na(p.mean_roi, format_roi),
            clicks: format_int(p.total_clicks),
            conversion: or_na(p.mean_conversion, format_fraction_percent),
        })
        .collect()
}

pub fn insight_rows(insights: &[Insight]) -> Vec<InsightRow> {
    insights
        .iter()
        .map(|i| InsightRow {
            title: i.title.clone(),
            rationale: i.rationale.clone(),
        })
        .collect()
}

pub fn forecast_rows(projection: &Projection) -> Vec<ForecastRow> {
    projection
        .points
        .iter()
        .map(|p| ForecastRow {
            month: p.month,
            roi: format_roi(p.value),
        })
        .collect()
}

pub fn feature_rows(weights: &[FeatureWeight]) -> Vec<FeatureRow> {
    weights
        .iter()
        .map(|w| FeatureRow {
            feature: w.feature.clone(),
            importance: format_number(w.importance, 4),
        })
        .collect()
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

fn key_cell(key: &GroupKey) -> String {
    match key {
        GroupKey::Missing => String::new(),
        other => other.to_string(),
    }
}

/// Write an aggregation as plain CSV: one column per grouping dimension plus
/// the reduced metric, values unformatted. Rows are ordered by key.
pub fn export_aggregation(path: &Path, result: &AggregationResult) -> Result<()> {
    let op = match result.op {
        AggOp::Mean => "mean",
        AggOp::Sum => "sum",
        AggOp::Count => "count",
    };
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header: Vec<String> = result
        .dimensions
        .iter()
        .map(|d| d.column().header().to_string())
        .collect();
    header.push(format!("{}_{op}", result.metric.column().header()));
    wtr.write_record(&header)?;
    for row in result.sorted_by_key() {
        let mut record: Vec<String> = row.key.iter().map(key_cell).collect();
        record.push(row.value.map(|v| v.to_string()).unwrap_or_default());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = result.rows.len(), "exported aggregation");
    Ok(())
}

/// Write the validated table, derived columns included. Columns the source
/// never had are left out.
pub fn export_table(path: &Path, table: &CampaignTable) -> Result<()> {
    let columns: Vec<Column> = table.columns().iter().copied().collect();
    let raw = table.to_raw();
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(columns.iter().map(|c| c.header()))?;
    for row in &raw.rows {
        wtr.write_record(columns.iter().map(|c| row.cell(*c).unwrap_or("")))?;
    }
    wtr.flush()?;
    info!(path = %path.display(), rows = raw.rows.len(), "exported validated table");
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows.
pub fn render_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{title}\n");
    println!("{}\n", render_rows(rows, max_rows));
    if rows.len() > max_rows {
        println!("({} more rows not shown)\n", format_int(rows.len() - max_rows));
    }
}
