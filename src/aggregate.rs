use crate::error::{CampaignError, Result};
use crate::types::{CampaignTable, Dimension, GroupKey, Metric};
use crate::util::mean;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggOp {
    Mean,
    Sum,
    Count,
}

/// One group of an aggregation. `value` is `None` only for a mean over a
/// group whose metric cells were all null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<GroupKey>,
    pub value: Option<f64>,
}

impl AggregateRow {
    /// Group key rendered for display, multi-column keys joined with " / ".
    pub fn label(&self) -> String {
        self.key
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    pub dimensions: Vec<Dimension>,
    pub metric: Metric,
    pub op: AggOp,
    pub rows: Vec<AggregateRow>,
}

impl AggregationResult {
    /// Group with the strictly greatest value; ties keep the first group seen.
    pub fn idxmax(&self) -> Option<&AggregateRow> {
        self.pick(|candidate, best| candidate > best)
    }

    /// Group with the strictly smallest value; ties keep the first group seen.
    pub fn idxmin(&self) -> Option<&AggregateRow> {
        self.pick(|candidate, best| candidate < best)
    }

    fn pick<F>(&self, better: F) -> Option<&AggregateRow>
    where
        F: Fn(f64, f64) -> bool,
    {
        let mut best: Option<(&AggregateRow, f64)> = None;
        for row in &self.rows {
            let Some(v) = row.value else { continue };
            match best {
                Some((_, b)) if !better(v, b) => {}
                _ => best = Some((row, v)),
            }
        }
        best.map(|(row, _)| row)
    }

    /// The `n` largest groups in ascending order. Null values sort first.
    pub fn top_n(&self, n: usize) -> Vec<AggregateRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| cmp_values(a.value, b.value));
        let skip = rows.len().saturating_sub(n);
        rows.split_off(skip)
    }

    /// Rows ordered by their key; months sort numerically.
    pub fn sorted_by_key(&self) -> Vec<AggregateRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        rows
    }

    pub fn value_of(&self, key: &[GroupKey]) -> Option<f64> {
        self.rows.iter().find(|r| r.key == key).and_then(|r| r.value)
    }
}

fn cmp_values(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Group `table` by `group_by` and reduce `metric` with `op`.
///
/// Groups come back in the order their first row appears. Null metric cells
/// are left out of every statistic.
pub fn aggregate(
    table: &CampaignTable,
    group_by: &[Dimension],
    metric: Metric,
    op: AggOp,
) -> Result<AggregationResult> {
    if table.is_empty() {
        return Err(CampaignError::EmptyTable);
    }

    #[derive(Default)]
    struct Acc {
        sum: f64,
        count: usize,
    }

    let mut order: Vec<Vec<GroupKey>> = Vec::new();
    let mut map: HashMap<Vec<GroupKey>, Acc> = HashMap::new();
    for r in table.rows() {
        let key: Vec<GroupKey> = group_by.iter().map(|d| r.key(*d)).collect();
        let e = map.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Acc::default()
        });
        if let Some(v) = r.metric(metric) {
            e.sum += v;
            e.count += 1;
        }
    }

    let rows: Vec<AggregateRow> = order
        .into_iter()
        .map(|key| {
            let acc = &map[&key];
            let value = match op {
                AggOp::Sum => Some(acc.sum),
                AggOp::Count => Some(acc.count as f64),
                AggOp::Mean if acc.count == 0 => None,
                AggOp::Mean => Some(acc.sum / acc.count as f64),
            };
            AggregateRow { key, value }
        })
        .collect();
    debug!(?group_by, ?metric, ?op, groups = rows.len(), "aggregated");

    Ok(AggregationResult {
        dimensions: group_by.to_vec(),
        metric,
        op,
        rows,
    })
}

/// Shorthand for the common single-dimension case.
pub fn aggregate_by(
    table: &CampaignTable,
    dimension: Dimension,
    metric: Metric,
    op: AggOp,
) -> Result<AggregationResult> {
    aggregate(table, &[dimension], metric, op)
}

/// Per-group statistics shown side by side in the dashboard tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub key: GroupKey,
    pub campaigns: usize,
    pub total_clicks: u64,
    pub mean_roi: Option<f64>,
    pub mean_ctr: Option<f64>,
    pub mean_conversion: Option<f64>,
}

pub fn group_summary(table: &CampaignTable, dimension: Dimension) -> Result<Vec<GroupSummary>> {
    if table.is_empty() {
        return Err(CampaignError::EmptyTable);
    }
    let mut order: Vec<GroupKey> = Vec::new();
    let mut members: HashMap<GroupKey, Vec<usize>> = HashMap::new();
    for (idx, r) in table.rows().iter().enumerate() {
        let key = r.key(dimension);
        members
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(idx);
    }

    let rows = table.rows();
    Ok(order
        .into_iter()
        .map(|key| {
            let idx = &members[&key];
            let pick = |m: Metric| idx.iter().map(move |i| rows[*i].metric(m));
            GroupSummary {
                campaigns: idx.len(),
                total_clicks: idx.iter().filter_map(|i| rows[*i].clicks).sum(),
                mean_roi: mean(pick(Metric::Roi)),
                mean_ctr: mean(pick(Metric::Ctr)),
                mean_conversion: mean(pick(Metric::ConversionRate)),
                key,
            }
        })
        .collect())
}

/// Number of distinct groups along `dimension`, the missing group included.
pub fn distinct_count(table: &CampaignTable, dimension: Dimension) -> usize {
    table
        .rows()
        .iter()
        .map(|r| r.key(dimension))
        .collect::<HashSet<_>>()
        .len()
}

/// Mean of `metric` per month, ascending by month. Rows without a month and
/// months with no usable values are skipped.
pub fn monthly_means(table: &CampaignTable, metric: Metric) -> Result<Vec<(u32, f64)>> {
    let result = aggregate_by(table, Dimension::Month, metric, AggOp::Mean)?;
    let mut series: Vec<(u32, f64)> = result
        .rows
        .iter()
        .filter_map(|r| Some((r.key.first()?.as_month()?, r.value?)))
        .collect();
    series.sort_by_key(|(m, _)| *m);
    Ok(series)
}

/// Sub-table holding a single client's campaigns.
pub fn filter_company(table: &CampaignTable, company: &str) -> Result<CampaignTable> {
    let wanted = GroupKey::Text(company.trim().to_string());
    let sub = table.filtered(|r| r.key(Dimension::Company) == wanted);
    if sub.is_empty() {
        return Err(CampaignError::UnknownClient(company.to_string()));
    }
    Ok(sub)
}

/// Sorted list of client names present in the table.
pub fn companies(table: &CampaignTable) -> Vec<String> {
    let mut names: Vec<String> = table
        .rows()
        .iter()
        .filter_map(|r| match r.key(Dimension::Company) {
            GroupKey::Text(s) => Some(s),
            _ => None,
        })
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    names.sort();
    names
}

/// Table-wide headline numbers. Shared by the views and the PDF report so the
/// two always agree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub campaigns: usize,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub avg_roi: Option<f64>,
    pub avg_ctr: Option<f64>,
    pub avg_acquisition_cost: Option<f64>,
    pub avg_conversion_rate: Option<f64>,
}

impl Kpis {
    pub fn compute(table: &CampaignTable) -> Result<Kpis> {
        if table.is_empty() {
            return Err(CampaignError::EmptyTable);
        }
        let rows = table.rows();
        let col = |m: Metric| {
            if table.has(m.column()) {
                mean(rows.iter().map(|r| r.metric(m)))
            } else {
                None
            }
        };
        Ok(Kpis {
            campaigns: rows.len(),
            total_clicks: rows.iter().filter_map(|r| r.clicks).sum(),
            total_impressions: rows.iter().filter_map(|r| r.impressions).sum(),
            avg_roi: col(Metric::Roi),
            avg_ctr: col(Metric::Ctr),
            avg_acquisition_cost: col(Metric::AcquisitionCost),
            avg_conversion_rate: col(Metric::ConversionRate),
        })
    }
}
