//! Schema validation: checks required columns, parses cells into typed
//! records and derives `CTR` and `Month` when the source lacks them.

use crate::error::SchemaError;
use crate::types::{CampaignRecord, CampaignTable, Column, RawRow, RawTable};
use crate::util::{non_blank, parse_date_cell, parse_f64_cell, parse_u64_cell, round2};
use chrono::Datelike;
use tracing::debug;

/// Columns every aggregation needs.
pub const REQUIRED_COLUMNS: [Column; 6] = [
    Column::Company,
    Column::Channel,
    Column::CampaignGoal,
    Column::Clicks,
    Column::Impressions,
    Column::Roi,
];

/// Click-through rate in percent, rounded to two decimals. `None` when there
/// were no impressions to divide by.
pub fn derive_ctr(clicks: Option<u64>, impressions: Option<u64>) -> Option<f64> {
    match (clicks, impressions) {
        (Some(c), Some(i)) if i > 0 => Some(round2(c as f64 / i as f64 * 100.0)),
        _ => None,
    }
}

/// Validate a raw table and return a typed copy with derived columns.
///
/// The input is never modified. A table that already carries `CTR` or
/// `Month` keeps those values as they are.
pub fn validate(raw: &RawTable) -> Result<CampaignTable, SchemaError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !raw.has(**c))
        .map(|c| c.header().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns(missing));
    }

    let derive_ctr_col = !raw.has(Column::Ctr);
    let derive_month_col = !raw.has(Column::Month) && raw.has(Column::Date);

    let mut rows = Vec::with_capacity(raw.rows.len());
    for (idx, row) in raw.rows.iter().enumerate() {
        let mut record = parse_row(idx + 1, row)?;
        if derive_ctr_col {
            record.ctr = derive_ctr(record.clicks, record.impressions);
        }
        if derive_month_col {
            record.month = record.date.map(|d| d.month());
        }
        rows.push(record);
    }

    let mut columns = raw.columns.clone();
    columns.insert(Column::Ctr);
    if derive_month_col {
        columns.insert(Column::Month);
    }
    debug!(
        rows = rows.len(),
        derived_ctr = derive_ctr_col,
        derived_month = derive_month_col,
        "validated campaign table"
    );
    Ok(CampaignTable::new(columns, rows))
}

fn malformed(column: Column, row: usize, value: Option<&str>, reason: String) -> SchemaError {
    SchemaError::MalformedField {
        field: column.header().to_string(),
        row,
        value: value.unwrap_or_default().to_string(),
        reason,
    }
}

fn parse_row(row_no: usize, row: &RawRow) -> Result<CampaignRecord, SchemaError> {
    let text = |c: Column| non_blank(row.cell(c)).map(str::to_string);
    let float = |c: Column| {
        parse_f64_cell(row.cell(c)).map_err(|reason| malformed(c, row_no, row.cell(c), reason))
    };
    let count = |c: Column| {
        parse_u64_cell(row.cell(c)).map_err(|reason| malformed(c, row_no, row.cell(c), reason))
    };

    let acquisition_cost = float(Column::AcquisitionCost)?;
    if matches!(acquisition_cost, Some(v) if v < 0.0) {
        return Err(malformed(
            Column::AcquisitionCost,
            row_no,
            row.cell(Column::AcquisitionCost),
            "must not be negative".to_string(),
        ));
    }

    let conversion_rate = float(Column::ConversionRate)?;
    if matches!(conversion_rate, Some(v) if !(0.0..=1.0).contains(&v)) {
        return Err(malformed(
            Column::ConversionRate,
            row_no,
            row.cell(Column::ConversionRate),
            "must be a fraction between 0 and 1".to_string(),
        ));
    }

    let date = parse_date_cell(row.cell(Column::Date))
        .map_err(|reason| malformed(Column::Date, row_no, row.cell(Column::Date), reason))?;

    let month = match count(Column::Month)? {
        Some(m) if (1..=12).contains(&m) => Some(m as u32),
        Some(_) => {
            return Err(malformed(
                Column::Month,
                row_no,
                row.cell(Column::Month),
                "month must be between 1 and 12".to_string(),
            ))
        }
        None => None,
    };

    Ok(CampaignRecord {
        company: text(Column::Company),
        channel: text(Column::Channel),
        campaign_goal: text(Column::CampaignGoal),
        customer_segment: text(Column::CustomerSegment),
        clicks: count(Column::Clicks)?,
        impressions: count(Column::Impressions)?,
        roi: float(Column::Roi)?,
        acquisition_cost,
        conversion_rate,
        date,
        ctr: float(Column::Ctr)?,
        month,
    })
}

impl CampaignTable {
    /// Convert back to raw cells, including derived columns. Feeding the
    /// result to [`validate`] yields an identical table.
    pub fn to_raw(&self) -> RawTable {
        let has = |c: Column| self.has(c);
        let num = |c: Column, v: Option<f64>| if has(c) { v.map(|v| v.to_string()) } else { None };
        let int = |c: Column, v: Option<u64>| if has(c) { v.map(|v| v.to_string()) } else { None };
        let text = |c: Column, v: &Option<String>| if has(c) { v.clone() } else { None };

        let rows = self
            .rows()
            .iter()
            .map(|r| RawRow {
                company: text(Column::Company, &r.company),
                channel: text(Column::Channel, &r.channel),
                campaign_goal: text(Column::CampaignGoal, &r.campaign_goal),
                customer_segment: text(Column::CustomerSegment, &r.customer_segment),
                clicks: int(Column::Clicks, r.clicks),
                impressions: int(Column::Impressions, r.impressions),
                roi: num(Column::Roi, r.roi),
                acquisition_cost: num(Column::AcquisitionCost, r.acquisition_cost),
                conversion_rate: num(Column::ConversionRate, r.conversion_rate),
                date: if has(Column::Date) {
                    r.date.map(|d| d.format("%Y-%m-%d").to_string())
                } else {
                    None
                },
                ctr: num(Column::Ctr, r.ctr),
                month: int(Column::Month, r.month.map(u64::from)),
            })
            .collect();
        RawTable {
            columns: self.columns().clone(),
            rows,
        }
    }
}
