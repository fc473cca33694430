use crate::error::{CampaignError, Result};
use crate::types::{Column, RawRow, RawTable};
use csv::ReaderBuilder;
use polars::prelude::{DataType, ParquetReader, SerReader};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub ignored_columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputFormat {
    Csv,
    Parquet,
}

fn input_format(path: &Path) -> Option<InputFormat> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Some(InputFormat::Csv);
    };
    match ext.to_ascii_lowercase().as_str() {
        "csv" | "txt" => Some(InputFormat::Csv),
        "parquet" | "pq" => Some(InputFormat::Parquet),
        _ => None,
    }
}

/// Read a campaign table from disk, picking the reader from the file
/// extension. A path without an extension is read as CSV.
pub fn load_table(path: &Path) -> Result<(RawTable, LoadReport)> {
    let format =
        input_format(path).ok_or_else(|| CampaignError::UnsupportedFormat(path.to_path_buf()))?;
    let file = File::open(path)?;
    let (table, report) = match format {
        InputFormat::Csv => read_csv(file)?,
        InputFormat::Parquet => read_parquet(file)?,
    };
    info!(
        path = %path.display(),
        format = ?format,
        rows = report.loaded_rows,
        skipped = report.parse_errors,
        "loaded campaign table"
    );
    Ok((table, report))
}

/// Read a Parquet file into the same raw shape the CSV reader produces.
///
/// Every known column is cast to text so the validator parses it exactly as
/// it would a CSV cell. Timestamps are truncated to their date.
pub fn read_parquet(file: File) -> Result<(RawTable, LoadReport)> {
    let df = ParquetReader::new(file).finish()?;
    let mut rows = vec![RawRow::default(); df.height()];
    let mut columns = BTreeSet::new();
    let mut ignored_columns = Vec::new();

    for series in df.get_columns() {
        let name = series.name().as_str();
        let Some(column) = Column::from_header(name.trim()) else {
            ignored_columns.push(name.to_string());
            continue;
        };
        columns.insert(column);
        let text = match series.dtype() {
            DataType::Datetime(..) => series.cast(&DataType::Date)?.cast(&DataType::String)?,
            _ => series.cast(&DataType::String)?,
        };
        for (row, value) in rows.iter_mut().zip(text.str()?) {
            *row.cell_mut(column) = value.map(str::to_string);
        }
    }
    if !ignored_columns.is_empty() {
        debug!(columns = ?ignored_columns, "ignoring unknown columns");
    }

    let report = LoadReport {
        total_rows: rows.len(),
        loaded_rows: rows.len(),
        parse_errors: 0,
        ignored_columns,
    };
    Ok((RawTable { columns, rows }, report))
}

/// Read campaign rows from any CSV source with a header line.
pub fn read_csv<R: Read>(source: R) -> Result<(RawTable, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).trim(csv::Trim::Headers).from_reader(source);

    let mut columns = BTreeSet::new();
    let mut ignored_columns = Vec::new();
    for name in rdr.headers()?.iter() {
        match Column::from_header(name) {
            Some(c) => {
                columns.insert(c);
            }
            None => ignored_columns.push(name.to_string()),
        }
    }
    if !ignored_columns.is_empty() {
        debug!(columns = ?ignored_columns, "ignoring unknown columns");
    }

    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut rows = Vec::new();
    for result in rdr.deserialize::<RawRow>() {
        total_rows += 1;
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(row = total_rows, error = %e, "skipping unreadable row");
                parse_errors += 1;
            }
        }
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: rows.len(),
        parse_errors,
        ignored_columns,
    };
    Ok((RawTable { columns, rows }, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_rows() {
        let csv = "Campaign_ID,Company,Channel_Used,Clicks\n1,Acme,Email,10\n2,Acme,,\n";
        let (table, report) = read_csv(csv.as_bytes()).unwrap();
        assert!(table.has(Column::Company));
        assert!(table.has(Column::Clicks));
        assert!(!table.has(Column::Roi));
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(report.ignored_columns, vec!["Campaign_ID".to_string()]);
        assert_eq!(table.rows[0].cell(Column::Channel), Some("Email"));
        assert_eq!(table.rows[1].channel.as_deref().unwrap_or(""), "");
        assert_eq!(table.rows[0].roi, None);
    }

    #[test]
    fn routes_on_extension() {
        assert_eq!(input_format(Path::new("data/campaigns.csv")), Some(InputFormat::Csv));
        assert_eq!(input_format(Path::new("data/campaigns")), Some(InputFormat::Csv));
        assert_eq!(
            input_format(Path::new("data/campaigns_clean.PARQUET")),
            Some(InputFormat::Parquet)
        );
        assert_eq!(input_format(Path::new("data/campaigns.xlsx")), None);
    }

    #[test]
    fn rejects_spreadsheets() {
        let err = load_table(Path::new("data/campaigns.xlsx")).unwrap_err();
        assert!(matches!(err, CampaignError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_parquet_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(&dir.path().join("campaigns_clean.parquet")).unwrap_err();
        assert!(matches!(err, CampaignError::Io(_)));
    }
}
