use crate::error::{CampaignError, Result};
use crate::labels::Locale;
use crate::loader::{load_table, read_csv, LoadReport};
use crate::schema::validate;
use crate::types::CampaignTable;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// What the shell is currently looking at. Passed explicitly to every command.
#[derive(Debug, Default)]
pub struct Session {
    table: Option<Arc<CampaignTable>>,
    source: Option<PathBuf>,
    load_report: Option<LoadReport>,
    pub locale: Locale,
}

impl Session {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    /// Load and validate `path`. The active table is only replaced once the
    /// new one has validated.
    pub fn load(&mut self, path: &Path) -> Result<&LoadReport> {
        let (raw, report) = load_table(path)?;
        let table = validate(&raw)?;
        Ok(self.install(table, Some(path.to_path_buf()), report))
    }

    /// Same as [`Session::load`] for an in-memory source.
    pub fn load_reader<R: Read>(&mut self, source: R) -> Result<&LoadReport> {
        let (raw, report) = read_csv(source)?;
        let table = validate(&raw)?;
        Ok(self.install(table, None, report))
    }

    fn install(
        &mut self,
        table: CampaignTable,
        source: Option<PathBuf>,
        report: LoadReport,
    ) -> &LoadReport {
        info!(rows = table.len(), columns = table.columns().len(), "session table replaced");
        self.table = Some(Arc::new(table));
        self.source = source;
        self.load_report.insert(report)
    }

    pub fn table(&self) -> Option<Arc<CampaignTable>> {
        self.table.clone()
    }

    /// The active table, or an error telling the user to load one first.
    pub fn active(&self) -> Result<Arc<CampaignTable>> {
        self.table().ok_or(CampaignError::EmptyTable)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn load_report(&self) -> Option<&LoadReport> {
        self.load_report.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;

    const GOOD: &str = "Company,Channel_Used,Campaign_Goal,Clicks,Impressions,ROI\n\
                        Acme,Search,Sales,10,100,2.0\n\
                        Acme,Email,Brand,5,0,1.0\n";

    #[test]
    fn starts_empty() {
        let session = Session::new(Locale::Ar);
        assert!(!session.is_loaded());
        assert_eq!(session.locale, Locale::Ar);
        assert!(matches!(session.active(), Err(CampaignError::EmptyTable)));
    }

    #[test]
    fn loads_from_reader() {
        let mut session = Session::default();
        let report = session.load_reader(GOOD.as_bytes()).unwrap();
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(session.active().unwrap().len(), 2);
        assert!(session.source().is_none());
    }

    #[test]
    fn failed_load_keeps_previous_table() {
        let mut session = Session::default();
        session.load_reader(GOOD.as_bytes()).unwrap();
        let before = session.active().unwrap();

        let err = session
            .load_reader("Company,ROI\nAcme,1.0\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, CampaignError::Schema(SchemaError::MissingColumns(_))));
        assert!(Arc::ptr_eq(&before, &session.active().unwrap()));
    }

    #[test]
    fn readers_keep_their_snapshot_across_reloads() {
        let mut session = Session::default();
        session.load_reader(GOOD.as_bytes()).unwrap();
        let old = session.active().unwrap();
        session
            .load_reader(
                "Company,Channel_Used,Campaign_Goal,Clicks,Impressions,ROI\nBeta,Search,Sales,1,1,1.0\n"
                    .as_bytes(),
            )
            .unwrap();
        assert_eq!(old.len(), 2);
        assert_eq!(session.active().unwrap().len(), 1);
    }

    #[test]
    fn load_from_disk_records_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campaigns.csv");
        std::fs::write(&path, GOOD).unwrap();
        let mut session = Session::default();
        session.load(&path).unwrap();
        assert_eq!(session.source(), Some(path.as_path()));
        assert_eq!(session.load_report().map(|r| r.total_rows), Some(2));
    }
}
