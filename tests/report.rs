mod common;

use campaign_report::labels::Locale;
use campaign_report::report::{build_report, render_report, save_report, Block, ReportOptions};
use campaign_report::CampaignError;
use chrono::NaiveDate;
use common::{table_from, two_channels};
use pretty_assertions::assert_eq;

fn options() -> ReportOptions {
    ReportOptions::new(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
}

#[test]
fn missing_cost_column_fails_before_rendering() {
    let csv = "Company,Channel_Used,Campaign_Goal,Customer_Segment,Clicks,Impressions,ROI,Conversion_Rate,Date\n\
               Acme,A,Sales,Youth,10,100,2.0,0.1,2021-01-01\n";
    let table = table_from(csv);

    let err = render_report(&table, "Acme", Locale::En, &options()).unwrap_err();
    match err {
        CampaignError::ReportData { missing } => {
            assert_eq!(missing, vec!["Acquisition_Cost".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn document_has_kpis_and_five_recommendations() {
    let table = table_from(&two_channels());
    let doc = build_report(&table, "Acme", Locale::En, &options()).unwrap();

    let kpis = doc
        .blocks
        .iter()
        .find_map(|b| match b {
            Block::Table { header, rows } => Some((header.clone(), rows.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(kpis.0, ["Metric".to_string(), "Value".to_string()]);
    assert_eq!(kpis.1.len(), 6);
    assert_eq!(kpis.1[0][1], "7,425");

    let recs = doc
        .blocks
        .iter()
        .find_map(|b| match b {
            Block::Recommendations(r) => Some(r.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(recs.len(), 5);
    assert!(recs[0].text.contains("Best Platform: A"));
    assert!(recs[4].text.contains("+5% expected growth"));

    let lines = doc.lines();
    assert!(lines.iter().any(|l| l == "Generated: January 15, 2026"));
}

#[test]
fn pdf_is_deterministic_and_names_the_client() {
    let table = table_from(&two_channels());
    let a = render_report(&table, "Acme", Locale::En, &options()).unwrap();
    let b = render_report(&table, "Acme", Locale::En, &options()).unwrap();
    assert!(a.starts_with(b"%PDF-"));
    assert!(a.ends_with(b"%%EOF\n"));
    assert_eq!(a, b);
    assert!(String::from_utf8_lossy(&a).contains("Acme"));
}

#[test]
fn arabic_changes_labels_not_numbers() {
    let table = table_from(&two_channels());
    let en = build_report(&table, "Acme", Locale::En, &options()).unwrap();
    let ar = build_report(&table, "Acme", Locale::Ar, &options()).unwrap();
    let values = |doc: &campaign_report::report::ReportDocument| {
        doc.blocks
            .iter()
            .find_map(|b| match b {
                Block::Table { rows, .. } => Some(rows.iter().map(|r| r[1].clone()).collect::<Vec<_>>()),
                _ => None,
            })
            .unwrap()
    };
    assert_eq!(values(&en), values(&ar));
    assert!(ar.lines().iter().any(|l| l.contains("مؤشرات الأداء الرئيسية")));
    assert!(ar.lines().iter().any(|l| l.starts_with("تاريخ الإنشاء: ")));
}

#[test]
fn arabic_pdf_sets_labels_as_glyphs_not_placeholders() {
    let table = table_from(&two_channels());
    let bytes = render_report(&table, "Acme", Locale::Ar, &options()).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    let shows: Vec<&str> = text.lines().filter(|l| l.ends_with(" Tj ET") || l.ends_with(" Tj ET Q")).collect();
    assert!(!shows.is_empty());
    for line in &shows {
        assert!(!line.contains('?'), "placeholder text in {line}");
    }
    // the KPI heading and the Arabic labels go through the embedded face
    assert!(shows.iter().filter(|l| l.contains("/F3 ")).count() >= 10);
    assert!(text.contains("/Encoding /Identity-H"));
    assert!(text.contains("/FontFile2 "));
    assert!(text.ends_with("%%EOF\n"));
}

#[test]
fn english_pdf_stays_on_the_standard_fonts() {
    let table = table_from(&two_channels());
    let bytes = render_report(&table, "Acme", Locale::En, &options()).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(!text.contains("/FontFile2"));
    assert!(text.contains("(Key Performance Indicators) Tj"));
}

#[test]
fn save_report_writes_named_file_without_leftovers() {
    let table = table_from(&two_channels());
    let bytes = render_report(&table, "Acme", Locale::En, &options()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let path = save_report(dir.path(), "Acme", &bytes).unwrap();
    assert_eq!(path.file_name().unwrap(), "Acme_Report.pdf");
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["Acme_Report.pdf".to_string()]);
}

#[test]
fn save_report_into_missing_directory_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = save_report(&missing, "Acme", b"%PDF-1.4").unwrap_err();
    assert!(matches!(err, CampaignError::Io(_)));
    assert!(!missing.exists());
}

#[test]
fn failed_rename_leaves_no_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    // a non-empty directory squatting on the report name makes the rename fail
    let blocker = dir.path().join("Acme_Report.pdf");
    std::fs::create_dir(&blocker).unwrap();
    std::fs::write(blocker.join("keep"), b"x").unwrap();

    let err = save_report(dir.path(), "Acme", b"%PDF-1.4").unwrap_err();
    assert!(matches!(err, CampaignError::Io(_)));
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["Acme_Report.pdf".to_string()]);
    assert!(blocker.is_dir());
}
