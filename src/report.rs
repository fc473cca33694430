//! Per-client PDF report.
//!
//! The report is first assembled into a [`ReportDocument`] (plain text blocks
//! in a fixed order) and then laid out onto A4 pages. All data checks happen
//! while assembling, so a failed report never produces any bytes.

use crate::aggregate::Kpis;
use crate::error::{CampaignError, Result};
use crate::insights::{select_insights, Insight, InsightKind};
use crate::labels::{label, Label, Locale};
use crate::pdf::{text_width, Canvas, Font, PdfDocument, Rgb, A4_HEIGHT, A4_WIDTH};
use crate::projection::{next_period_estimate, DEFAULT_GROWTH_RATE};
use crate::types::{CampaignTable, Column};
use crate::util::{
    format_currency, format_fraction_percent, format_int, format_percent, format_roi, or_na,
};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const PINK: Rgb = Rgb(0xE9, 0x1E, 0x8C);
const ORANGE: Rgb = Rgb(0xFF, 0x6B, 0x35);
const PURPLE: Rgb = Rgb(0x9C, 0x27, 0xB0);
const LIGHT_ROW: Rgb = Rgb(0xFD, 0xF0, 0xF8);
const INK: Rgb = Rgb(0x1A, 0x0A, 0x2E);
const MUTED: Rgb = Rgb(0x99, 0x88, 0xBB);
const GRID: Rgb = Rgb(0xE0, 0xC0, 0xD8);

/// Every column the report reads, KPI sources first.
pub const REPORT_COLUMNS: [Column; 10] = [
    Column::Clicks,
    Column::Impressions,
    Column::Roi,
    Column::Ctr,
    Column::AcquisitionCost,
    Column::ConversionRate,
    Column::Channel,
    Column::CampaignGoal,
    Column::CustomerSegment,
    Column::Month,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub generated_on: NaiveDate,
    pub growth_rate: f64,
    pub title: String,
}

impl ReportOptions {
    pub fn new(generated_on: NaiveDate) -> Self {
        Self {
            generated_on,
            growth_rate: DEFAULT_GROWTH_RATE,
            title: label(Locale::En, Label::DashboardTitle).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub text: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title { title: String, subtitle: String },
    Divider,
    Spacer(f32),
    Heading(String),
    Caption(String),
    Table { header: [String; 2], rows: Vec<[String; 2]> },
    Recommendations(Vec<Recommendation>),
    Footer(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub created: NaiveDate,
    pub blocks: Vec<Block>,
}

impl ReportDocument {
    /// The document as plain lines, for terminal previews.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for block in &self.blocks {
            match block {
                Block::Title { title, subtitle } => {
                    out.push(title.clone());
                    out.push(subtitle.clone());
                }
                Block::Divider => out.push("-".repeat(60)),
                Block::Spacer(_) => {}
                Block::Heading(h) => {
                    out.push(String::new());
                    out.push(h.clone());
                }
                Block::Caption(c) | Block::Footer(c) => out.push(c.clone()),
                Block::Table { header, rows } => {
                    out.push(format!("{}: {}", header[0], header[1]));
                    out.extend(rows.iter().map(|[k, v]| format!("  {k}: {v}")));
                }
                Block::Recommendations(recs) => {
                    out.extend(recs.iter().map(|r| format!("  • {}", r.text)));
                }
            }
        }
        out
    }
}

/// Conventional download name for a client's report.
pub fn report_file_name(client: &str) -> String {
    let safe: String = client
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{safe}_Report.pdf")
}

fn growth_caption(growth_rate: f64) -> String {
    let pct = growth_rate * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{pct:+.0}% expected growth")
    } else {
        format!("{pct:+.1}% expected growth")
    }
}

fn winner(insights: &[Insight], kind: InsightKind) -> Option<&Insight> {
    insights.iter().find(|i| i.kind == kind)
}

/// Assemble the report content for `client` from `table`.
pub fn build_report(
    table: &CampaignTable,
    client: &str,
    locale: Locale,
    opts: &ReportOptions,
) -> Result<ReportDocument> {
    let missing: Vec<String> = table
        .missing(&REPORT_COLUMNS)
        .into_iter()
        .map(|c| if c == Column::Month.header() { Column::Date.header().to_string() } else { c })
        .collect();
    if !missing.is_empty() {
        return Err(CampaignError::ReportData { missing });
    }

    let kpis = Kpis::compute(table)?;
    let insights = select_insights(table)?;
    let t = |key: Label| label(locale, key);

    let kpi_rows = vec![
        [t(Label::TotalClicks).to_string(), format_int(kpis.total_clicks)],
        [t(Label::TotalImpressions).to_string(), format_int(kpis.total_impressions)],
        [t(Label::AvgRoi).to_string(), or_na(kpis.avg_roi, format_roi)],
        [t(Label::AvgCtr).to_string(), or_na(kpis.avg_ctr, format_percent)],
        [
            t(Label::AvgCost).to_string(),
            or_na(kpis.avg_acquisition_cost, |v| format_currency(v, 2)),
        ],
        [
            t(Label::AvgConversion).to_string(),
            or_na(kpis.avg_conversion_rate, format_fraction_percent),
        ],
    ];

    let name = |kind: InsightKind| winner(&insights, kind).map_or("n/a", |i| i.winner.as_str());
    let channel_roi = winner(&insights, InsightKind::BestChannel).map_or(0.0, |i| i.metric_value);
    let next_roi = kpis
        .avg_roi
        .map(|roi| next_period_estimate(roi, opts.growth_rate));
    let recommendations = vec![
        Recommendation {
            text: format!(
                "{}: {}  (ROI: {})",
                t(Label::BestPlatform),
                name(InsightKind::BestChannel),
                format_roi(channel_roi)
            ),
            color: PINK,
        },
        Recommendation {
            text: format!("{}: {}", t(Label::BestCampaign), name(InsightKind::BestGoal)),
            color: ORANGE,
        },
        Recommendation {
            text: format!("{}: {}", t(Label::BestSegment), name(InsightKind::BestSegment)),
            color: PURPLE,
        },
        Recommendation {
            text: format!("{}: Month {}", t(Label::BestMonth), name(InsightKind::BestMonth)),
            color: PINK,
        },
        Recommendation {
            text: format!(
                "{}: {}  ({})",
                t(Label::Prediction),
                or_na(next_roi, format_roi),
                growth_caption(opts.growth_rate)
            ),
            color: ORANGE,
        },
    ];

    let blocks = vec![
        Block::Title {
            title: opts.title.clone(),
            subtitle: "Marketing performance intelligence".to_string(),
        },
        Block::Divider,
        Block::Spacer(14.0),
        Block::Heading(format!("{} — {}", t(Label::ReportHeading), client)),
        Block::Caption(format!(
            "{}: {}",
            t(Label::Generated),
            opts.generated_on.format("%B %d, %Y")
        )),
        Block::Spacer(18.0),
        Block::Heading(t(Label::KpiHeading).to_string()),
        Block::Table {
            header: [t(Label::Metric).to_string(), t(Label::Value).to_string()],
            rows: kpi_rows,
        },
        Block::Spacer(22.0),
        Block::Heading(t(Label::Recommendations).to_string()),
        Block::Recommendations(recommendations),
        Block::Spacer(28.0),
        Block::Divider,
        Block::Footer(format!("{}  |  {}", opts.title, client)),
    ];

    Ok(ReportDocument {
        title: format!("{} — {}", t(Label::ReportHeading), client),
        created: opts.generated_on,
        blocks,
    })
}

/// Render the client report as PDF bytes.
pub fn render_report(
    table: &CampaignTable,
    client: &str,
    locale: Locale,
    opts: &ReportOptions,
) -> Result<Vec<u8>> {
    let doc = build_report(table, client, locale, opts)?;
    let pdf = layout(&doc);
    let bytes = pdf.to_bytes();
    info!(client, pages = pdf.page_count(), bytes = bytes.len(), "rendered report");
    Ok(bytes)
}

/// Write report bytes to `dir/{client}_Report.pdf`.
///
/// The bytes go to a temporary sibling first and are renamed into place, so a
/// failed write never leaves a truncated report behind.
pub fn save_report(dir: &Path, client: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.join(report_file_name(client));
    let tmp = path.with_extension("pdf.part");
    let written = (|| -> std::io::Result<()> {
        let mut w = BufWriter::new(File::create(&tmp)?);
        w.write_all(bytes)?;
        w.flush()?;
        w.get_ref().sync_all()
    })();
    if let Err(e) = written.and_then(|()| std::fs::rename(&tmp, &path)) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    info!(path = %path.display(), "saved report");
    Ok(path)
}

const MARGIN_X: f32 = 63.64;
const MARGIN_Y: f32 = 43.2;
const CONTENT_W: f32 = A4_WIDTH - 2.0 * MARGIN_X;
const ROW_H: f32 = 28.0;
const REC_SIZE: f32 = 11.0;
const REC_LEADING: f32 = 14.0;
const REC_PAD: f32 = 8.0;

/// Greedy word wrap against the metrics of whichever face sets the text.
/// Words wider than `width` get a line of their own.
fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && text_width(&candidate, size) > width {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct Pager {
    pdf: PdfDocument,
    page: Canvas,
    y: f32,
}

impl Pager {
    fn new(doc: &ReportDocument) -> Self {
        Self {
            pdf: PdfDocument::new(doc.title.clone(), doc.created),
            page: Canvas::new(),
            y: A4_HEIGHT - MARGIN_Y,
        }
    }

    /// Start a new page unless `height` still fits on this one.
    fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN_Y && !self.page.is_empty() {
            let full = std::mem::take(&mut self.page);
            self.pdf.push_page(full);
            self.y = A4_HEIGHT - MARGIN_Y;
        }
    }

    fn finish(mut self) -> PdfDocument {
        let last = std::mem::take(&mut self.page);
        self.pdf.push_page(last);
        self.pdf
    }
}

fn baseline(top: f32, height: f32, size: f32) -> f32 {
    top - height / 2.0 - size * 0.35
}

/// Lay the document out on A4 pages.
pub fn layout(doc: &ReportDocument) -> PdfDocument {
    let mut p = Pager::new(doc);
    let cx = A4_WIDTH / 2.0;
    let right = MARGIN_X + CONTENT_W;

    for block in &doc.blocks {
        match block {
            Block::Title { title, subtitle } => {
                p.reserve(60.0);
                p.page.text_centered(cx, p.y - 26.0, Font::Bold, 26.0, PINK, title);
                p.page.text_centered(cx, p.y - 44.0, Font::Regular, 10.0, MUTED, subtitle);
                p.y -= 60.0;
            }
            Block::Divider => {
                p.reserve(4.0);
                p.page.line(MARGIN_X, p.y - 2.0, right, p.y - 2.0, 2.0, PINK);
                p.y -= 4.0;
            }
            Block::Spacer(h) => {
                p.y -= h;
            }
            Block::Heading(text) => {
                p.reserve(24.0);
                p.page.text(MARGIN_X, p.y - 14.0, Font::Bold, 14.0, PURPLE, text);
                p.y -= 24.0;
            }
            Block::Caption(text) => {
                p.reserve(26.0);
                p.page.text_centered(cx, p.y - 10.0, Font::Regular, 10.0, MUTED, text);
                p.y -= 26.0;
            }
            Block::Table { header, rows } => {
                let height = ROW_H * (rows.len() + 1) as f32;
                p.reserve(height);
                let col_w = CONTENT_W / 2.0;
                let mut top = p.y;
                p.page.fill_rect(MARGIN_X, top - ROW_H, CONTENT_W, ROW_H, PINK);
                for (i, cell) in header.iter().enumerate() {
                    let ccx = MARGIN_X + col_w * (i as f32 + 0.5);
                    let y = baseline(top, ROW_H, 12.0);
                    p.page.text_centered(ccx, y, Font::Bold, 12.0, Rgb::WHITE, cell);
                }
                top -= ROW_H;
                for (r, row) in rows.iter().enumerate() {
                    if r % 2 == 1 {
                        p.page.fill_rect(MARGIN_X, top - ROW_H, CONTENT_W, ROW_H, LIGHT_ROW);
                    }
                    for (i, cell) in row.iter().enumerate() {
                        let ccx = MARGIN_X + col_w * (i as f32 + 0.5);
                        let y = baseline(top, ROW_H, 10.0);
                        p.page.text_centered(ccx, y, Font::Regular, 10.0, INK, cell);
                    }
                    top -= ROW_H;
                }
                for r in 0..=rows.len() + 1 {
                    let y = p.y - ROW_H * r as f32;
                    p.page.line(MARGIN_X, y, right, y, 0.5, GRID);
                }
                for x in [MARGIN_X, MARGIN_X + col_w, right] {
                    p.page.line(x, p.y, x, p.y - height, 0.5, GRID);
                }
                p.y -= height;
            }
            Block::Recommendations(recs) => {
                for (i, rec) in recs.iter().enumerate() {
                    let text = format!("•  {}", rec.text);
                    let lines = wrap(&text, REC_SIZE, CONTENT_W - 24.0);
                    let h = lines.len() as f32 * REC_LEADING + 2.0 * REC_PAD;
                    p.reserve(h);
                    if i % 2 == 1 {
                        p.page.fill_rect(MARGIN_X, p.y - h, CONTENT_W, h, LIGHT_ROW);
                    }
                    p.page.stroke_rect(MARGIN_X, p.y - h, CONTENT_W, h, 0.3, GRID);
                    for (n, line) in lines.iter().enumerate() {
                        let y = p.y - REC_PAD - REC_SIZE - n as f32 * REC_LEADING;
                        p.page.text(MARGIN_X + 12.0, y, Font::Regular, REC_SIZE, rec.color, line);
                    }
                    p.y -= h;
                }
            }
            Block::Footer(text) => {
                p.reserve(20.0);
                p.page.text_centered(cx, p.y - 14.0, Font::Regular, 9.0, MUTED, text);
                p.y -= 20.0;
            }
        }
    }
    p.finish()
}
