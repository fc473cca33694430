// Entry point and terminal shell.
//
// Every subcommand loads the configured table into a `Session` and prints one
// dashboard page. `menu` (the default) keeps the session alive between
// actions so the file is only parsed once per load.
use anyhow::Context;
use campaign_report::aggregate::{aggregate_by, companies, filter_company, AggOp};
use campaign_report::config::{load_app_config, AppConfig};
use campaign_report::labels::{label, Label, Locale};
use campaign_report::output::{self, KpiRow};
use campaign_report::report::{render_report, save_report, ReportOptions};
use campaign_report::util::{
    format_currency, format_fraction_percent, format_int, format_percent, format_roi, or_na,
};
use campaign_report::views::{client_view, insights_view, load_model_or_warn, overview};
use campaign_report::{Dimension, Metric, Session};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const PREVIEW_ROWS: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "campaign-report")]
#[command(about = "Marketing campaign analytics and client PDF reports")]
struct Cli {
    /// Campaign table to load (CSV or Parquet).
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    #[arg(long, global = true, value_enum)]
    locale: Option<Locale>,
    /// Where exports and reports are written.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Monthly growth rate used for projections, e.g. 0.05.
    #[arg(long, global = true)]
    growth: Option<f64>,
    #[arg(long, global = true)]
    horizon: Option<i32>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Headline KPIs and platform, goal, month and client rankings.
    Overview,
    /// Dashboard page for a single client.
    Client { name: String },
    /// Recommendations, ROI projection and feature importance.
    Insights,
    /// Write `<client>_Report.pdf` to the output directory.
    Report {
        client: String,
        /// Date printed on the report (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List the clients present in the data.
    Clients,
    /// Export the validated table, aggregations and the overview summary.
    Export,
    /// Interactive menu.
    Menu,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(p) = &self.data {
            config.data_path = p.clone();
        }
        if let Some(l) = self.locale {
            config.locale = l;
        }
        if let Some(d) = &self.output_dir {
            config.output_dir = d.clone();
        }
        if let Some(g) = self.growth {
            config.growth_rate = g;
        }
        if let Some(h) = self.horizon {
            config.forecast_horizon = h;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_app_config()?;
    cli.apply(&mut config);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();

    let mut session = Session::new(config.locale);
    let command = cli.command.unwrap_or(Commands::Menu);
    if matches!(command, Commands::Menu) {
        return run_menu(&mut session, &config);
    }

    handle_load(&mut session, &config)?;
    match command {
        Commands::Overview => show_overview(&session),
        Commands::Client { name } => show_client(&session, &name),
        Commands::Insights => show_insights(&session, &config),
        Commands::Report { client, date } => generate_report(&session, &config, &client, date),
        Commands::Clients => show_clients(&session),
        Commands::Export => export_all(&session, &config),
        Commands::Menu => Ok(()),
    }
}

/// Load the configured table into the session and print what happened.
fn handle_load(session: &mut Session, config: &AppConfig) -> anyhow::Result<()> {
    let path = &config.data_path;
    let report = session
        .load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    println!(
        "Processing dataset... ({} rows loaded from {})",
        format_int(report.loaded_rows),
        path.display()
    );
    if report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            format_int(report.parse_errors)
        );
    }
    if !report.ignored_columns.is_empty() {
        println!("Info: ignored columns: {}", report.ignored_columns.join(", "));
    }
    println!();
    Ok(())
}

fn show_overview(session: &Session) -> anyhow::Result<()> {
    let table = session.active()?;
    let locale = session.locale;
    let view = overview(&table)?;

    println!("{}: {}\n", label(locale, Label::Overview), label(locale, Label::DashboardTitle));
    println!("{}: {}\n", label(locale, Label::ActiveClients), format_int(view.clients));
    output::preview_table_rows(label(locale, Label::KpiHeading), &output::kpi_rows(&view.kpis, locale), PREVIEW_ROWS);
    output::preview_table_rows(
        label(locale, Label::PlatformComparison),
        &output::platform_rows(&view.platforms),
        PREVIEW_ROWS,
    );
    output::preview_table_rows(
        label(locale, Label::CampaignPerformance),
        &output::value_rows(&view.goal_roi, format_roi),
        PREVIEW_ROWS,
    );
    output::preview_table_rows(
        label(locale, Label::MonthlyTrend),
        &output::month_rows(&view.monthly),
        12,
    );
    let mut top = view.top_clients.clone();
    top.reverse();
    output::preview_table_rows(
        label(locale, Label::TopClients),
        &output::value_rows(&top, format_roi),
        PREVIEW_ROWS,
    );
    Ok(())
}

fn show_client(session: &Session, name: &str) -> anyhow::Result<()> {
    let table = session.active()?;
    let locale = session.locale;
    let view = client_view(&table, name, locale)?;

    println!("{}: {}", label(locale, Label::ClientView), view.client);
    println!(
        "{} campaigns | {} platforms | {} goals\n",
        format_int(view.campaigns),
        format_int(view.platform_count),
        format_int(view.goal_count)
    );
    output::preview_table_rows(label(locale, Label::KpiHeading), &output::kpi_rows(&view.kpis, locale), PREVIEW_ROWS);
    output::preview_table_rows(
        label(locale, Label::PlatformComparison),
        &output::platform_rows(&view.platforms),
        PREVIEW_ROWS,
    );
    output::preview_table_rows(
        label(locale, Label::CampaignPerformance),
        &output::value_rows(&view.goal_roi, format_roi),
        PREVIEW_ROWS,
    );
    output::preview_table_rows(
        label(locale, Label::MonthlyTrend),
        &output::month_rows(&view.monthly),
        12,
    );
    let cards: Vec<KpiRow> = view
        .best
        .iter()
        .map(|c| KpiRow {
            metric: c.title.clone(),
            value: c.value.clone(),
        })
        .collect();
    output::preview_table_rows(label(locale, Label::Recommendations), &cards, cards.len());
    Ok(())
}

fn show_insights(session: &Session, config: &AppConfig) -> anyhow::Result<()> {
    let table = session.active()?;
    let locale = session.locale;
    let model = load_model_or_warn(&config.model_dir);
    let view = insights_view(&table, config, model.as_ref())?;

    println!("{}\n", label(locale, Label::AiInsights));
    output::preview_table_rows(
        label(locale, Label::Recommendations),
        &output::insight_rows(&view.insights),
        view.insights.len(),
    );
    println!(
        "{}: last month {} at {}, growing {} per month\n",
        label(locale, Label::Prediction),
        view.projection.last_month,
        format_roi(view.projection.last_value),
        format_percent(view.projection.growth_rate * 100.0)
    );
    output::preview_table_rows(
        label(locale, Label::Prediction),
        &output::forecast_rows(&view.projection),
        PREVIEW_ROWS,
    );
    match &view.feature_importance {
        Some(weights) => {
            let mut rows = output::feature_rows(weights);
            rows.reverse();
            output::preview_table_rows(label(locale, Label::FeatureImportance), &rows, PREVIEW_ROWS);
        }
        None => println!("({} not available)\n", label(locale, Label::FeatureImportance)),
    }
    output::preview_table_rows(
        label(locale, Label::PlatformComparison),
        &output::platform_rows(&view.platforms),
        PREVIEW_ROWS,
    );
    output::preview_table_rows(
        label(locale, Label::CampaignPerformance),
        &output::platform_rows(&view.goals),
        PREVIEW_ROWS,
    );

    let s = &view.summary;
    let stats = vec![
        KpiRow { metric: label(locale, Label::ActiveClients).to_string(), value: format_int(view.clients) },
        KpiRow { metric: label(locale, Label::TotalRecords).to_string(), value: format_int(s.campaigns) },
        KpiRow { metric: label(locale, Label::AvgRoi).to_string(), value: or_na(s.avg_roi, format_roi) },
        KpiRow { metric: label(locale, Label::AvgCtr).to_string(), value: or_na(s.avg_ctr, format_percent) },
        KpiRow {
            metric: label(locale, Label::AvgConversion).to_string(),
            value: or_na(s.avg_conversion_rate, format_fraction_percent),
        },
        KpiRow {
            metric: label(locale, Label::AvgCost).to_string(),
            value: or_na(s.avg_acquisition_cost, |v| format_currency(v, 0)),
        },
    ];
    output::preview_table_rows(label(locale, Label::SummaryStats), &stats, stats.len());
    Ok(())
}

fn generate_report(
    session: &Session,
    config: &AppConfig,
    client: &str,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let table = session.active()?;
    let client_table = filter_company(&table, client)?;
    let mut opts = ReportOptions::new(date.unwrap_or_else(|| chrono::Local::now().date_naive()));
    opts.growth_rate = config.growth_rate;
    opts.title = config.report_title.clone();

    let bytes = render_report(&client_table, client.trim(), session.locale, &opts)?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("cannot create {}", config.output_dir.display()))?;
    let path = save_report(&config.output_dir, client.trim(), &bytes)?;
    println!("Report saved to {} ({} bytes)\n", path.display(), format_int(bytes.len()));
    Ok(())
}

fn show_clients(session: &Session) -> anyhow::Result<()> {
    let table = session.active()?;
    let names = companies(&table);
    println!("{} clients:", format_int(names.len()));
    for name in names {
        println!("  {name}");
    }
    println!();
    Ok(())
}

/// Write the validated table, the main aggregations and a JSON overview.
fn export_all(session: &Session, config: &AppConfig) -> anyhow::Result<()> {
    let table = session.active()?;
    let dir = &config.output_dir;
    std::fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;

    println!("Exporting tables...");
    let validated = dir.join("validated_campaigns.csv");
    output::export_table(&validated, &table)?;
    println!("  {}", validated.display());

    let aggregations = [
        ("platform_roi.csv", Dimension::Channel, Metric::Roi, AggOp::Mean),
        ("goal_roi.csv", Dimension::CampaignGoal, Metric::Roi, AggOp::Mean),
        ("segment_conversion.csv", Dimension::CustomerSegment, Metric::ConversionRate, AggOp::Mean),
        ("monthly_roi.csv", Dimension::Month, Metric::Roi, AggOp::Mean),
        ("company_roi.csv", Dimension::Company, Metric::Roi, AggOp::Mean),
        ("platform_clicks.csv", Dimension::Channel, Metric::Clicks, AggOp::Sum),
    ];
    for (file, dimension, metric, op) in aggregations {
        if !table.has(dimension.column()) || !table.has(metric.column()) {
            continue;
        }
        let path = dir.join(file);
        output::export_aggregation(&path, &aggregate_by(&table, dimension, metric, op)?)?;
        println!("  {}", path.display());
    }

    let view = overview(&table)?;
    let platforms = dir.join("platform_summary.csv");
    output::write_csv(&platforms, &output::platform_rows(&view.platforms))?;
    println!("  {}", platforms.display());

    let summary = dir.join("overview.json");
    output::write_json(&summary, &view)?;
    println!("  {}\n", summary.display());
    Ok(())
}

/// Read one trimmed line after `prompt`. `None` on end of input.
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to return to the menu. End of input counts as no.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_line("Back to menu (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn report_error(e: anyhow::Error) {
    eprintln!("Error: {e:#}\n");
}

fn run_menu(session: &mut Session, config: &AppConfig) -> anyhow::Result<()> {
    loop {
        let l = |key| label(session.locale, key);
        println!("{}", l(Label::DashboardTitle));
        println!("[1] Load the file");
        println!("[2] {}", l(Label::Overview));
        println!("[3] {}", l(Label::ClientView));
        println!("[4] {}", l(Label::AiInsights));
        println!("[5] Generate client report");
        println!("[6] Export tables");
        println!("[7] Switch language ({})", session.locale);
        println!("[0] Exit\n");

        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        let result = match choice.as_str() {
            "1" => handle_load(session, config),
            "2" => show_overview(session),
            "3" => match read_line("Client name: ") {
                Some(name) => show_client(session, &name),
                None => break,
            },
            "4" => show_insights(session, config),
            "5" => match read_line("Client name: ") {
                Some(name) => generate_report(session, config, &name, None),
                None => break,
            },
            "6" => export_all(session, config),
            "7" => {
                session.locale = match session.locale {
                    Locale::En => Locale::Ar,
                    Locale::Ar => Locale::En,
                };
                println!("Language set to {}\n", session.locale);
                continue;
            }
            "0" => break,
            _ => {
                println!("Invalid choice. Please enter a number from 0 to 7.\n");
                continue;
            }
        };
        let loaded = choice == "1";
        if let Err(e) = result {
            report_error(e);
            if !session.is_loaded() {
                println!("No data loaded. Please load the data file first (option 1).\n");
            }
            continue;
        }
        if !loaded && !prompt_back_to_menu() {
            break;
        }
    }
    println!("Exiting the program.");
    Ok(())
}
