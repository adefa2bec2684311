use ads_insights::aggregator;
use ads_insights::display::DisplayManager;
use ads_insights::insights::records_to_csv;
use ads_insights::logging::init_logging;
use ads_insights::{AdsAnalyzer, AdsQuery, Brand, Config};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "ads-insights")]
#[command(about = "Multi-brand ad performance reports from sheets, Apps Script exports and uploads")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ads-insights.toml or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct ReportArgs {
    /// Only this brand (case-insensitive)
    #[arg(long)]
    brand: Option<String>,
    /// Start date filter (YYYY-MM-DD)
    #[arg(long)]
    since: Option<String>,
    /// End date filter (YYYY-MM-DD)
    #[arg(long)]
    until: Option<String>,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
    /// Upload this CSV/JSON file first; it is served when remote sources are empty
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// KPIs and per-brand totals
    Overview(ReportArgs),
    /// Month-over-month comparison
    Monthly(ReportArgs),
    /// Per-campaign breakdown
    Campaigns {
        #[command(flatten)]
        report: ReportArgs,
        /// Show top N campaigns
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Leads per day
    Daily(ReportArgs),
    /// Print the records as CSV
    Export(ReportArgs),
    /// Parse a CSV/JSON file and print the upload result
    Upload {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Overview(ReportArgs::default()));
    let json = match &command {
        Commands::Overview(args) | Commands::Monthly(args) | Commands::Daily(args) | Commands::Export(args) => {
            args.json
        }
        Commands::Campaigns { report, .. } => report.json,
        Commands::Upload { .. } => true,
    };

    let config = match Config::load_with(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => handle_error(e, json),
    };
    let _log_guard = match init_logging(&config.logging, &config.paths) {
        Ok(guard) => guard,
        Err(e) => handle_error(e, json),
    };

    match run(command, config).await {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e, json),
    }
}

async fn run(command: Commands, config: Config) -> Result<()> {
    let display = DisplayManager::new(&config.output);
    let analyzer = AdsAnalyzer::new(config)?;

    match command {
        Commands::Upload { path } => {
            let result = analyzer.upload_file(&path).await;
            display.display_upload(&result);
            if !result.success {
                process::exit(1);
            }
        }
        Commands::Overview(args) => {
            let records = load(&analyzer, &args).await?;
            let kpis = aggregator::kpi_summary(&records);
            let brands = aggregator::brand_totals(&records);
            display.display_overview(&kpis, &brands, args.json);
        }
        Commands::Monthly(args) => {
            let records = load(&analyzer, &args).await?;
            display.display_monthly(&aggregator::monthly_metrics(&records), args.json);
        }
        Commands::Campaigns { report, limit } => {
            let records = load(&analyzer, &report).await?;
            display.display_campaigns(&aggregator::campaign_metrics(&records), limit, report.json);
        }
        Commands::Daily(args) => {
            let records = load(&analyzer, &args).await?;
            display.display_daily(&aggregator::daily_leads(&records), args.json);
        }
        Commands::Export(args) => {
            let records = load(&analyzer, &args).await?;
            print!("{}", records_to_csv(&records)?);
        }
    }

    Ok(())
}

async fn load(analyzer: &AdsAnalyzer, args: &ReportArgs) -> Result<Vec<ads_insights::AdRecord>> {
    let query = parse_query(args)?;

    if let Some(path) = &args.file {
        let result = analyzer.upload_file(path).await;
        if !result.success {
            anyhow::bail!(
                "{} ({})",
                result.error.unwrap_or_default(),
                path.display()
            );
        }
    }

    Ok(analyzer.get_ads_data(&query).await)
}

fn parse_query(args: &ReportArgs) -> Result<AdsQuery> {
    let brand = args
        .brand
        .as_deref()
        .map(|b| b.parse::<Brand>())
        .transpose()
        .context("Invalid --brand")?;
    let from = parse_date_arg("since", args.since.as_deref())?;
    let to = parse_date_arg("until", args.until.as_deref())?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            anyhow::bail!("--since {} is after --until {}", from, to);
        }
    }

    Ok(AdsQuery { brand, from, to })
}

fn parse_date_arg(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .with_context(|| format!("Invalid {} date format: {}. Use YYYY-MM-DD", name, v))
        })
        .transpose()
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
