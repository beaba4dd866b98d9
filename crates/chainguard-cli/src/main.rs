use std::env;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gemini_oracle::GeminiOracle;
use mock_oracle::{FailingOracle, FixedOracle};
use orchestrator::{
    CategoryFilter, Dashboard, RefreshConfig, RefreshEvent, RefreshReport, RiskOracle,
    StatusFilter, TimeWindow,
};
use risk_core::{Alert, RiskLevel, SupplierCategory};
use storage::{Database, SqliteStore};
use tracing::{info, warn};

/// Default database location, created on first use.
const DEFAULT_DATABASE_URL: &str = "sqlite:chainguard.db?mode=rwc";

#[derive(Debug, Parser)]
#[command(name = "chainguard")]
#[command(about = "Monitor supplier risk and review the alert feed")]
struct Args {
    /// SQLite database URL. Falls back to CHAINGUARD_DATABASE_URL env.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Answer every assessment with this level instead of calling Gemini
    #[arg(long, global = true, value_name = "LEVEL")]
    simulate: Option<RiskLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in
    Login,

    /// Sign out
    Logout,

    /// Show or set the company profile
    Company {
        /// Company name
        #[arg(long, requires = "location")]
        name: Option<String>,

        /// Headquarters location, used as the reference point for assessments
        #[arg(long, requires = "name")]
        location: Option<String>,
    },

    /// Show or set the visible sectors
    Sectors {
        /// Sectors to show (e.g. electronics "raw materials"); "all" resets
        categories: Vec<String>,
    },

    /// Register a supplier and assess it
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        category: SupplierCategory,
    },

    /// Refresh every supplier, or one by id
    Refresh {
        /// Supplier id
        #[arg(long)]
        supplier: Option<String>,
    },

    /// List suppliers with their current status
    List {
        /// Match against name or location
        #[arg(long, default_value = "")]
        query: String,

        /// all, stable, caution or risky
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// all or a sector name
        #[arg(long, default_value = "all")]
        category: CategoryFilter,

        /// Refresh before listing
        #[arg(long)]
        refresh: bool,
    },

    /// Show the alert feed
    Alerts {
        /// 24h, 7d or all
        #[arg(long, default_value = "all")]
        window: TimeWindow,

        /// Refresh before listing
        #[arg(long)]
        refresh: bool,
    },

    /// Show one alert with its supplier and analysis
    Alert {
        /// Alert id
        id: String,
    },

    /// Show headline counts
    Stats {
        /// Refresh before counting
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let url = args
        .db
        .clone()
        .or_else(|| env::var("CHAINGUARD_DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&url).await?;
    db.migrate().await?;
    let store = Arc::new(SqliteStore::new(db.clone()));

    let oracle = build_oracle(args.simulate);
    info!(oracle = oracle.name(), "Using risk oracle");

    let dashboard = Dashboard::load(oracle, RefreshConfig::from_env(), store).await;
    let result = run(&dashboard, args.command).await;

    db.close().await;
    result
}

fn build_oracle(simulate: Option<RiskLevel>) -> Arc<dyn RiskOracle> {
    if let Some(level) = simulate {
        return Arc::new(FixedOracle::new(
            level,
            format!("Simulated assessment: supplier held at {level}."),
        ));
    }

    match GeminiOracle::from_env() {
        Ok(oracle) => Arc::new(oracle),
        Err(e) => {
            // Keep non-refresh commands usable without credentials
            warn!(error = %e, "Gemini oracle unavailable, refreshes will fail");
            Arc::new(FailingOracle::new(e))
        }
    }
}

async fn run(
    dashboard: &Dashboard<dyn RiskOracle>,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Login => {
            dashboard.login().await?;
            println!("Signed in.");
        }
        Command::Logout => {
            dashboard.logout().await?;
            println!("Signed out.");
        }
        Command::Company { name, location } => {
            if let (Some(name), Some(location)) = (name, location) {
                dashboard.set_company(name, location).await?;
            }
            match dashboard.company().await {
                Some(company) => println!("{} ({})", company.name, company.location),
                None => println!("No company profile set."),
            }
        }
        Command::Sectors { categories } => {
            if !categories.is_empty() {
                let selected = parse_sectors(&categories)?;
                dashboard.set_visible_categories(selected).await?;
            }
            let visible = dashboard.visible_categories().await;
            for category in SupplierCategory::ALL {
                let mark = if visible.contains(&category) { "x" } else { " " };
                println!("[{mark}] {category}");
            }
        }
        Command::Add {
            name,
            location,
            category,
        } => {
            let added = dashboard.add_supplier(&name, &location, category).await?;
            println!("Registered {} ({})", added.supplier.name, added.supplier.id);
            match added.refresh {
                Some(Ok(analysis)) => println!("{}: {}", analysis.status, analysis.summary),
                Some(Err(e)) => println!("Assessment failed: {e}"),
                None => println!("Sign in and set a company profile to assess it."),
            }
        }
        Command::Refresh { supplier } => match supplier {
            Some(id) => {
                let analysis = dashboard.refresh_supplier(&id).await?;
                print_analysis(&analysis);
            }
            None => {
                let report = refresh_with_progress(dashboard).await?;
                print_report(&report);
            }
        },
        Command::List {
            query,
            status,
            category,
            refresh,
        } => {
            if refresh {
                refresh_with_progress(dashboard).await?;
            }
            let state = dashboard.orchestrator().snapshot().await;
            for supplier in dashboard.suppliers(&query, status, category).await {
                let status = match state.analysis(&supplier.id) {
                    Some(analysis) => analysis.status.to_string(),
                    None => "PENDING".to_string(),
                };
                let stale = if state.is_stale(&supplier.id) { " (stale)" } else { "" };
                println!(
                    "{:<12} {:<28} {:<24} {:<16} {status}{stale}",
                    supplier.id,
                    supplier.name,
                    supplier.location,
                    supplier.category.as_str()
                );
            }
        }
        Command::Alerts { window, refresh } => {
            if refresh {
                refresh_with_progress(dashboard).await?;
            }
            let alerts = dashboard.alerts(window).await;
            if alerts.is_empty() {
                println!("No alerts in the last {window}.");
            }
            for alert in &alerts {
                print_alert(alert);
            }
        }
        Command::Alert { id } => match dashboard.select_alert(&id).await {
            Some(detail) => {
                print_alert(&detail.alert);
                if let Some(supplier) = detail.supplier {
                    println!("  {} / {}", supplier.location, supplier.category);
                }
                if let Some(analysis) = detail.analysis {
                    print_analysis(&analysis);
                }
            }
            None => println!("No alert with id {id}. Run `chainguard alerts --refresh` for current ids."),
        },
        Command::Stats { refresh } => {
            if refresh {
                refresh_with_progress(dashboard).await?;
            }
            let stats = dashboard.stats().await;
            println!("Total:   {}", stats.total);
            println!("Risky:   {}", stats.risky);
            println!("Caution: {}", stats.caution);
            println!("Stable:  {}", stats.stable);
            println!("Pending: {}", stats.pending());
            println!("Stale:   {}", stats.stale);
            if let Some(at) = dashboard.last_global_update().await {
                println!("Updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
            }
            if stats.is_disrupted() {
                println!("Supply chain disrupted.");
            }
        }
    }

    Ok(())
}

/// Refresh everything, printing each outcome as it lands.
async fn refresh_with_progress(
    dashboard: &Dashboard<dyn RiskOracle>,
) -> Result<RefreshReport, Box<dyn std::error::Error>> {
    let mut events = dashboard.orchestrator().subscribe();
    let refresh = dashboard.refresh_all();
    tokio::pin!(refresh);

    let report = loop {
        tokio::select! {
            report = &mut refresh => break report?,
            Ok(event) = events.recv() => print_event(&event),
        }
    };
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }

    Ok(report)
}

fn print_event(event: &RefreshEvent) {
    match event {
        RefreshEvent::AnalysisUpdated {
            supplier_id,
            status,
        } => println!("  {supplier_id}: {status}"),
        RefreshEvent::RefreshFailed { supplier_id, error } => {
            println!("  {supplier_id}: failed ({error})")
        }
    }
}

fn parse_sectors(values: &[String]) -> Result<Vec<SupplierCategory>, Box<dyn std::error::Error>> {
    if values.iter().any(|v| v.eq_ignore_ascii_case("all")) {
        return Ok(SupplierCategory::ALL.to_vec());
    }
    let mut sectors = Vec::with_capacity(values.len());
    for value in values {
        sectors.push(value.parse::<SupplierCategory>()?);
    }
    Ok(sectors)
}

fn print_report(report: &RefreshReport) {
    println!(
        "Refreshed {} of {} suppliers.",
        report.succeeded.len(),
        report.total()
    );
    for (supplier_id, error) in &report.failed {
        println!("  {supplier_id}: {error}");
    }
}

fn print_alert(alert: &Alert) {
    println!(
        "{}  [{}] {}: {}  ({})",
        alert.timestamp.format("%Y-%m-%d %H:%M"),
        alert.severity,
        alert.supplier_name,
        alert.message,
        alert.id
    );
}

fn print_analysis(analysis: &orchestrator::RiskAnalysis) {
    println!("Status:  {}", analysis.status);
    println!("Summary: {}", analysis.summary);
    println!("Weather: {}", analysis.weather_details);
    println!("News:    {}", analysis.news_details);
    if let Some(map) = &analysis.map_insights {
        println!("Map:     {}", map.summary);
        for link in &map.links {
            println!("         {} <{}>", link.title, link.uri);
        }
    }
    for source in &analysis.sources {
        println!("Source:  {} <{}>", source.title, source.uri);
    }
    if !analysis.trend.is_empty() {
        let trend: Vec<String> = analysis.trend.iter().map(u8::to_string).collect();
        println!("Trend:   {}", trend.join(" "));
    }
}
