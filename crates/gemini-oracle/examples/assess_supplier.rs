//! Assess a single supplier against the live Gemini API.
//!
//! Run with: cargo run -p gemini-oracle --example assess_supplier -- "Name" "Location" [category]
//!
//! Requires GEMINI_API_KEY (read from the environment or a .env file).

use gemini_oracle::GeminiOracle;
use risk_core::{assess_supplier_risk, Supplier, SupplierCategory, SystemClock, UuidIds};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let mut args = env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "Zhongshan Electronics".to_string());
    let location = args.next().unwrap_or_else(|| "Guangdong, China".to_string());
    let category: SupplierCategory = args
        .next()
        .as_deref()
        .unwrap_or("Electronics")
        .parse()?;

    let oracle = GeminiOracle::from_env()?;
    let supplier = Supplier::register(name, location, category, &UuidIds, &SystemClock);
    let hq = env::var("CHAINGUARD_HQ_LOCATION").ok();

    let analysis = assess_supplier_risk(&oracle, &supplier, hq.as_deref(), &SystemClock).await?;

    println!("Status:  {}", analysis.status);
    println!("Summary: {}", analysis.summary);
    println!("Weather: {}", analysis.weather_details);
    println!("News:    {}", analysis.news_details);
    if let Some(map) = &analysis.map_insights {
        println!("Map:     {}", map.summary);
        for link in &map.links {
            println!("  - {} ({})", link.title, link.uri);
        }
    }
    for source in &analysis.sources {
        println!("Source:  {} ({})", source.title, source.uri);
    }
    println!("Trend:   {:?}", analysis.trend);

    Ok(())
}
