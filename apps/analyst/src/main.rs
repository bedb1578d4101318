mod analysis;
mod catalog;
mod config;
mod db;
mod errors;
mod llm_client;
mod render;
mod store;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::runner::run_analysis;
use crate::config::Config;
use crate::db::{create_pool, init_db};
use crate::llm_client::LlmClient;
use crate::store::SqliteRunStore;

/// Runs the full prompt catalog against one stock ticker and prints the
/// per-prompt verdicts plus the aggregated summary.
#[derive(Debug, Parser)]
#[command(name = "analyst", version, about = "Prompt-driven stock analysis engine")]
struct Args {
    /// Stock ticker symbol to analyse (e.g. AAPL)
    ticker: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting analyst v{}", env!("CARGO_PKG_VERSION"));

    let ticker = args.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        bail!("Please provide a non-empty stock ticker");
    }

    let pool = create_pool(&config.database_url).await?;
    init_db(&pool).await?;

    let llm = LlmClient::new(config.anthropic_api_key.clone());
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        info!("No ANTHROPIC_API_KEY set — running with stub outcomes");
    }

    let store = SqliteRunStore::new(pool);

    let (reports, summary) = run_analysis(&store, &llm, &config.prompts_dir, &ticker).await?;

    println!("Analysis results for {ticker}:");
    for report in &reports {
        println!(
            "  {} v{} ({}): score={} rating={} target_buy_price={:.2}",
            report.prompt_id,
            report.prompt_version,
            report.prompt_name,
            report.outcome.score,
            report.outcome.rating,
            report.outcome.target_buy_price,
        );
        println!("    {}", report.outcome.rationale);
    }
    println!(
        "Summary: average_score={:.1} final_rating={} final_target_price={:.2}",
        summary.average_score, summary.final_rating, summary.final_target_price,
    );

    Ok(())
}
