use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use deal_scanner::config::Config;
use deal_scanner::db::MarketPriceWriter;
use deal_scanner::error::Result;
use deal_scanner::fetcher::fetch_listings;
use deal_scanner::output::OutputRecord;
use deal_scanner::pipeline::Pipeline;
use deal_scanner::scorer::DealScorer;

/// Pulls the configured auction search, scores it, stores it and logs the picks.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Auction watch failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!("Auction watch starting");

    let listings = fetch_listings(&cfg.auction).await?;
    if listings.is_empty() {
        warn!("No listings returned by the auction API");
        return Ok(());
    }
    info!("Received {} listings, scoring", listings.len());

    let pipeline = Pipeline::new(
        DealScorer::new(cfg.scoring.clone()),
        MarketPriceWriter::new(&cfg.db),
    );
    let records = pipeline.run_listings(listings).await;

    log_recommendations(&records);
    Ok(())
}

fn log_recommendations(records: &[OutputRecord]) {
    let deals: Vec<_> = records
        .iter()
        .filter_map(|r| match r {
            OutputRecord::Deal { listing, db_status } => Some((listing, db_status)),
            OutputRecord::Error(e) => {
                error!("Scoring failed: {}", e.grade);
                None
            }
        })
        .collect();

    info!(count = deals.len(), "Analysis complete: {} recommendations", deals.len());
    if deals.is_empty() {
        info!("No deals right now, every listing is near the batch mean");
        return;
    }

    for (scored, db_status) in deals {
        info!(
            name = %scored.listing.name,
            price = scored.listing.price,
            z_score = format_args!("{:.2}", scored.z_score),
            "[DEAL] {} | price: {} gold | z-score: {:.2}",
            scored.listing.name, scored.listing.price, scored.z_score,
        );
        if let Some(status) = db_status {
            info!("[DB] {status}");
        }
    }
}
