use std::io::Write;

use tracing::error;
use tracing_subscriber::EnvFilter;

use deal_scanner::config::Config;
use deal_scanner::db::MarketPriceWriter;
use deal_scanner::output::render_payload;
use deal_scanner::pipeline::Pipeline;
use deal_scanner::scorer::DealScorer;

/// `deal-score '<json array of listings>'`
///
/// Always prints one JSON array and exits 0; failures show up in the payload.
#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            println!("[]");
            return;
        }
    };

    // stdout carries the payload, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(std::io::stderr)
        .init();

    let input = std::env::args().nth(1);

    let pipeline = Pipeline::new(
        DealScorer::new(cfg.scoring.clone()),
        MarketPriceWriter::new(&cfg.db),
    );
    let records = pipeline.run_input(input.as_deref()).await;

    let payload = render_payload(&records, cfg.output_encoding).unwrap_or_else(|e| {
        error!("Failed to render output: {e}");
        b"[]\n".to_vec()
    });

    let mut out = std::io::stdout().lock();
    if let Err(e) = out.write_all(&payload).and_then(|()| out.flush()) {
        error!("Failed to write output: {e}");
    }
}
