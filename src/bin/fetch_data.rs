use anyhow::Result;
use chrono::Utc;
use chrono_tz::US::Eastern;
use tracing_subscriber::{fmt, EnvFilter};

use crossover_sweep::config::Config;
use crossover_sweep::data::fetch_and_save;
use crossover_sweep::provider::YahooClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    // sessions are dated on the exchange's calendar
    let today = Utc::now().with_timezone(&Eastern).date_naive();

    let mut client = YahooClient::new();
    let files = fetch_and_save(&mut client, &cfg.fetch, today).await?;

    println!("Done. {} CSVs saved:", files.len());
    for f in &files {
        println!("  {}", f.display());
    }

    Ok(())
}
