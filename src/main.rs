use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use crossover_sweep::backtesting::GridRunner;
use crossover_sweep::config::Config;

fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    info!(
        "Tickers: {} | Trials per cell: {} | Cash: ${:.2}",
        cfg.grid.tickers.join(","),
        cfg.grid.n_trials,
        cfg.grid.starting_cash
    );

    let runner = GridRunner::new(cfg.grid.clone());
    let report = runner.run();

    report.print_summary();

    let path = report.save_csv(&cfg.report_dir)?;
    println!("\nResults saved to: {}", path.display());

    Ok(())
}
