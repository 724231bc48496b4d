mod config;
mod main_lib;
mod scheduler;

use config::Config;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_format);
    let state = build_state(&config).await?;

    match config.sync_interval {
        None => {
            scheduler::run_pass(&state).await;
        }
        Some(period) => {
            tracing::info!("Syncing every {:?}", period);
            scheduler::run_scheduler(state, period).await;
        }
    }
    Ok(())
}
