use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;

use lib_calendar::{
    load_config, CalendarClient, ChannelAggregator, DataAggregator, StreamConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may come from a local .env file during development.
    let _ = dotenvy::dotenv();

    let options = load_config();
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(options.log_level.clone().unwrap_or_else(|| "info".to_string())),
    )
    .init();

    // Invalid configuration is fatal before any connection is attempted.
    let config = StreamConfig::from_options(options).context("invalid stream configuration")?;

    let aggregator = Arc::new(ChannelAggregator::new());
    let mut client = CalendarClient::new(config, aggregator.clone() as Arc<dyn DataAggregator>);
    client.start();
    log::info!("Calendar stream client started.");

    #[cfg(unix)]
    let mut term_signal = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?;

    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("Ctrl-C received, initiating shutdown.");
        }
        _ = async {
            #[cfg(unix)]
            {
                term_signal.recv().await;
                log::info!("SIGTERM received, initiating shutdown.");
            }
            #[cfg(not(unix))]
            {
                // On non-unix platforms, just wait forever.
                std::future::pending::<()>().await;
            }
        } => {}
    }

    client.shutdown().await;
    log::info!("Shutdown complete.");
    Ok(())
}
