//! # Calendar Stream Live Data Test
//!
//! Connects to the real Trading Economics feed via lib_calendar with the
//! subscription override enabled and prints every decoded event until
//! Ctrl-C. Requires TE_STREAM_USER and TE_STREAM_KEY in the environment
//! or a local .env file.

use std::sync::Arc;

use tokio::sync::mpsc;

use lib_calendar::{load_config, CalendarClient, CalendarEvent, DataAggregator, StreamConfig};

/// Routes every update into one channel regardless of symbol, so the
/// diagnostic sees the whole stream instead of per-symbol slices.
struct FirehoseAggregator {
    tx: mpsc::UnboundedSender<Arc<CalendarEvent>>,
}

impl DataAggregator for FirehoseAggregator {
    fn add(&self, _symbol: &str) -> mpsc::UnboundedReceiver<Arc<CalendarEvent>> {
        // Unused here; the single firehose channel is created in main.
        let (_tx, rx) = mpsc::unbounded_channel();
        rx
    }

    fn remove(&self, _symbol: &str) {}

    fn update(&self, event: CalendarEvent) {
        let _ = self.tx.send(Arc::new(event));
    }
}

/// Executes the live stream diagnostic.
///
/// // Statement: Prints every decoded CalendarEvent to stdout until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // // Statement: Force the override so every supported-country event flows
    let mut options = load_config();
    options.override_subscription_check = Some(true);
    let config = match StreamConfig::from_options(options) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n[ERROR] Configuration invalid:");
            eprintln!(">>> {}", e);
            std::process::exit(1);
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let aggregator = Arc::new(FirehoseAggregator { tx });
    let mut client = CalendarClient::new(config, aggregator as Arc<dyn DataAggregator>);
    client.start();

    println!("[*] Streaming live calendar events, Ctrl-C to stop...");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\n[*] Ctrl-C received, shutting down.");
                break;
            }
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        println!("-----------------------------------------------");
                        println!(
                            "[EVENT] {} | {} | {}",
                            event.symbol, event.event, event.last_update
                        );
                        println!(
                            "        actual={} previous={:?} forecast={:?} importance={:?}",
                            event.actual, event.previous, event.forecast, event.importance
                        );
                    }
                    None => {
                        eprintln!("[ERROR] Event channel closed unexpectedly.");
                        break;
                    }
                }
            }
        }
    }

    client.shutdown().await;
    println!("[*] Connected at exit: {}", client.is_connected());
    Ok(())
}
