//! InfraSense agent CLI
//!
//! Real-time multi-sensor telemetry ingestion with rolling-window
//! buffering.

use clap::{Parser, Subcommand};
use crossbeam_channel::Sender;
use infrasense::{
    alerts::AlertEvaluator,
    checkpoint::create_shared_tracker,
    config::Config,
    pipeline::Pipeline,
    query::QueryFacade,
    stats::create_shared_stats,
    store::create_shared_store,
    telemetry::{classify, decode},
    transport::{message_channel, ConnectionMonitor, ConnectionStatus, RawMessage},
    VERSION,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "infrasense")]
#[command(version = VERSION)]
#[command(about = "Real-time multi-sensor telemetry ingestion", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest newline-delimited JSON messages from stdin or a file.
    ///
    /// Each line is a payload on the telemetry topic. A line may also be
    /// prefixed with an explicit topic ("rfid {...}") to address another
    /// topic, mirroring what a broker bridge would deliver.
    Run {
        /// Read messages from this file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,

        /// Expose the HTTP query endpoint while ingesting
        #[arg(long)]
        serve: bool,

        /// Port for the query endpoint (overrides the configured port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Decode and classify a single payload, then print the outcome
    Check {
        /// The JSON payload to inspect
        payload: String,
    },

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input, serve, port } => {
            cmd_run(input, serve, port);
        }
        Commands::Check { payload } => {
            cmd_check(&payload);
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

#[allow(unused_variables)]
fn cmd_run(input: Option<PathBuf>, serve: bool, port: Option<u16>) {
    println!("InfraSense agent v{VERSION}");
    println!();

    let config = Config::load().unwrap_or_default();

    let store = create_shared_store(config.window_capacity);
    let stats = create_shared_stats();
    let checkpoints = create_shared_tracker(config.window_capacity);
    let monitor = ConnectionMonitor::new();

    let pipeline = Pipeline::new(
        store.clone(),
        stats.clone(),
        checkpoints.clone(),
        config.rfid_topic.clone(),
    );
    let facade = QueryFacade::new(
        store,
        AlertEvaluator::new(config.thresholds(), config.stale_after_secs),
        monitor.clone(),
        stats.clone(),
        checkpoints,
    );

    println!("  Telemetry topic: {}", config.telemetry_topic);
    println!("  RFID topic: {}", config.rfid_topic);
    println!("  Window capacity: {}", config.window_capacity);
    println!("  Stale after: {}s", config.stale_after_secs);

    // Optionally expose the query facade over HTTP.
    #[cfg(feature = "server")]
    let server_handle = if serve {
        let server_port = port.unwrap_or(config.server_port);
        let runtime = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
        match runtime.block_on(infrasense::server::run(
            infrasense::server::ServerConfig::new(server_port),
            facade.clone(),
        )) {
            Ok((addr, shutdown_tx)) => {
                println!("  Query endpoint: http://{addr}");
                Some((runtime, shutdown_tx))
            }
            Err(e) => {
                eprintln!("Warning: could not start query endpoint: {e}");
                None
            }
        }
    } else {
        None
    };

    #[cfg(not(feature = "server"))]
    if serve {
        eprintln!("Warning: --serve flag ignored (server feature not enabled at compile time)");
    }

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    // Feed inbound messages from the reader thread to the pipeline.
    let (sender, receiver) = message_channel();
    let reader_monitor = monitor.clone();
    let telemetry_topic = config.telemetry_topic.clone();
    let reader = thread::spawn(move || {
        read_messages(input, &telemetry_topic, sender, reader_monitor);
    });

    // Main drain loop
    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(msg) => pipeline.dispatch(msg),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                // Reader finished and the queue is drained.
                break;
            }
        }
    }

    println!();
    println!("Stopping ingestion...");

    let _ = reader.join();

    #[cfg(feature = "server")]
    if let Some((runtime, shutdown_tx)) = server_handle {
        let _ = shutdown_tx.send(());
        runtime.shutdown_timeout(Duration::from_secs(1));
    }

    println!();
    println!("{}", stats.summary());
}

/// Read newline-delimited messages from `input` (or stdin) and forward
/// them to the pipeline channel, reporting connectivity along the way.
fn read_messages(
    input: Option<PathBuf>,
    telemetry_topic: &str,
    sender: Sender<RawMessage>,
    monitor: ConnectionMonitor,
) {
    monitor.set(ConnectionStatus::Connecting);

    let reader: Box<dyn BufRead> = match input {
        Some(path) => match std::fs::File::open(&path) {
            Ok(file) => Box::new(std::io::BufReader::new(file)),
            Err(e) => {
                monitor.set(ConnectionStatus::Error(format!(
                    "could not open {}: {e}",
                    path.display()
                )));
                return;
            }
        },
        None => Box::new(std::io::BufReader::new(std::io::stdin())),
    };

    monitor.set(ConnectionStatus::Connected);

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                monitor.set(ConnectionStatus::Error(e.to_string()));
                return;
            }
        };
        if let Some(msg) = parse_line(&line, telemetry_topic) {
            if sender.send(msg).is_err() {
                // Pipeline side went away; nothing left to feed.
                break;
            }
        }
    }

    monitor.set(ConnectionStatus::Disconnected);
}

/// Turn one input line into a raw message.
///
/// Bare JSON lines land on the telemetry topic; a `topic {...}` prefix
/// addresses another topic. Blank lines are skipped.
fn parse_line(line: &str, telemetry_topic: &str) -> Option<RawMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.starts_with('{') {
        return Some(RawMessage::new(telemetry_topic, line.as_bytes().to_vec()));
    }

    let (topic, payload) = line.split_once(char::is_whitespace)?;
    Some(RawMessage::new(topic, payload.trim().as_bytes().to_vec()))
}

fn cmd_check(payload: &str) {
    match decode(payload.as_bytes()) {
        Ok(record) => {
            println!("Discriminator: {}", record.discriminator());
            println!("Classified as: {}", classify(&record));
        }
        Err(e) => {
            eprintln!("Decode failed: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_bare_json() {
        let msg = parse_line(r#"{"sensor":"GPS","lat":1.0,"lon":2.0}"#, "LOKI_2004").unwrap();
        assert_eq!(msg.topic, "LOKI_2004");
    }

    #[test]
    fn test_parse_line_topic_prefix() {
        let msg = parse_line(r#"rfid {"station_id":"A1","tag_id":"T1"}"#, "LOKI_2004").unwrap();
        assert_eq!(msg.topic, "rfid");
        assert!(msg.payload.starts_with(b"{"));
    }

    #[test]
    fn test_parse_line_skips_blank() {
        assert!(parse_line("   ", "LOKI_2004").is_none());
        assert!(parse_line("bare-word", "LOKI_2004").is_none());
    }
}
