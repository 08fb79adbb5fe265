// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! unified2 — spool-directory tailer and reader for unified2 IDS logs.
//!
//! Usage:
//!   unified2 tail     --config config.toml
//!   unified2 read     --config config.toml FILE...
//!   unified2 bookmark --config config.toml

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use unified2::bookmark::Bookmark;
use unified2::config::Config;
use unified2::event_reader::{FileEventReader, SpoolEventReader};

#[derive(Parser)]
#[command(name = "unified2", about = "unified2 spool reader", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tail the configured spool directory, printing one JSON line per event.
    Tail {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Read a fixed list of unified2 files once and print their events.
    Read {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
        /// Files to read, in order.
        files: Vec<PathBuf>,
    },
    /// Print the current durable bookmark and exit.
    Bookmark {
        #[arg(short, long, default_value = "config.toml")]
        config: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Tail { config } => run_tail(config),
        Command::Read { config, files } => run_read(config, files),
        Command::Bookmark { config } => run_bookmark(config),
    }
}

fn load_config(path: &PathBuf) -> Config {
    match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    }
}

fn run_tail(config_path: PathBuf) {
    let cfg = load_config(&config_path);

    info!(
        directory = ?cfg.spool.directory,
        prefix = %cfg.spool.prefix,
        bookmark_path = ?cfg.spool.bookmark_path,
        "starting tail"
    );

    let mut reader = match SpoolEventReader::new(
        &cfg.spool.directory,
        &cfg.spool.prefix,
        &cfg.spool.bookmark_path,
    ) {
        Ok(r) => r.with_max_record_length(cfg.spool.max_record_length),
        Err(e) => {
            error!(error = %e, "failed to open spool reader");
            std::process::exit(1);
        }
    };
    reader.set_on_rollover(|closed, opened| {
        info!(closed = %closed, opened = %opened, "spool file rotated")
    });

    let poll_interval = Duration::from_millis(cfg.spool.poll_interval_ms);
    loop {
        match reader.next() {
            Ok(Some(event)) => print_event(&event),
            Ok(None) => std::thread::sleep(poll_interval),
            Err(e) => {
                error!(error = %e, "error reading spool");
                std::process::exit(1);
            }
        }
    }
}

fn run_read(config_path: PathBuf, files: Vec<PathBuf>) {
    let cfg = load_config(&config_path);

    if files.is_empty() {
        error!("no files given");
        std::process::exit(1);
    }

    let mut reader =
        FileEventReader::new(files).with_max_record_length(cfg.spool.max_record_length);
    loop {
        match reader.next() {
            Ok(Some(event)) => print_event(&event),
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "decode error, skipping remainder of the offending record");
            }
        }
    }
}

fn run_bookmark(config_path: PathBuf) {
    let cfg = load_config(&config_path);
    let bookmark = Bookmark::new(&cfg.spool.bookmark_path);
    match bookmark.get() {
        Ok((Some(filename), offset)) => println!("{filename} {offset}"),
        Ok((None, _)) => println!("(no bookmark yet)"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_event(event: &unified2::aggregator::Event) {
    let fields: Vec<_> = event.records.iter().map(|r| r.fields()).collect();
    let line = serde_json::json!({
        "sensor-id": event.sensor_id,
        "event-id": event.event_id,
        "records": fields,
    });
    println!("{line}");
}
