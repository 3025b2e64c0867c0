//! CLI entry point: wires option parsing, profile merging, display-name
//! assignment, reader spawning and the chosen aggregator/sink together.
//! Grounded on `main()` in `original_source/logfire.py`.

mod cli;
mod config;
mod display_name;
mod redis_sink;
mod writer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser as _;
use logtail_core::{Aggregator, Filter, Level, Reader, ReaderConfig};

fn parse_levels(raw: &str) -> Vec<Level> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.to_ascii_uppercase().as_str() {
            "TRACE" => Level::Trace,
            "DEBUG" => Level::Debug,
            "INFO" => Level::Info,
            "WARN" | "WARNING" => Level::Warn,
            "ERROR" => Level::Error,
            _ => Level::Fatal,
        })
        .collect()
}

fn build_filter(cli: &cli::Cli) -> Filter {
    Filter {
        levels: cli.levels.as_deref().map(parse_levels).unwrap_or_default(),
        grep: cli.grep.clone(),
        time_from: cli.time_from.clone(),
        time_to: cli.time_to.clone(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut cli = cli::Cli::parse();

    if let Some(profile_names) = &cli.profile {
        if let Some(path) = config::config_file_path() {
            match config::load(&path) {
                Ok(profiles) => {
                    let requested: Vec<String> = profile_names.split(',').map(str::trim).map(String::from).collect();
                    let merged = config::merge(&profiles, &requested);
                    if cli.files.is_empty() {
                        cli.files = merged.files;
                    }
                }
                Err(e) => {
                    eprintln!("warning: failed to load profile config {}: {e}", path.display());
                }
            }
        }
    }

    if cli.files.is_empty() {
        eprintln!("logtail: no files given");
        std::process::exit(2);
    }

    let names = display_name::assign_names(&cli.files);
    let filter = build_filter(&cli);
    let tail_length = if cli.tail { Some(cli.tail_lines) } else { None };

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .expect("failed to install signal handler");
    }

    let readers_config: Vec<ReaderConfig> = cli
        .files
        .iter()
        .enumerate()
        .map(|(reader_id, arg)| {
            let (_, path) = display_name::split_name_and_path(arg);
            ReaderConfig {
                path: path.into(),
                reader_id,
                follow: cli.follow,
                tail_length,
                filter: filter.clone(),
                checkpoint_prefix: cli.sincedb_prefix.clone(),
            }
        })
        .collect();

    // --redis always drains through the FIFO aggregator (spec §9's bounded
    // drain for the shipper); the terminal writer takes --fifo to pick FIFO
    // over the default timestamp-ordered merge.
    if cli.redis.is_some() || cli.fifo {
        let aggregator = Arc::new(logtail_core::aggregator::FifoAggregator::new(cli.files.len()));
        let readers: Vec<Reader> = readers_config
            .into_iter()
            .map(|config| Reader::spawn_with_tracing(config, aggregator.clone() as Arc<dyn Aggregator>))
            .collect();

        if let Some(target) = cli.redis.as_deref() {
            match redis_sink::parse_target(target) {
                Some((host_port, list_name)) => {
                    if let Err(e) = redis_sink::ship(aggregator.clone(), &names, &host_port, &list_name) {
                        eprintln!("logtail: redis sink error: {e}");
                    }
                }
                None => eprintln!("logtail: invalid --redis target {target:?}, expected host:port/list"),
            }
        } else {
            drain_to_terminal(aggregator.as_ref(), &names, &cli, &shutdown);
        }

        for reader in readers {
            let _ = reader.join();
        }
    } else {
        let aggregator = Arc::new(logtail_core::aggregator::OrderedAggregator::new(cli.files.len()));
        let readers: Vec<Reader> = readers_config
            .into_iter()
            .map(|config| Reader::spawn_with_tracing(config, aggregator.clone() as Arc<dyn Aggregator>))
            .collect();

        drain_to_terminal(aggregator.as_ref(), &names, &cli, &shutdown);

        for reader in readers {
            let _ = reader.join();
        }
    }
}

fn drain_to_terminal<A: Aggregator + ?Sized>(
    aggregator: &A,
    names: &[String],
    cli: &cli::Cli,
    shutdown: &AtomicBool,
) {
    let opts = writer::WriterOptions {
        collapse: cli.collapse,
        truncate: cli.truncate,
    };
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match aggregator.drain_one(Duration::from_millis(200)) {
            Some(entry) => {
                let name = names.get(entry.reader_id).map(String::as_str).unwrap_or("?");
                let _ = writer::write_entry(&mut handle, name, &entry, &opts);
            }
            None => break,
        }
    }
}
