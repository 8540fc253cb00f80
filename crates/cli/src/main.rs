//! rplog: offline viewer for partition data directories.
//!
//! - `rplog ntps <dir>`: list partitions
//! - `rplog segment <file> [--records]`: dump the batches of a segment
//! - `rplog kvstore <dir> [--ntp ns/topic/partition]`: rebuild the kvstore
//!
//! Logs go to stderr (`RUST_LOG`, default `warn`) so `--json` output on
//! stdout stays parseable.

mod commands;
mod format;

use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use rplog_core::Ntp;
use rplog_durability::{LogDir, ReaderConfig, Segment};
use rplog_kvstore::{KvStore, KvStoreConfig};
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{
    format_batches, format_error, format_kvstores, format_ntps, BatchView, OutputMode, RecordView,
};

const KVSTORE_NAMESPACE: &str = "redpanda";
const KVSTORE_TOPIC: &str = "kvstore";

fn main() {
    let matches = build_cli().get_matches();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    match run(&matches, mode) {
        Ok(out) => print!("{}", out),
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            process::exit(1);
        }
    }
}

fn reader_config(matches: &ArgMatches) -> Result<ReaderConfig> {
    let mut config = ReaderConfig::new().with_strict_record_accounting(matches.get_flag("strict"));
    if let Some(size) = matches.get_one::<usize>("max-batch-size") {
        config = config.with_max_batch_size(*size);
    }
    config.validate()?;
    Ok(config)
}

fn run(matches: &ArgMatches, mode: OutputMode) -> Result<String> {
    let config = reader_config(matches)?;

    match matches.subcommand() {
        Some(("ntps", sub)) => {
            let dir = required(sub, "dir")?;
            let log = LogDir::scan(Path::new(dir), &config)
                .with_context(|| format!("scanning {}", dir))?;
            Ok(format_ntps(&log, mode))
        }
        Some(("segment", sub)) => {
            let file = required(sub, "file")?;
            let with_records = sub.get_flag("records");
            let segment = Segment::new(file);

            let mut views = Vec::new();
            for batch in segment
                .batches(&config)
                .with_context(|| format!("opening {}", file))?
            {
                let batch = batch.with_context(|| format!("reading {}", file))?;
                let records = if with_records {
                    let records = batch.decode_records(&config)?;
                    Some(
                        records
                            .iter()
                            .map(|r| RecordView::new(batch.header(), r))
                            .collect(),
                    )
                } else {
                    None
                };
                views.push(BatchView::new(&batch, records));
            }
            Ok(format_batches(&views, mode))
        }
        Some(("kvstore", sub)) => {
            let dir = required(sub, "dir")?;
            let log = LogDir::scan(Path::new(dir), &config)
                .with_context(|| format!("scanning {}", dir))?;

            let partitions: Vec<_> = match sub.get_one::<String>("ntp") {
                Some(ntp) => {
                    let ntp: Ntp = ntp.parse()?;
                    log.find(&ntp).cloned().collect()
                }
                None => log.topic(KVSTORE_NAMESPACE, KVSTORE_TOPIC).cloned().collect(),
            };
            if partitions.is_empty() {
                bail!("no matching kvstore partition under {}", dir);
            }

            let store_config = KvStoreConfig::new().with_reader(config);
            let mut stores = Vec::with_capacity(partitions.len());
            for partition in partitions {
                let name = partition.display_name();
                let state = KvStore::with_config(partition, store_config.clone())
                    .decode()
                    .with_context(|| format!("decoding kvstore {}", name))?;
                stores.push((name, state));
            }
            Ok(format_kvstores(&stores, mode))
        }
        _ => bail!("unknown command"),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing <{}>", name))
}
