//! Clap command tree definition.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("rplog")
        .about("Offline viewer for partition logs, snapshots and the kvstore")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("max-batch-size")
                .long("max-batch-size")
                .help("Largest batch size accepted before a header is treated as corrupt")
                .value_parser(value_parser!(usize))
                .global(true),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Fail batches whose records do not fill the batch exactly")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_ntps())
        .subcommand(build_segment())
        .subcommand(build_kvstore())
}

fn build_ntps() -> Command {
    Command::new("ntps")
        .about("List partitions under a data directory")
        .arg(Arg::new("dir").required(true).help("Data directory"))
}

fn build_segment() -> Command {
    Command::new("segment")
        .about("Dump the batches of a segment file")
        .arg(Arg::new("file").required(true).help("Segment file"))
        .arg(
            Arg::new("records")
                .long("records")
                .help("Also dump the records of every batch")
                .action(ArgAction::SetTrue),
        )
}

fn build_kvstore() -> Command {
    Command::new("kvstore")
        .about("Reconstruct and print the kvstore")
        .arg(Arg::new("dir").required(true).help("Data directory"))
        .arg(Arg::new("ntp").long("ntp").help(
            "Partition to decode as namespace/topic/partition \
             (default: every redpanda/kvstore partition)",
        ))
}
