// Command-line front end.
//
// Subcommand-based: `decode` prints one line per packet, `stats` summarizes
// without printing packets, `config` reports build details. All file I/O
// errors and exit codes are owned here; the decoder itself never touches a
// file.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use log::warn;

use crate::io::{self, TraceSummary};
use crate::spe::packet::{self, AddressIndex, Packet, PacketKind, address_index, counter_index};

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    let size = num
        .checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))?;
    if size == 0 {
        return Err(format!("size must be nonzero: '{s}'"));
    }
    Ok(size)
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Arm SPE trace decoder.
#[derive(Parser, Debug)]
#[command(
    name = "spedec",
    version,
    about = "Arm SPE trace decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Decode trace files, printing one line per packet.
    Decode(DecodeArgs),
    /// Summarize trace files without printing packets.
    Stats(StatsArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Trace files to decode.
    #[arg(value_hint = ValueHint::FilePath, required = true)]
    files: Vec<PathBuf>,

    /// Decode padding packets instead of skipping them.
    #[arg(long = "keep-padding")]
    keep_padding: bool,

    /// Feed the decoder in fixed-size chunks (supports K/M/G suffix).
    #[arg(long = "chunk-size", value_parser = parse_byte_size)]
    chunk_size: Option<u64>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Trace files to summarize.
    #[arg(value_hint = ValueHint::FilePath, required = true)]
    files: Vec<PathBuf>,

    /// Output one JSON object per file.
    #[arg(long)]
    json: bool,
}

// ---------------------------------------------------------------------------
// Packet printing
// ---------------------------------------------------------------------------

fn print_address(pkt: &Packet) {
    let index = address_index(pkt.header);
    let Some(kind) = AddressIndex::from_header(pkt.header) else {
        println!("Address Unknown Index: {index:x}");
        return;
    };

    print!(
        "Address Index: {index:x} Addr: {:x} ",
        packet::address_sign_extended(pkt.data)
    );
    match kind {
        AddressIndex::DataVirtual => {
            print!("Tag: {:x} ", packet::address_tag(pkt.data));
        }
        AddressIndex::DataPhysical => {
            print!(
                "NS: {:x} Checked: {} Phys tag: {:x} ",
                packet::address_not_secure(pkt.data) as u8,
                packet::address_checked(pkt.data),
                packet::address_physical_tag(pkt.data)
            );
        }
        _ => {
            print!(
                "NS: {:x} EL: {:x} ",
                packet::address_not_secure(pkt.data) as u8,
                packet::address_el(pkt.data)
            );
        }
    }
    println!();
}

fn print_packet(pkt: &Packet) {
    match pkt.kind {
        PacketKind::Address => print_address(pkt),
        PacketKind::Context => println!("Context: {:x}", pkt.data),
        PacketKind::Counter => {
            println!("Counter: {:x} {}", counter_index(pkt.header), pkt.data)
        }
        PacketKind::DataSource => println!("Data source: {:x}", pkt.data),
        PacketKind::End => println!("==="),
        PacketKind::Events => println!("Events: {:x}", pkt.data),
        PacketKind::OperationType => println!(
            "Operation type: Class: {:x} Subclass: {:x}",
            pkt.header & 0x3,
            pkt.data
        ),
        PacketKind::Timestamp => {
            println!("Timestamp: {}", pkt.data);
            // Last packet in the record (when timestamps are enabled).
            println!("===");
        }
        PacketKind::Padding | PacketKind::Unknown | PacketKind::Invalid => {
            println!("header: {:x} data: {:x}", pkt.header, pkt.data)
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn check_trailing(path: &Path, summary: &TraceSummary) {
    if summary.trailing > 0 {
        warn!(
            "{}: {} trailing bytes (truncated final packet?)",
            path.display(),
            summary.trailing
        );
    }
}

fn cmd_decode(args: &DecodeArgs, cli: &Cli) -> i32 {
    for path in &args.files {
        let result = match args.chunk_size {
            Some(n) => io::decode_file_chunked(path, n as usize, args.keep_padding, print_packet),
            None => io::decode_file(path, args.keep_padding, print_packet),
        };

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("spedec: {}: {e}", path.display());
                return 1;
            }
        };

        check_trailing(path, &summary);
        if cli.verbose > 0 && !cli.quiet {
            eprintln!(
                "spedec: {}: {} bytes, {} packets, {} records",
                path.display(),
                summary.bytes,
                summary.packets,
                summary.records
            );
        }
    }
    0
}

fn cmd_stats(args: &StatsArgs, cli: &Cli) -> i32 {
    for path in &args.files {
        // Padding is decoded rather than skipped so its count is reported.
        let summary = match io::decode_file(path, true, |_| {}) {
            Ok(summary) => summary,
            Err(e) => {
                eprintln!("spedec: {}: {e}", path.display());
                return 1;
            }
        };

        check_trailing(path, &summary);
        if args.json {
            print_stats_json(path, &summary);
        } else if !cli.quiet {
            print_stats_text(path, &summary);
        }
    }
    0
}

fn print_stats_text(path: &Path, summary: &TraceSummary) {
    println!(
        "{}: {} bytes, {} packets, {} records, {} trailing",
        path.display(),
        summary.bytes,
        summary.packets,
        summary.records,
        summary.trailing
    );
    for (kind, count) in summary.counts() {
        if count > 0 {
            println!("  {:<16} {count}", kind.name());
        }
    }
}

fn print_stats_json(path: &Path, summary: &TraceSummary) {
    let counts: serde_json::Map<String, serde_json::Value> = summary
        .counts()
        .map(|(kind, count)| (kind.name().to_string(), count.into()))
        .collect();
    let obj = serde_json::json!({
        "file": path.display().to_string(),
        "bytes": summary.bytes,
        "packets": summary.packets,
        "records": summary.records,
        "trailing_bytes": summary.trailing,
        "counts": counts,
    });
    println!("{obj}");
}

fn cmd_config() -> i32 {
    println!("spedec {}", env!("CARGO_PKG_VERSION"));
    println!("  mmap: {}", cfg!(feature = "mmap"));
    println!("  fuzzing: {}", cfg!(feature = "fuzzing"));
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    let default_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match &cli.command {
        Cmd::Decode(args) => cmd_decode(args, &cli),
        Cmd::Stats(args) => cmd_stats(args, &cli),
        Cmd::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
