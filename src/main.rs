mod chat;
mod duration;
mod error;
mod parser;
mod processor;
mod serialiser;
mod slots;
mod style;

use crate::chat::{OverlayOpts, SourceFormat, DEFAULT_DISPLAY_US};
use crate::error::ChatSubsError;
use crate::parser::Parser;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use log::{info, warn};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            std::process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(about = "Render an archived chat log as an ASS subtitle overlay")]
struct Cli {
    #[arg(value_name = "FILE", help = "The chat log (JSON) to read.")]
    input: PathBuf,
    #[arg(
        value_name = "START",
        help = "Start of the clip within the VOD, e.g. '1:35:00' or '1h35m'. Only used for VOD chat logs."
    )]
    start: Option<String>,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "The file to write to. Defaults to the input path with an .ass extension."
    )]
    output: Option<PathBuf>,
    #[arg(long, help = "Do not delete the chat log after a VOD log has been converted.")]
    keep_input: bool,
    #[arg(
        long,
        value_name = "N",
        default_value_t = chat::DEFAULT_SLOT_COUNT,
        help = "Number of chat rows stacked on screen."
    )]
    slots: usize,
    #[arg(
        long,
        value_name = "DURATION",
        help = "How long each message stays on screen, e.g. '4s'. Defaults to 4 seconds."
    )]
    display_time: Option<String>,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Log more details (-v, -vv).")]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn overlay_opts(cli: &Cli) -> Result<OverlayOpts> {
    if cli.slots == 0 {
        return Err(ChatSubsError::InvalidOption("--slots must be at least 1".to_string()).into());
    }
    let display_us = match cli.display_time.as_deref().and_then(duration::parse) {
        Some(0) => {
            return Err(ChatSubsError::InvalidOption(
                "--display-time must be longer than zero".to_string(),
            )
            .into())
        }
        Some(secs) => i64::try_from(secs)
            .ok()
            .and_then(|secs| secs.checked_mul(1_000_000))
            .ok_or_else(|| ChatSubsError::InvalidOption("--display-time is too long".to_string()))?,
        None => DEFAULT_DISPLAY_US,
    };
    Ok(OverlayOpts {
        slot_count: cli.slots,
        display_us,
        origin_secs: cli.start.as_deref().and_then(duration::parse).unwrap_or(0),
    })
}

fn run(cli: Cli) -> Result<()> {
    let opts = overlay_opts(&cli)?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("ass"));

    let data = std::fs::read_to_string(&cli.input)
        .context(format!("Failed to open input file: '{}'", cli.input.display()))?;

    let mut parser = Parser::new();
    let log = parser
        .parse(&data)
        .context(format!("Failed to read chat log: '{}'", cli.input.display()))?;
    println!("Total messages loaded: {}", log.total_records);
    let format = log.format;

    let events = processor::compile(log, &opts);
    println!("Filtered to {} unique messages", events.len());

    serialiser::serialise(&events, &output)?;
    println!("Generated ASS subtitles: {}", output.display());

    if format == SourceFormat::Elapsed && !cli.keep_input {
        remove_input(&cli.input);
    } else {
        info!("Keeping chat log: {}", cli.input.display());
    }
    Ok(())
}

fn remove_input(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            println!("Deleted chat JSON: {}", path.display());
            true
        }
        Err(err) => {
            warn!("Error deleting JSON: {}: {}", path.display(), err);
            false
        }
    }
}
