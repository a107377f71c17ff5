//! quotedesk - convert quote descriptions between markdown-ish text and editor markup

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quotedesk_core::codec::normalize_markdown;
use quotedesk_core::{Config, RichTextCodec};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Quote description converter
#[derive(Parser, Debug)]
#[command(name = "quotedesk")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the platform default
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render markdown-ish text as editor markup
    Encode {
        /// Input file (stdin when omitted)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Convert editor markup back to markdown-ish text
    Decode {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// Check that markdown-ish text survives a round trip through the editor
    Check {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let codec = RichTextCodec::from_config(&config);
    let mut stdout = io::stdout().lock();

    match args.command {
        Command::Encode { file } => {
            let input = read_input(file.as_deref())?;
            writeln!(stdout, "{}", codec.encode(&input))?;
        }
        Command::Decode { file } => {
            let input = read_input(file.as_deref())?;
            writeln!(stdout, "{}", codec.decode(&input))?;
        }
        Command::Check { file } => {
            let input = read_input(file.as_deref())?;
            if let Some(decoded) = roundtrip_mismatch(&codec, &input) {
                log::warn!("Round trip changed the input");
                writeln!(stdout, "round trip changed the input:\n{}", decoded)?;
                return Ok(ExitCode::FAILURE);
            }
            writeln!(stdout, "ok")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Read the whole input from a file, or stdin when no path is given
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// The decoded text when a round trip does not reproduce the normalized input
fn roundtrip_mismatch(codec: &RichTextCodec, markdown: &str) -> Option<String> {
    let decoded = codec.decode(&codec.encode(markdown));
    (decoded != normalize_markdown(markdown)).then_some(decoded)
}
