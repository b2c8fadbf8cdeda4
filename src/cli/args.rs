//! CLI argument structures

use clap::{Args, Parser, Subcommand};
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

/// Transform text by piping selections through external commands
#[derive(Parser)]
#[command(name = "cli-transform")]
#[command(about = "cli-transform - Pipe selected text through external commands", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file applied on top of the user configuration
    #[arg(short = 'c', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace each selection with the output of a shell command
    #[command(name = "run")]
    Run {
        /// Shell command line (defaults to the configured command, `rev`)
        #[arg(long)]
        command: Option<String>,

        /// Kill the command after this long (e.g. 30s, 2m)
        #[arg(long, value_parser = parse_timeout)]
        timeout: Option<Duration>,

        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Encrypt each selection as an ansible-vault block
    #[command(name = "encrypt")]
    Encrypt {
        #[command(flatten)]
        vault: VaultArgs,

        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Decrypt each selected ansible-vault block, indented or not
    #[command(name = "decrypt")]
    Decrypt {
        #[command(flatten)]
        vault: VaultArgs,

        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Print the effective configuration as TOML
    #[command(name = "config")]
    Config,
}

#[derive(Args, Debug, Clone, Default)]
pub struct VaultArgs {
    /// Password file handed to ansible-vault
    #[arg(long, value_name = "PATH")]
    pub vault_password_file: Option<PathBuf>,

    /// Kill ansible-vault after this long (e.g. 30s, 2m)
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

/// Which document to open and which parts of it to select
#[derive(Args, Debug, Clone, Default)]
pub struct DocumentArgs {
    /// Document to transform; omitted or `-` reads stdin
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Write the result back to FILE
    #[arg(short = 'i', long, requires = "file", conflicts_with = "output")]
    pub in_place: bool,

    /// Write the result to this file instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Select a byte range; repeat for several selections
    #[arg(long = "select", value_name = "START..END", value_parser = parse_byte_range)]
    pub select: Vec<Range<usize>>,

    /// Select whole lines (1-based, inclusive); repeat for several selections
    #[arg(long = "lines", value_name = "FIRST..LAST", value_parser = parse_line_span)]
    pub lines: Vec<LineSpan>,

    /// Make every line its own selection
    #[arg(long, conflicts_with_all = ["select", "lines"])]
    pub each_line: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub first: usize,
    pub last: usize,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    crate::config::parse_duration(value).map_err(|e| format!("{:#}", e))
}

fn parse_number(value: &str) -> Result<usize, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a non-negative integer", value))
}

fn parse_byte_range(value: &str) -> Result<Range<usize>, String> {
    let (start, end) = value
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got '{}'", value))?;
    let range = parse_number(start)?..parse_number(end)?;
    if range.start > range.end {
        return Err(format!("range '{}' ends before it starts", value));
    }
    Ok(range)
}

fn parse_line_span(value: &str) -> Result<LineSpan, String> {
    let (first, last) = match value.split_once("..") {
        Some((first, last)) => (parse_number(first)?, parse_number(last)?),
        None => {
            let line = parse_number(value)?;
            (line, line)
        }
    };
    if first == 0 || first > last {
        return Err(format!("'{}' is not a valid 1-based line range", value));
    }
    Ok(LineSpan { first, last })
}
