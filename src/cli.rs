use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{ranking::DEFAULT_WMA_WINDOW, store::DEFAULT_DATABASE};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load school exam results and rank schools per period", long_about = None)]
pub struct Cli {
    /// Log every row and cell while processing
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a results CSV for one period into the store and rank the period
    Load(LoadArgs),
    /// Recompute and store ranks for a period that is already loaded
    Rank(RankArgs),
    /// Print a period's ranking
    Report(ReportArgs),
    /// Show how the school and result fields map onto a CSV header
    Columns(ColumnsArgs),
}

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Directory holding the document store
    #[arg(long = "store", default_value = "data")]
    pub store: PathBuf,
    /// Database name; stored as <store>/<database>.json
    #[arg(long = "database", default_value = DEFAULT_DATABASE)]
    pub database: String,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Input CSV file to load ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Period (year) the results belong to
    #[arg(short = 'p', long = "period", alias = "year")]
    pub period: i64,
    #[command(flatten)]
    pub store: StoreArgs,
    /// Number of periods smoothed by the weighted moving average, current included
    #[arg(long, default_value_t = DEFAULT_WMA_WINDOW)]
    pub window: usize,
    /// Keep loading after a row fails and report the failures at the end
    #[arg(long = "keep-going")]
    pub keep_going: bool,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct RankArgs {
    /// Period (year) to rank
    #[arg(short = 'p', long = "period", alias = "year")]
    pub period: i64,
    #[command(flatten)]
    pub store: StoreArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Table,
    Csv,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Period (year) to report
    #[arg(short = 'p', long = "period", alias = "year")]
    pub period: i64,
    #[command(flatten)]
    pub store: StoreArgs,
    /// Show only the first N ranked schools
    #[arg(long)]
    pub limit: Option<usize>,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: ReportFormat,
    /// Output CSV file when --format csv is used (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Input CSV file whose header is inspected
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
