pub mod cli;
pub mod columns;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod load;
pub mod models;
pub mod ranking;
pub mod report;
pub mod rows;
pub mod schema;
pub mod store;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    store::{JsonStore, ResultStore},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging(debug: bool) {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if debug {
            builder.filter_module("school_ranker", LevelFilter::Debug);
        } else if env::var("RUST_LOG").is_err() {
            builder.filter_module("school_ranker", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    match cli.command {
        Commands::Load(args) => load::execute(&args),
        Commands::Rank(args) => handle_rank(&args),
        Commands::Report(args) => report::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
    }
}

fn handle_rank(args: &cli::RankArgs) -> Result<()> {
    let mut store = JsonStore::open(&args.store.store, &args.store.database)
        .with_context(|| format!("Opening store in {:?}", args.store.store))?;
    let ranked = load::rank_period(&mut store, args.period)
        .with_context(|| format!("Ranking period {}", args.period))?;
    info!(
        "Ranked {} result(s) for period {} in {:?}",
        ranked.len(),
        args.period,
        store.path()
    );
    if let Some(top) = ranked.first().and_then(|r| r.school)
        && let Some(school) = store.find_school_by_id(top)?
    {
        info!("Top ranked: {} ({})", school.name, school.locality);
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
