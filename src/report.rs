//! Ranked period report, joining each stored result with its school.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::info;

use crate::{
    cli::{ReportArgs, ReportFormat},
    io_utils,
    models::ExamResult,
    store::{JsonStore, ResultStore},
    table::{self, Column},
};

const REPORT_HEADERS: &[&str] = &[
    "rank",
    "school",
    "locality",
    "median_vce_score",
    "percent_completion_vce",
    "percent_score_40_and_over",
    "ranking_score",
    "ranking_score_wma",
];

/// One report line per result, best rank first.
pub fn build_rows<S: ResultStore>(
    store: &S,
    period: i64,
    limit: Option<usize>,
) -> Result<Vec<Vec<String>>> {
    let results = store.results_for_period(period)?;
    let take = limit.unwrap_or(results.len());
    results
        .iter()
        .sorted_by(|a, b| {
            a.rank
                .cmp(&b.rank)
                .then(b.ranking_score_wma.total_cmp(&a.ranking_score_wma))
        })
        .take(take)
        .map(|result| report_row(store, result))
        .collect()
}

fn report_row<S: ResultStore>(store: &S, result: &ExamResult) -> Result<Vec<String>> {
    let school = match result.school {
        Some(id) => store.find_school_by_id(id)?,
        None => None,
    };
    let (name, locality) = school
        .map(|s| (s.name, s.locality))
        .unwrap_or_default();
    Ok(vec![
        result.rank.to_string(),
        name,
        locality,
        result.median_vce_score.to_string(),
        result.percent_completion_vce.to_string(),
        result.percent_score_40_and_over.to_string(),
        format!("{:.2}", result.ranking_score),
        format!("{:.2}", result.ranking_score_wma),
    ])
}

pub fn execute(args: &ReportArgs) -> Result<()> {
    let store = JsonStore::open(&args.store.store, &args.store.database)
        .with_context(|| format!("Opening store in {:?}", args.store.store))?;
    let rows = build_rows(&store, args.period, args.limit)
        .with_context(|| format!("Reading results for period {}", args.period))?;
    if rows.is_empty() {
        info!("No results stored for period {}", args.period);
        return Ok(());
    }
    match args.format {
        ReportFormat::Table => {
            let columns = REPORT_HEADERS
                .iter()
                .map(|title| match *title {
                    "school" | "locality" => Column::left(title),
                    _ => Column::right(title),
                })
                .collect::<Vec<_>>();
            table::print_table(&columns, &rows);
        }
        ReportFormat::Csv => {
            let mut writer = io_utils::open_csv_writer(args.output.as_deref(), b',')?;
            writer
                .write_record(REPORT_HEADERS)
                .context("Writing report headers")?;
            for row in &rows {
                writer.write_record(row).context("Writing report row")?;
            }
            writer.flush().context("Flushing report writer")?;
        }
    }
    info!(
        "Reported {} result(s) for period {}",
        rows.len(),
        args.period
    );
    Ok(())
}
