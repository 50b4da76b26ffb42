//! Loading of one period's result file into a store, followed by ranking.
//!
//! [`Loader`] resolves both entity schemas against the header once, then for
//! every row: populates the school and the result, upserts the school, attaches
//! its identifier to the result, computes the ranking score, smooths it with
//! the school's previous scores, and upserts the result. [`rank_period`] runs
//! afterwards over the whole period and writes ranks back.

use anyhow::{Context, Result, bail, ensure};
use log::{debug, info, warn};

use crate::{
    cli::LoadArgs,
    error::{LoadError, RowFailure},
    io_utils,
    models::{ExamResult, RESULT_SCHEMA, SCHOOL_SCHEMA, School},
    ranking::{self, weighted_moving_average},
    rows::populate,
    schema::ColumnIndex,
    store::{JsonStore, ResultStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop at the first failing row.
    #[default]
    FailFast,
    /// Record failing rows and keep loading the rest.
    Collect,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub period: i64,
    /// Periods smoothed by the moving average, the current one included.
    pub window: usize,
    pub error_policy: ErrorPolicy,
}

impl LoadOptions {
    pub fn new(period: i64) -> Self {
        Self {
            period,
            window: ranking::DEFAULT_WMA_WINDOW,
            error_policy: ErrorPolicy::FailFast,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoadSummary {
    pub rows: usize,
    pub loaded: usize,
    pub failures: Vec<RowFailure>,
}

pub struct Loader<'a, S: ResultStore> {
    store: &'a mut S,
    options: LoadOptions,
    schools: ColumnIndex,
    results: ColumnIndex,
}

impl<'a, S: ResultStore> Loader<'a, S> {
    pub fn new<H: AsRef<str>>(store: &'a mut S, header: &[H], options: LoadOptions) -> Self {
        let schools = ColumnIndex::build(header, &SCHOOL_SCHEMA);
        let results = ColumnIndex::build(header, &RESULT_SCHEMA);
        for mismatch in schools.mismatches().iter().chain(results.mismatches().iter()) {
            debug!("Skipping {mismatch}");
        }
        debug!("School columns: {:?}", schools.to_map());
        debug!("Result columns: {:?}", results.to_map());
        Self {
            store,
            options,
            schools,
            results,
        }
    }

    pub fn school_columns(&self) -> &ColumnIndex {
        &self.schools
    }

    pub fn result_columns(&self) -> &ColumnIndex {
        &self.results
    }

    pub fn load_row<C: AsRef<str>>(&mut self, row: &[C]) -> Result<ExamResult, LoadError> {
        let school: School = populate(row, &self.schools, &SCHOOL_SCHEMA)?;
        let mut result: ExamResult = populate(row, &self.results, &RESULT_SCHEMA)?;

        let key = school.key();
        self.store.upsert_school(school)?;
        let stored = self.store.find_school(&key)?.ok_or_else(|| {
            LoadError::persistence(
                "find school",
                format!("'{}' ({}) missing after upsert", key.name, key.locality),
            )
        })?;
        let school_id = stored.id.ok_or_else(|| {
            LoadError::persistence("find school", format!("'{}' has no identifier", key.name))
        })?;

        result.school = Some(school_id);
        result.period = self.options.period;
        result.ranking_score = ranking::ranking_score(&result);

        let history_len = self.options.window.saturating_sub(1);
        let mut scores =
            self.store
                .historical_scores(school_id, self.options.period, history_len)?;
        scores.push(result.ranking_score);
        result.ranking_score_wma = weighted_moving_average(&scores);
        debug!(
            "{} ({}): score {} smoothed over {} period(s) to {}",
            stored.name,
            stored.locality,
            result.ranking_score,
            scores.len(),
            result.ranking_score_wma
        );

        self.store.upsert_result(result)
    }

    /// Loads every row. Under [`ErrorPolicy::FailFast`] the first failure is
    /// returned; rows stored before it stay stored.
    pub fn load_rows<C: AsRef<str>>(&mut self, rows: &[Vec<C>]) -> Result<LoadSummary, RowFailure> {
        let mut summary = LoadSummary::default();
        for (idx, row) in rows.iter().enumerate() {
            summary.rows += 1;
            let line = idx + 2;
            match self.load_row(row) {
                Ok(_) => summary.loaded += 1,
                Err(error) => {
                    let failure = RowFailure { line, error };
                    match self.options.error_policy {
                        ErrorPolicy::FailFast => return Err(failure),
                        ErrorPolicy::Collect => {
                            warn!("Skipping {failure}");
                            summary.failures.push(failure);
                        }
                    }
                }
            }
        }
        Ok(summary)
    }
}

/// Ranks every stored result of `period` by its smoothed score and writes the
/// ranks back. Returns the results in rank order.
pub fn rank_period<S: ResultStore>(store: &mut S, period: i64) -> Result<Vec<ExamResult>, LoadError> {
    let mut results = store.results_for_period(period)?;
    ranking::rank_period(&mut results);
    let mut ranks = Vec::with_capacity(results.len());
    for result in &results {
        let school = result.school.ok_or_else(|| {
            LoadError::persistence("update rank", "stored result has no school")
        })?;
        debug!(
            "School ID: {school}, ranking score: {}, rank: {}",
            result.ranking_score_wma, result.rank
        );
        ranks.push((school, result.rank));
    }
    store.update_ranks(period, &ranks)?;
    Ok(results)
}

pub fn execute(args: &LoadArgs) -> Result<()> {
    ensure!(args.period != 0, "--period must be a nonzero period such as 2015");
    ensure!(args.window >= 1, "--window must be at least 1");
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Loading '{}' for period {} (delimiter '{}', window {})",
        args.input.display(),
        args.period,
        crate::printable_delimiter(delimiter),
        args.window
    );

    let table = io_utils::read_table_from_path(&args.input, delimiter, encoding)?;
    let mut store = JsonStore::open(&args.store.store, &args.store.database)
        .with_context(|| format!("Opening store in {:?}", args.store.store))?;

    let options = LoadOptions {
        period: args.period,
        window: args.window,
        error_policy: if args.keep_going {
            ErrorPolicy::Collect
        } else {
            ErrorPolicy::FailFast
        },
    };
    let summary = {
        let mut loader = Loader::new(&mut store, &table.header, options);
        if loader.school_columns().get("name").is_none() {
            warn!("No 'name' column found; every row will map to the same unnamed school");
        }
        loader
            .load_rows(&table.rows)
            .with_context(|| format!("Loading {:?}", args.input))?
    };
    info!(
        "Loaded {} of {} row(s) into {:?}",
        summary.loaded,
        summary.rows,
        store.path()
    );

    let ranked = rank_period(&mut store, args.period)
        .with_context(|| format!("Ranking period {}", args.period))?;
    info!(
        "Ranked {} result(s) for period {}",
        ranked.len(),
        args.period
    );

    if !summary.failures.is_empty() {
        bail!(
            "{} of {} row(s) failed to load",
            summary.failures.len(),
            summary.rows
        );
    }
    Ok(())
}
