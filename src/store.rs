//! Persistence gateway for schools and results.
//!
//! [`ResultStore`] is the contract the loader needs: upsert by natural key,
//! lookups, the historical score window, the period-wide query, and rank
//! write-back. [`MemoryStore`] keeps both collections in ordered maps;
//! [`JsonStore`] wraps it and rewrites a single JSON document after every
//! mutation, so rows persisted before a failure stay committed.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::LoadError,
    models::{ExamResult, ResultKey, School, SchoolKey},
};

pub const DEFAULT_DATABASE: &str = "schools";

pub trait ResultStore {
    /// Inserts or updates the school identified by name and locality and
    /// returns the stored document, including its identifier.
    fn upsert_school(&mut self, school: School) -> Result<School, LoadError>;

    fn find_school(&self, key: &SchoolKey) -> Result<Option<School>, LoadError>;

    fn find_school_by_id(&self, id: Uuid) -> Result<Option<School>, LoadError>;

    /// Ranking scores of the `limit` most recent periods strictly before
    /// `before_period`, oldest first.
    fn historical_scores(
        &self,
        school: Uuid,
        before_period: i64,
        limit: usize,
    ) -> Result<Vec<f32>, LoadError>;

    /// Inserts or replaces the result identified by school and period.
    fn upsert_result(&mut self, result: ExamResult) -> Result<ExamResult, LoadError>;

    fn results_for_period(&self, period: i64) -> Result<Vec<ExamResult>, LoadError>;

    fn update_rank(&mut self, school: Uuid, period: i64, rank: i64) -> Result<(), LoadError>;

    /// Writes every `(school, rank)` pair of one period.
    fn update_ranks(&mut self, period: i64, ranks: &[(Uuid, i64)]) -> Result<(), LoadError> {
        for &(school, rank) in ranks {
            self.update_rank(school, period, rank)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    schools: Vec<School>,
    results: Vec<ExamResult>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    schools: BTreeMap<SchoolKey, School>,
    results: BTreeMap<ResultKey, ExamResult>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn school_count(&self) -> usize {
        self.schools.len()
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    fn from_document(document: StoreDocument) -> Result<Self, LoadError> {
        let mut store = MemoryStore::new();
        for school in document.schools {
            store.schools.insert(school.key(), school);
        }
        for result in document.results {
            let key = result.key().ok_or_else(|| {
                LoadError::persistence("read store", "result document without school_id")
            })?;
            store.results.insert(key, result);
        }
        Ok(store)
    }

    fn to_document(&self) -> StoreDocument {
        StoreDocument {
            schools: self.schools.values().cloned().collect(),
            results: self.results.values().cloned().collect(),
        }
    }
}

impl ResultStore for MemoryStore {
    fn upsert_school(&mut self, mut school: School) -> Result<School, LoadError> {
        let key = school.key();
        let id = self
            .schools
            .get(&key)
            .and_then(|existing| existing.id)
            .unwrap_or_else(Uuid::new_v4);
        school.id = Some(id);
        school.updated_at = Some(Utc::now());
        self.schools.insert(key, school.clone());
        Ok(school)
    }

    fn find_school(&self, key: &SchoolKey) -> Result<Option<School>, LoadError> {
        Ok(self.schools.get(key).cloned())
    }

    fn find_school_by_id(&self, id: Uuid) -> Result<Option<School>, LoadError> {
        Ok(self
            .schools
            .values()
            .find(|school| school.id == Some(id))
            .cloned())
    }

    fn historical_scores(
        &self,
        school: Uuid,
        before_period: i64,
        limit: usize,
    ) -> Result<Vec<f32>, LoadError> {
        let start = ResultKey {
            school,
            period: i64::MIN,
        };
        let end = ResultKey {
            school,
            period: before_period,
        };
        let mut scores = self
            .results
            .range(start..end)
            .rev()
            .take(limit)
            .map(|(_, result)| result.ranking_score)
            .collect::<Vec<_>>();
        scores.reverse();
        Ok(scores)
    }

    fn upsert_result(&mut self, mut result: ExamResult) -> Result<ExamResult, LoadError> {
        let key = result
            .key()
            .ok_or_else(|| LoadError::persistence("upsert result", "result has no school"))?;
        let scores = [
            result.percent_score_40_and_over,
            result.ranking_score,
            result.ranking_score_wma,
        ];
        if scores.iter().any(|score| !score.is_finite()) {
            return Err(LoadError::persistence(
                "upsert result",
                format!("non-finite score for school {} in period {}", key.school, key.period),
            ));
        }
        result.updated_at = Some(Utc::now());
        self.results.insert(key, result.clone());
        Ok(result)
    }

    fn results_for_period(&self, period: i64) -> Result<Vec<ExamResult>, LoadError> {
        Ok(self
            .results
            .values()
            .filter(|result| result.period == period)
            .cloned()
            .collect())
    }

    fn update_rank(&mut self, school: Uuid, period: i64, rank: i64) -> Result<(), LoadError> {
        let result = self
            .results
            .get_mut(&ResultKey { school, period })
            .ok_or_else(|| {
                LoadError::persistence(
                    "update rank",
                    format!("no result for school {school} in period {period}"),
                )
            })?;
        result.rank = rank;
        Ok(())
    }
}

/// Document store persisted as `<dir>/<database>.json`.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    pub fn open(dir: &Path, database: &str) -> Result<Self, LoadError> {
        if database.is_empty() || database.contains(['/', '\\']) || database.starts_with('.') {
            return Err(LoadError::persistence(
                "open store",
                format!("invalid database name '{database}'"),
            ));
        }
        fs::create_dir_all(dir).map_err(|err| LoadError::persistence("open store", err))?;
        let path = dir.join(format!("{database}.json"));
        let inner = if path.exists() {
            let file = File::open(&path).map_err(|err| LoadError::persistence("open store", err))?;
            let document: StoreDocument = serde_json::from_reader(BufReader::new(file))
                .map_err(|err| LoadError::persistence("read store", err))?;
            MemoryStore::from_document(document)?
        } else {
            MemoryStore::new()
        };
        debug!(
            "Opened store {:?} with {} school(s) and {} result(s)",
            path,
            inner.school_count(),
            inner.result_count()
        );
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn school_count(&self) -> usize {
        self.inner.school_count()
    }

    pub fn result_count(&self) -> usize {
        self.inner.result_count()
    }

    fn commit(&self, operation: &'static str) -> Result<(), LoadError> {
        let staging = self.path.with_extension("json.tmp");
        let file = File::create(&staging).map_err(|err| LoadError::persistence(operation, err))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.inner.to_document())
            .map_err(|err| LoadError::persistence(operation, err))?;
        writer
            .flush()
            .map_err(|err| LoadError::persistence(operation, err))?;
        drop(writer);
        fs::rename(&staging, &self.path).map_err(|err| LoadError::persistence(operation, err))
    }
}

impl ResultStore for JsonStore {
    fn upsert_school(&mut self, school: School) -> Result<School, LoadError> {
        let stored = self.inner.upsert_school(school)?;
        self.commit("upsert school")?;
        Ok(stored)
    }

    fn find_school(&self, key: &SchoolKey) -> Result<Option<School>, LoadError> {
        self.inner.find_school(key)
    }

    fn find_school_by_id(&self, id: Uuid) -> Result<Option<School>, LoadError> {
        self.inner.find_school_by_id(id)
    }

    fn historical_scores(
        &self,
        school: Uuid,
        before_period: i64,
        limit: usize,
    ) -> Result<Vec<f32>, LoadError> {
        self.inner.historical_scores(school, before_period, limit)
    }

    fn upsert_result(&mut self, result: ExamResult) -> Result<ExamResult, LoadError> {
        let stored = self.inner.upsert_result(result)?;
        self.commit("upsert result")?;
        Ok(stored)
    }

    fn results_for_period(&self, period: i64) -> Result<Vec<ExamResult>, LoadError> {
        self.inner.results_for_period(period)
    }

    fn update_rank(&mut self, school: Uuid, period: i64, rank: i64) -> Result<(), LoadError> {
        self.inner.update_rank(school, period, rank)?;
        self.commit("update rank")
    }

    fn update_ranks(&mut self, period: i64, ranks: &[(Uuid, i64)]) -> Result<(), LoadError> {
        self.inner.update_ranks(period, ranks)?;
        self.commit("update ranks")
    }
}
