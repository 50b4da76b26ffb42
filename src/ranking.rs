//! Ranking score, weighted moving average, and competition ranking.
//!
//! All functions are pure. Scores are `f32` throughout so that stored values,
//! smoothing, and tie detection agree bit for bit.

use std::cmp::Ordering;

use crate::models::ExamResult;

/// Number of periods (including the current one) smoothed by default.
pub const DEFAULT_WMA_WINDOW: usize = 3;

/// Absolute ranking score for one school in one period.
///
/// Each factor is offset by one so that a zero measure does not zero the score.
/// The integer measures are widened to `f32` before any arithmetic.
pub fn ranking_score(result: &ExamResult) -> f32 {
    (result.median_vce_score as f32 + 1.0)
        * (result.percent_completion_vce as f32 + 1.0)
        * (result.percent_score_40_and_over + 1.0)
}

/// Linearly weighted moving average of `scores`, ordered oldest to newest.
///
/// The i-th score (1-based) carries weight i. Returns 0.0 for an empty slice.
pub fn weighted_moving_average(scores: &[f32]) -> f32 {
    let mut numerator = 0.0f32;
    let mut denominator = 0usize;
    for (idx, score) in scores.iter().enumerate() {
        let weight = idx + 1;
        numerator += weight as f32 * score;
        denominator += weight;
    }
    if denominator == 0 {
        return 0.0;
    }
    numerator / denominator as f32
}

/// Competition ranks for WMA scores that are already sorted descending.
///
/// A score equal to its predecessor shares the predecessor's rank; any other
/// score takes its 1-based position, leaving a gap after each tie.
pub fn assign_ranks(sorted_scores: &[f32]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted_scores.len());
    let mut previous: Option<(f32, u32)> = None;
    for (idx, score) in sorted_scores.iter().copied().enumerate() {
        let rank = match previous {
            Some((previous_score, previous_rank)) if previous_score == score => previous_rank,
            _ => idx as u32 + 1,
        };
        ranks.push(rank);
        previous = Some((score, rank));
    }
    ranks
}

/// Stable sort by WMA score, highest first.
pub fn sort_by_wma_desc(results: &mut [ExamResult]) {
    results.sort_by(|a, b| descending(a.ranking_score_wma, b.ranking_score_wma));
}

fn descending(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}

/// Sorts a period's results and writes competition ranks into them.
pub fn rank_period(results: &mut [ExamResult]) {
    sort_by_wma_desc(results);
    let scores = results
        .iter()
        .map(|result| result.ranking_score_wma)
        .collect::<Vec<_>>();
    for (result, rank) in results.iter_mut().zip(assign_ranks(&scores)) {
        result.rank = i64::from(rank);
    }
}
