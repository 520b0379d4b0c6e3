//! Score fusion for hybrid retrieval
//!
//! `final = vector_weight * (1 - vector_score) + rerank_weight * rerank_score`,
//! where `vector_score` is read as a distance.

use std::cmp::Ordering;

use crate::config::{RetrievalConfig, ScoreNormalization};
use crate::providers::ScoreKind;
use crate::types::{ScoredResult, SearchCandidate};

/// Weights of the two signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub vector: f32,
    pub rerank: f32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            vector: 0.3,
            rerank: 0.7,
        }
    }
}

impl From<&RetrievalConfig> for FusionWeights {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            vector: config.vector_weight,
            rerank: config.rerank_weight,
        }
    }
}

/// Fuse one candidate's scores
///
/// With `AsDistance` the raw score goes into the formula unchanged, whatever
/// the backend reports. With `PerBackend` a similarity is first turned into a
/// distance.
pub fn fuse_score(
    vector_score: f32,
    rerank_score: f32,
    kind: ScoreKind,
    normalization: ScoreNormalization,
    weights: FusionWeights,
) -> f32 {
    let distance = match normalization {
        ScoreNormalization::AsDistance => vector_score,
        ScoreNormalization::PerBackend => kind.convert(vector_score, ScoreKind::Distance),
    };

    weights.vector * (1.0 - distance) + weights.rerank * rerank_score
}

/// Combine candidates with their rerank scores and rank them
///
/// `rerank_scores` is aligned with `candidates`. Results come back sorted by
/// `final_score`, best first.
pub fn fuse(
    candidates: Vec<SearchCandidate>,
    rerank_scores: &[f32],
    kind: ScoreKind,
    config: &RetrievalConfig,
) -> Vec<ScoredResult> {
    let weights = FusionWeights::from(config);

    let mut results: Vec<ScoredResult> = candidates
        .into_iter()
        .zip(rerank_scores.iter().copied())
        .map(|(candidate, rerank)| {
            let fused = fuse_score(
                candidate.vector_score,
                rerank,
                kind,
                config.score_normalization,
                weights,
            );
            ScoredResult::from_candidate(candidate, rerank, fused)
        })
        .collect();

    sort_by_final_score(&mut results);
    results
}

/// Stable descending sort on `final_score`; NaN sorts last
pub fn sort_by_final_score(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| descending_nan_last(a.final_score, b.final_score));
}

fn descending_nan_last(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
