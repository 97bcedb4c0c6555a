use crate::error::{PredictError, Result};
use crate::evaluation::cross_validation;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How candidate evaluations are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Sequential,
    /// Bounded rayon pool; `workers == 0` means use available parallelism.
    Parallel { workers: usize },
}

/// Hyperparameter search configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Candidate neighbor counts, evaluated in this order. The order is also
    /// the tie-break: among equal RMSE values the first candidate wins.
    pub k_range: Vec<usize>,
    pub folds: usize,
    pub mode: ExecutionMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k_range: (1..=20).collect(),
            folds: 5,
            mode: ExecutionMode::Sequential,
        }
    }
}

/// Cross-validation score for one candidate `k`. A failed candidate carries
/// the +inf/-inf sentinel so it can never be selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandidateScore {
    pub k: usize,
    pub rmse: f64,
    pub r2: f64,
}

impl CandidateScore {
    pub fn failed(&self) -> bool {
        !self.rmse.is_finite()
    }
}

/// Search result: the selected `k` plus the full per-candidate curve.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_k: usize,
    pub best_rmse: f64,
    pub best_r2: f64,
    pub candidates: Vec<CandidateScore>,
}

/// Evaluate every candidate `k` and select the one with minimum mean RMSE.
///
/// Parallel mode shares immutable borrows of the training data across rayon
/// workers; each worker builds its own tree, and results are collected back
/// into candidate order before selection, so the chosen `k` is identical to
/// a sequential run. If the pool cannot be built the search degrades to
/// sequential with a warning rather than failing.
pub fn find_optimal_k(
    features: &[Vec<f64>],
    targets: &[f64],
    config: &SearchConfig,
) -> Result<SearchOutcome> {
    let candidates = evaluate_candidates(features, targets, config);
    select_minimum(candidates)
}

fn evaluate_candidates(
    features: &[Vec<f64>],
    targets: &[f64],
    config: &SearchConfig,
) -> Vec<CandidateScore> {
    match config.mode {
        ExecutionMode::Sequential => evaluate_sequential(features, targets, config),
        ExecutionMode::Parallel { workers } => {
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.install(|| evaluate_parallel(features, targets, config)),
                Err(e) => {
                    warn!(error = %e, "could not build worker pool, falling back to sequential evaluation");
                    evaluate_sequential(features, targets, config)
                }
            }
        }
    }
}

fn evaluate_sequential(
    features: &[Vec<f64>],
    targets: &[f64],
    config: &SearchConfig,
) -> Vec<CandidateScore> {
    config
        .k_range
        .iter()
        .map(|&k| score_candidate(k, features, targets, config.folds))
        .collect()
}

fn evaluate_parallel(
    features: &[Vec<f64>],
    targets: &[f64],
    config: &SearchConfig,
) -> Vec<CandidateScore> {
    use rayon::prelude::*;

    // collect() preserves the candidate order regardless of which worker
    // finishes first.
    config
        .k_range
        .par_iter()
        .map(|&k| score_candidate(k, features, targets, config.folds))
        .collect()
}

fn score_candidate(k: usize, features: &[Vec<f64>], targets: &[f64], folds: usize) -> CandidateScore {
    match cross_validation::evaluate(k, features, targets, folds) {
        Ok(summary) => CandidateScore {
            k,
            rmse: summary.rmse,
            r2: summary.r2,
        },
        Err(e) => {
            warn!(k, error = %e, "candidate evaluation failed; recording worst-case score");
            CandidateScore {
                k,
                rmse: f64::INFINITY,
                r2: f64::NEG_INFINITY,
            }
        }
    }
}

/// Strict argmin over the candidate list: the first candidate with the
/// lowest finite RMSE wins, so ties resolve to the earliest `k` tested.
fn select_minimum(candidates: Vec<CandidateScore>) -> Result<SearchOutcome> {
    let mut best: Option<&CandidateScore> = None;
    for c in &candidates {
        if c.failed() {
            continue;
        }
        match best {
            Some(b) if c.rmse >= b.rmse => {}
            _ => best = Some(c),
        }
    }
    let Some(best) = best.copied() else {
        return Err(PredictError::SearchExhausted {
            candidates: candidates.len(),
        });
    };
    Ok(SearchOutcome {
        best_k: best.k,
        best_rmse: best.rmse,
        best_r2: best.r2,
        candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_data(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..n).map(|i| 2.0 * i as f64).collect();
        (x, y)
    }

    #[test]
    fn test_sequential_finds_a_best_k() {
        let (x, y) = linear_data(50);
        let config = SearchConfig {
            k_range: (1..=5).collect(),
            folds: 5,
            mode: ExecutionMode::Sequential,
        };
        let outcome = find_optimal_k(&x, &y, &config).unwrap();
        assert!(config.k_range.contains(&outcome.best_k));
        assert_eq!(outcome.candidates.len(), 5);
        assert!(outcome.best_rmse.is_finite());
    }

    #[test]
    fn test_parallel_matches_sequential_exactly() {
        let (x, y) = linear_data(60);
        let seq = SearchConfig {
            k_range: (1..=10).collect(),
            folds: 5,
            mode: ExecutionMode::Sequential,
        };
        let par = SearchConfig {
            mode: ExecutionMode::Parallel { workers: 4 },
            ..seq.clone()
        };
        let a = find_optimal_k(&x, &y, &seq).unwrap();
        let b = find_optimal_k(&x, &y, &par).unwrap();
        assert_eq!(a.best_k, b.best_k);
        assert_eq!(a.best_rmse, b.best_rmse);
        assert_eq!(a.best_r2, b.best_r2);
        for (ca, cb) in a.candidates.iter().zip(&b.candidates) {
            assert_eq!(ca.k, cb.k);
            assert_eq!(ca.rmse, cb.rmse);
            assert_eq!(ca.r2, cb.r2);
        }
    }

    #[test]
    fn test_parallel_default_workers() {
        let (x, y) = linear_data(40);
        let config = SearchConfig {
            k_range: (1..=5).collect(),
            folds: 5,
            mode: ExecutionMode::Parallel { workers: 0 },
        };
        assert!(find_optimal_k(&x, &y, &config).is_ok());
    }

    #[test]
    fn test_failed_candidate_does_not_abort_search() {
        let (x, y) = linear_data(15);
        // 5 folds of 3: training sets have 12 rows, so k=12 passes and
        // k=13.. fail; failures become sentinels, search still succeeds.
        let config = SearchConfig {
            k_range: vec![13, 14, 2],
            folds: 5,
            mode: ExecutionMode::Sequential,
        };
        let outcome = find_optimal_k(&x, &y, &config).unwrap();
        assert_eq!(outcome.best_k, 2);
        assert!(outcome.candidates[0].failed());
        assert!(outcome.candidates[1].failed());
        assert_eq!(outcome.candidates[0].rmse, f64::INFINITY);
        assert_eq!(outcome.candidates[0].r2, f64::NEG_INFINITY);
    }

    #[test]
    fn test_all_candidates_failed_is_exhausted() {
        let (x, y) = linear_data(6);
        let config = SearchConfig {
            k_range: vec![50, 60],
            folds: 3,
            mode: ExecutionMode::Sequential,
        };
        let err = find_optimal_k(&x, &y, &config).unwrap_err();
        assert!(matches!(
            err,
            PredictError::SearchExhausted { candidates: 2 }
        ));
    }

    #[test]
    fn test_tie_prefers_first_candidate() {
        let candidates = vec![
            CandidateScore { k: 3, rmse: 1.0, r2: 0.9 },
            CandidateScore { k: 1, rmse: 1.0, r2: 0.9 },
            CandidateScore { k: 2, rmse: 2.0, r2: 0.5 },
        ];
        let outcome = select_minimum(candidates).unwrap();
        assert_eq!(outcome.best_k, 3); // first-seen wins under argmin
    }

    #[test]
    fn test_candidate_order_preserved_in_outcome() {
        let (x, y) = linear_data(40);
        let config = SearchConfig {
            k_range: vec![5, 1, 3],
            folds: 4,
            mode: ExecutionMode::Parallel { workers: 2 },
        };
        let outcome = find_optimal_k(&x, &y, &config).unwrap();
        let ks: Vec<usize> = outcome.candidates.iter().map(|c| c.k).collect();
        assert_eq!(ks, vec![5, 1, 3]);
    }

    #[test]
    fn test_empty_candidate_range() {
        let (x, y) = linear_data(20);
        let config = SearchConfig {
            k_range: vec![],
            folds: 5,
            mode: ExecutionMode::Sequential,
        };
        let err = find_optimal_k(&x, &y, &config).unwrap_err();
        assert!(matches!(err, PredictError::SearchExhausted { candidates: 0 }));
    }
}
