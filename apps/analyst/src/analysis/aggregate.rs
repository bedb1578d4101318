//! Aggregator — combines per-prompt outcomes into one run summary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analysis::outcome::PromptOutcome;

/// Aggregated verdict across all prompt outcomes of a run. Derived
/// deterministically; never persisted independently of its run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub average_score: f64,
    pub final_rating: String,
    pub final_target_price: f64,
}

/// Combines per-prompt outcomes into one summary.
///
/// # Panics
///
/// Panics if `outcomes` is empty. An empty catalog is rejected upstream
/// before any prompt runs, so an empty slice here is a programming error.
pub fn aggregate(outcomes: &[PromptOutcome]) -> RunSummary {
    assert!(!outcomes.is_empty(), "aggregate called with no outcomes");

    let count = outcomes.len() as f64;
    let average_score = outcomes.iter().map(|o| o.score as f64).sum::<f64>() / count;
    let final_target_price = outcomes.iter().map(|o| o.target_buy_price).sum::<f64>() / count;
    let final_rating = majority_rating(outcomes.iter().map(|o| o.rating.as_str()));

    RunSummary {
        average_score,
        final_rating,
        final_target_price,
    }
}

/// Majority vote over rating strings. A tie between the two most frequent
/// ratings collapses to the conservative default `HOLD`; ties below the top
/// rank are irrelevant. Only the top two ranks are inspected, so a three-way
/// tie also yields `HOLD`.
fn majority_rating<'a>(ratings: impl Iterator<Item = &'a str>) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for rating in ratings {
        *counts.entry(rating).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // Count descending, then rating ascending so equal counts rank deterministically.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    if ranked.len() == 1 {
        return ranked[0].0.to_string();
    }
    if ranked[0].1 == ranked[1].1 {
        return "HOLD".to_string();
    }
    ranked[0].0.to_string()
}
