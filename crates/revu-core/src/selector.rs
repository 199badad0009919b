//! Greedy question selection under count and time budgets.
//!
//! Candidates are ranked by `content_weight + priority_score`. Sorting is
//! stable, so equal scores keep their pool order.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DIFFICULTY_LEVELS;
use crate::difficulty::DifficultyTargets;
use crate::question::Question;

/// Which selection mode produced a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Per-difficulty quotas, filled level by level.
    #[default]
    Balanced,
    /// One ranked list, no difficulty quotas.
    WeightedPriority,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::WeightedPriority => "weighted-priority",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hard limits for one session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Budget {
    pub max_questions: usize,
    pub time_seconds: f64,
}

impl Budget {
    pub fn new(max_questions: usize, target_duration_minutes: impl Into<f64>) -> Self {
        Self {
            max_questions,
            time_seconds: target_duration_minutes.into() * 60.0,
        }
    }
}

/// Running totals while filling a session.
struct Fill {
    selected: Vec<Question>,
    used_seconds: f64,
}

impl Fill {
    fn new() -> Self {
        Self {
            selected: Vec::new(),
            used_seconds: 0.0,
        }
    }

    fn fits(&self, q: &Question, budget: &Budget) -> bool {
        self.used_seconds + q.estimated_time_seconds <= budget.time_seconds
    }

    fn push(&mut self, q: &Question) {
        self.used_seconds += q.estimated_time_seconds;
        self.selected.push(q.clone());
    }
}

pub fn score(q: &Question, weights: &HashMap<String, f64>) -> f64 {
    weights.get(&q.content_id).copied().unwrap_or(0.0) + q.priority_score
}

/// Candidates sorted by score, highest first. Stable for ties.
pub fn rank<'a>(
    candidates: impl IntoIterator<Item = &'a Question>,
    weights: &HashMap<String, f64>,
) -> Vec<&'a Question> {
    let mut scored: Vec<(f64, &Question)> = candidates
        .into_iter()
        .map(|q| (score(q, weights), q))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, q)| q).collect()
}

/// Fill each difficulty level in order 1..=5 up to its target.
///
/// An item that would overflow the time budget ends only its own level; the
/// next level still gets a chance with (possibly shorter) questions.
pub fn select_balanced(
    pool: &[Question],
    weights: &HashMap<String, f64>,
    targets: &DifficultyTargets,
    budget: &Budget,
) -> Vec<Question> {
    let mut fill = Fill::new();

    for level in DIFFICULTY_LEVELS {
        let quota = targets.for_level(level);
        let queue = rank(pool.iter().filter(|q| q.difficulty_level == level), weights);
        let mut taken = 0;

        for q in queue {
            if taken >= quota || fill.selected.len() >= budget.max_questions {
                break;
            }
            if !fill.fits(q, budget) {
                tracing::debug!(level, question = %q.id, "time budget reached for level");
                break;
            }
            fill.push(q);
            taken += 1;
        }
    }

    fill.selected
}

/// Take the highest-scoring candidates until either budget runs out. The first
/// candidate that would overflow the time budget ends the whole selection.
pub fn select_weighted(
    pool: &[Question],
    weights: &HashMap<String, f64>,
    budget: &Budget,
) -> Vec<Question> {
    let mut fill = Fill::new();

    for q in rank(pool, weights) {
        if fill.selected.len() >= budget.max_questions {
            break;
        }
        if !fill.fits(q, budget) {
            tracing::debug!(question = %q.id, "time budget reached");
            break;
        }
        fill.push(q);
    }

    fill.selected
}
