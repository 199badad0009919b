//! Session allocation pipeline.
//!
//! candidates -> content weights -> difficulty targets -> select -> anti-cluster
//! -> shuffle -> `AllocationResult`. Each stage takes and returns an owned
//! sequence; nothing is shared between calls.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cluster::anti_cluster;
use crate::constants::DIFFICULTY_LEVELS;
use crate::difficulty::{compute_targets, level_index};
use crate::error::{CoreError, Result};
use crate::question::{Question, is_valid_difficulty, validate_pool};
use crate::selector::{Budget, Strategy, select_balanced, select_weighted};
use crate::shuffle::shuffle_session;
use crate::weight::{content_items, weight_map};

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationOptions {
    pub max_questions: usize,
    pub target_duration_minutes: f64,
    #[serde(default)]
    pub difficulty_preference: Option<u8>,
    #[serde(default = "default_true")]
    pub balance_by_difficulty: bool,
    #[serde(default = "default_true")]
    pub prevent_clustering: bool,
}

impl Default for AllocationOptions {
    fn default() -> Self {
        Self::new(20, 15)
    }
}

impl AllocationOptions {
    pub fn new(max_questions: usize, target_duration_minutes: impl Into<f64>) -> Self {
        Self {
            max_questions,
            target_duration_minutes: target_duration_minutes.into(),
            difficulty_preference: None,
            balance_by_difficulty: true,
            prevent_clustering: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_questions == 0 {
            return Err(CoreError::invalid("max_questions must be positive"));
        }
        if !(self.target_duration_minutes.is_finite() && self.target_duration_minutes > 0.0) {
            return Err(CoreError::invalid("target_duration_minutes must be positive"));
        }
        if let Some(level) = self.difficulty_preference
            && !is_valid_difficulty(level)
        {
            return Err(CoreError::invalid(format!(
                "difficulty preference {level} out of range 1..=5"
            )));
        }
        Ok(())
    }

    pub fn strategy(&self) -> Strategy {
        if self.balance_by_difficulty {
            Strategy::Balanced
        } else {
            Strategy::WeightedPriority
        }
    }

    fn budget(&self) -> Budget {
        Budget::new(self.max_questions, self.target_duration_minutes)
    }
}

/// One session's plan, ready for the session runner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub questions: Vec<Question>,
    pub content_distribution: BTreeMap<String, usize>,
    /// Count per difficulty level; all five levels are present.
    pub difficulty_distribution: BTreeMap<u8, usize>,
    pub estimated_total_time_minutes: f64,
    pub strategy: Strategy,
}

impl AllocationResult {
    pub fn from_questions(questions: Vec<Question>, strategy: Strategy) -> Self {
        let mut content_distribution = BTreeMap::new();
        let mut difficulty_distribution: BTreeMap<u8, usize> =
            DIFFICULTY_LEVELS.iter().map(|&l| (l, 0)).collect();
        let mut total_seconds = 0.0;

        for q in &questions {
            *content_distribution.entry(q.content_id.clone()).or_insert(0) += 1;
            *difficulty_distribution.entry(q.difficulty_level).or_insert(0) += 1;
            total_seconds += q.estimated_time_seconds;
        }

        Self {
            questions,
            content_distribution,
            difficulty_distribution,
            estimated_total_time_minutes: total_seconds / 60.0,
            strategy,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn total_seconds(&self) -> f64 {
        self.questions.iter().map(|q| q.estimated_time_seconds).sum()
    }

    /// Difficulty counts in level order 1..=5.
    pub fn difficulty_counts(&self) -> [usize; 5] {
        let mut counts = [0; 5];
        for (&level, &n) in &self.difficulty_distribution {
            if let Some(i) = level_index(level) {
                counts[i] = n;
            }
        }
        counts
    }
}

/// Select and anti-cluster, stopping before the presentation shuffle.
///
/// This is the order the clustering guarantee applies to.
pub fn arrange(pool: &[Question], options: &AllocationOptions) -> Result<Vec<Question>> {
    options.validate()?;
    validate_pool(pool)?;

    let items = content_items(pool)?;
    let weights = weight_map(&items);
    let budget = options.budget();

    let selected = match options.strategy() {
        Strategy::Balanced => {
            let targets = compute_targets(options.max_questions, options.difficulty_preference)?;
            tracing::debug!(targets = ?targets.counts(), "difficulty targets");
            select_balanced(pool, &weights, &targets, &budget)
        }
        Strategy::WeightedPriority => select_weighted(pool, &weights, &budget),
    };

    tracing::debug!(
        pool = pool.len(),
        contents = items.len(),
        selected = selected.len(),
        strategy = %options.strategy(),
        "selection complete"
    );

    Ok(if options.prevent_clustering {
        anti_cluster(selected)
    } else {
        selected
    })
}

/// Build a session plan from the candidate pool.
///
/// An empty pool, or one whose questions all exceed the time budget, yields an
/// empty plan rather than an error.
pub fn allocate(
    pool: &[Question],
    options: &AllocationOptions,
    rng: &mut impl Rng,
) -> Result<AllocationResult> {
    let ordered = arrange(pool, options)?;
    let shuffled = shuffle_session(ordered, rng);
    Ok(AllocationResult::from_questions(shuffled, options.strategy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn q(id: &str, content: &str, level: u8, secs: u32) -> Question {
        Question::new(id, content, level, secs, 1.0)
    }

    #[test]
    fn test_options_validation() {
        assert!(AllocationOptions::default().validate().is_ok());
        assert!(AllocationOptions::new(0, 10).validate().is_err());
        assert!(AllocationOptions::new(10, 0).validate().is_err());
        assert!(AllocationOptions::new(10, -2.5).validate().is_err());
        assert!(AllocationOptions::new(10, f64::NAN).validate().is_err());
        assert!(AllocationOptions::new(10, 2.5).validate().is_ok());
        let mut opts = AllocationOptions::new(10, 10);
        opts.difficulty_preference = Some(7);
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_invalid_options_fail_before_selection() {
        let err = allocate(&[], &AllocationOptions::new(0, 5), &mut rng()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_pool_empty_plan() {
        let plan = allocate(&[], &AllocationOptions::default(), &mut rng()).unwrap();
        assert!(plan.is_empty());
        assert!(plan.content_distribution.is_empty());
        assert_eq!(plan.difficulty_counts(), [0; 5]);
        assert_relative_eq!(plan.estimated_total_time_minutes, 0.0);
    }

    #[test]
    fn test_budget_exceeded_immediately_is_empty() {
        let pool = vec![q("a", "c", 3, 600), q("b", "c", 3, 900)];
        let mut opts = AllocationOptions::new(5, 1);
        opts.balance_by_difficulty = false;
        let plan = allocate(&pool, &opts, &mut rng()).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.strategy, Strategy::WeightedPriority);
    }

    #[test]
    fn test_zero_duration_content_propagates() {
        let pool = vec![Question::new("a", "c", 3, 30, 0.0)];
        let err = allocate(&pool, &AllocationOptions::default(), &mut rng()).unwrap_err();
        assert!(matches!(err, CoreError::ContentDurationZero { .. }));
    }

    #[test]
    fn test_distributions_sum_to_len() {
        let pool: Vec<Question> = (0..30)
            .map(|i| q(&format!("q{i}"), &format!("c{}", i % 4), (i % 5 + 1) as u8, 20 + i))
            .collect();
        let plan = allocate(&pool, &AllocationOptions::new(12, 6), &mut rng()).unwrap();
        assert_eq!(plan.content_distribution.values().sum::<usize>(), plan.len());
        assert_eq!(plan.difficulty_distribution.values().sum::<usize>(), plan.len());
        assert_eq!(plan.difficulty_distribution.len(), 5);
    }

    #[test]
    fn test_prevent_clustering_off_keeps_selection_order() {
        let pool = vec![
            q("a1", "a", 3, 30).with_priority(0.9),
            q("a2", "a", 3, 30).with_priority(0.8),
            q("a3", "a", 3, 30).with_priority(0.7),
            q("b1", "b", 3, 30).with_priority(0.1),
        ];
        let mut opts = AllocationOptions::new(4, 10);
        opts.balance_by_difficulty = false;
        opts.prevent_clustering = false;
        let ids: Vec<String> = arrange(&pool, &opts)
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec!["a1", "a2", "a3", "b1"]);

        opts.prevent_clustering = true;
        let ids: Vec<String> = arrange(&pool, &opts)
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec!["a1", "a2", "b1", "a3"]);
    }

    #[test]
    fn test_seeded_allocation_is_reproducible() {
        let pool: Vec<Question> = (0..20)
            .map(|i| q(&format!("q{i}"), &format!("c{}", i % 3), (i % 5 + 1) as u8, 30))
            .collect();
        let opts = AllocationOptions::new(10, 10);
        let a = allocate(&pool, &opts, &mut SmallRng::seed_from_u64(9)).unwrap();
        let b = allocate(&pool, &opts, &mut SmallRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_result_wire_format() {
        let plan = AllocationResult::from_questions(vec![q("a", "c", 2, 90)], Strategy::Balanced);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["strategy"], "balanced");
        assert_eq!(json["contentDistribution"]["c"], 1);
        assert_eq!(json["difficultyDistribution"]["2"], 1);
        assert_eq!(json["estimatedTotalTimeMinutes"], 1.5);
    }

    #[test]
    fn test_fractional_minutes_fill_budget_exactly() {
        // 2.5 minutes is 150s: four 37.5s questions fit, a fifth does not.
        let pool: Vec<Question> = (0..6)
            .map(|i| Question::new(format!("q{i}"), format!("c{}", i % 2), 3, 37.5, 1.0))
            .collect();
        let mut opts = AllocationOptions::new(10, 2.5);
        opts.balance_by_difficulty = false;
        let plan = allocate(&pool, &opts, &mut rng()).unwrap();
        assert_eq!(plan.len(), 4);
        assert_relative_eq!(plan.total_seconds(), 150.0);
        assert_relative_eq!(plan.estimated_total_time_minutes, 2.5);
    }

    #[test]
    fn test_options_accept_fractional_minutes_on_the_wire() {
        let opts: AllocationOptions =
            serde_json::from_str(r#"{"maxQuestions": 8, "targetDurationMinutes": 2.5}"#).unwrap();
        assert_relative_eq!(opts.target_duration_minutes, 2.5);
        assert!(opts.balance_by_difficulty);
        assert!(opts.validate().is_ok());
    }
}
