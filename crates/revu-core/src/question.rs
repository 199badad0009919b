use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::DIFFICULTY_LEVELS;
use crate::error::{CoreError, Result};

/// A candidate review question supplied by the content store.
///
/// `content_duration_hours` is the duration of the owning content item and is
/// repeated on every question of that item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub content_id: String,
    pub difficulty_level: u8,
    pub estimated_time_seconds: f64,
    #[serde(default)]
    pub priority_score: f64,
    pub content_duration_hours: f64,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        content_id: impl Into<String>,
        difficulty_level: u8,
        estimated_time_seconds: impl Into<f64>,
        content_duration_hours: f64,
    ) -> Self {
        Self {
            id: id.into(),
            content_id: content_id.into(),
            difficulty_level,
            estimated_time_seconds: estimated_time_seconds.into(),
            priority_score: 0.0,
            content_duration_hours,
        }
    }

    pub fn with_priority(mut self, priority_score: f64) -> Self {
        self.priority_score = priority_score;
        self
    }
}

pub fn is_valid_difficulty(level: u8) -> bool {
    DIFFICULTY_LEVELS.contains(&level)
}

/// Reject malformed candidates before selection. Content durations are checked
/// separately by the weight calculator.
pub fn validate_pool(pool: &[Question]) -> Result<()> {
    let mut seen = HashSet::with_capacity(pool.len());
    for q in pool {
        if !seen.insert(q.id.as_str()) {
            return Err(CoreError::invalid(format!("duplicate question id '{}'", q.id)));
        }
        if !is_valid_difficulty(q.difficulty_level) {
            return Err(CoreError::invalid(format!(
                "question '{}' has difficulty {} (expected 1..=5)",
                q.id, q.difficulty_level
            )));
        }
        if !(q.estimated_time_seconds.is_finite() && q.estimated_time_seconds > 0.0) {
            return Err(CoreError::invalid(format!(
                "question '{}' has estimated time {} (expected a positive number of seconds)",
                q.id, q.estimated_time_seconds
            )));
        }
        if !q.priority_score.is_finite() {
            return Err(CoreError::invalid(format!(
                "question '{}' has non-finite priority score",
                q.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pool_passes() {
        let pool = vec![
            Question::new("q1", "c1", 1, 30, 1.0),
            Question::new("q2", "c1", 5, 45, 1.0).with_priority(0.7),
        ];
        assert!(validate_pool(&pool).is_ok());
    }

    #[test]
    fn test_empty_pool_is_valid() {
        assert!(validate_pool(&[]).is_ok());
    }

    #[test]
    fn test_difficulty_out_of_range() {
        for level in [0, 6, 255] {
            let pool = vec![Question::new("q1", "c1", level, 30, 1.0)];
            assert!(matches!(
                validate_pool(&pool),
                Err(CoreError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_non_positive_time_rejected() {
        for secs in [0.0, -4.5, f64::NAN, f64::INFINITY] {
            let pool = vec![Question::new("q1", "c1", 3, secs, 1.0)];
            assert!(matches!(
                validate_pool(&pool),
                Err(CoreError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_fractional_time_accepted() {
        let pool = vec![Question::new("q1", "c1", 3, 45.5, 1.0)];
        assert!(validate_pool(&pool).is_ok());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let pool = vec![
            Question::new("q1", "c1", 3, 30, 1.0),
            Question::new("q1", "c2", 2, 30, 2.0),
        ];
        let err = validate_pool(&pool).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "got: {err}");
    }

    #[test]
    fn test_nan_priority_rejected() {
        let pool = vec![Question::new("q1", "c1", 3, 30, 1.0).with_priority(f64::NAN)];
        assert!(validate_pool(&pool).is_err());
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let json = r#"{
            "id": "q1",
            "contentId": "c1",
            "difficultyLevel": 2,
            "estimatedTimeSeconds": 40,
            "contentDurationHours": 1.5
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.content_id, "c1");
        assert_eq!(q.difficulty_level, 2);
        assert_eq!(q.priority_score, 0.0);
    }
}
