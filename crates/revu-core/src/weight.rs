//! Per-content weighting.
//!
//! Longer content earns a proportionally larger share, and content that packs
//! many questions per hour gets up to a 30% bonus on top.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::constants::{DENSITY_BONUS_WEIGHT, DENSITY_SATURATION};
use crate::error::{CoreError, Result};
use crate::question::Question;

/// A content item derived from the candidate pool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub content_id: String,
    pub duration_hours: f64,
    pub question_count: usize,
    pub weight: f64,
}

/// Weight of a content item given its duration, question count and the total
/// duration across all content in the pool.
pub fn content_weight(duration_hours: f64, question_count: usize, total_duration: f64) -> f64 {
    let duration_weight = duration_hours / total_duration;
    let insight_density = question_count as f64 / duration_hours;
    let density_bonus = (insight_density / DENSITY_SATURATION).min(1.0);
    duration_weight * (1.0 + DENSITY_BONUS_WEIGHT * density_bonus)
}

/// Aggregate the pool into weighted content items, ordered by content id.
pub fn content_items(pool: &[Question]) -> Result<Vec<ContentItem>> {
    let mut aggregated: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for q in pool {
        let duration = q.content_duration_hours;
        if duration == 0.0 {
            return Err(CoreError::ContentDurationZero {
                content_id: q.content_id.clone(),
            });
        }
        if !(duration.is_finite() && duration > 0.0) {
            return Err(CoreError::invalid(format!(
                "content '{}' has invalid duration {duration}",
                q.content_id
            )));
        }

        let entry = aggregated
            .entry(q.content_id.as_str())
            .or_insert((duration, 0));
        if entry.0 != duration {
            return Err(CoreError::invalid(format!(
                "content '{}' has conflicting durations {} and {duration}",
                q.content_id, entry.0
            )));
        }
        entry.1 += 1;
    }

    let total_duration: f64 = aggregated.values().map(|(d, _)| d).sum();

    Ok(aggregated
        .into_iter()
        .map(|(content_id, (duration_hours, question_count))| ContentItem {
            content_id: content_id.to_string(),
            duration_hours,
            question_count,
            weight: content_weight(duration_hours, question_count, total_duration),
        })
        .collect())
}

/// Content id -> weight lookup for the selector.
pub fn weight_map(items: &[ContentItem]) -> HashMap<String, f64> {
    items
        .iter()
        .map(|item| (item.content_id.clone(), item.weight))
        .collect()
}
