use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DIFFICULTY_SPLIT, DIFFICULTY_LEVELS, PREFERRED_LEVEL_SHARE};
use crate::error::{CoreError, Result};
use crate::question::is_valid_difficulty;

/// Advisory question counts per difficulty level for one session.
///
/// Each target is rounded independently, so the sum may miss `max_questions`
/// by a question or two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyTargets {
    counts: [usize; 5],
}

impl DifficultyTargets {
    /// Target count for `level` (1..=5); zero for anything else.
    pub fn for_level(&self, level: u8) -> usize {
        level_index(level).map_or(0, |i| self.counts[i])
    }

    pub fn counts(&self) -> [usize; 5] {
        self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

pub(crate) fn level_index(level: u8) -> Option<usize> {
    DIFFICULTY_LEVELS.iter().position(|&l| l == level)
}

fn share(max_questions: usize, fraction: f64) -> usize {
    (max_questions as f64 * fraction).round() as usize
}

/// Compute per-level targets: the default 10/20/40/20/10 split, or half the
/// session on `preference` with the rest spread evenly over the other levels.
pub fn compute_targets(max_questions: usize, preference: Option<u8>) -> Result<DifficultyTargets> {
    if max_questions == 0 {
        return Err(CoreError::invalid("max_questions must be positive"));
    }

    let counts = match preference {
        None => DEFAULT_DIFFICULTY_SPLIT.map(|fraction| share(max_questions, fraction)),
        Some(level) if is_valid_difficulty(level) => {
            let others = (1.0 - PREFERRED_LEVEL_SHARE) / (DIFFICULTY_LEVELS.len() - 1) as f64;
            DIFFICULTY_LEVELS.map(|l| {
                if l == level {
                    share(max_questions, PREFERRED_LEVEL_SHARE)
                } else {
                    share(max_questions, others)
                }
            })
        }
        Some(level) => {
            return Err(CoreError::invalid(format!(
                "difficulty preference {level} out of range 1..=5"
            )));
        }
    };

    Ok(DifficultyTargets { counts })
}
