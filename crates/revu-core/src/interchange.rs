//! JSON interchange with the content store and the session runner.
//!
//! Candidates arrive either as a bare array of questions or wrapped as
//! `{"questions": [...]}`; plans leave as camelCase JSON.

use serde::Deserialize;

use crate::allocator::AllocationResult;
use crate::error::{CoreError, Result};
use crate::question::{Question, validate_pool};

#[derive(Deserialize)]
struct WrappedCandidates {
    questions: Vec<Question>,
}

/// Parse and validate a candidate pool.
///
/// A top-level object is read as the wrapped form; anything else as a bare
/// array, so field-level errors keep their own message and position.
pub fn parse_candidates(json: &str) -> Result<Vec<Question>> {
    let parsed = if json.trim_start().starts_with('{') {
        serde_json::from_str::<WrappedCandidates>(json).map(|w| w.questions)
    } else {
        serde_json::from_str::<Vec<Question>>(json)
    };
    let pool = parsed.map_err(|e| CoreError::invalid(format!("malformed candidate file: {e}")))?;
    validate_pool(&pool)?;
    Ok(pool)
}

pub fn export_plan(plan: &AllocationResult) -> Result<String> {
    serde_json::to_string_pretty(plan)
        .map_err(|e| CoreError::invalid(format!("failed to serialize plan: {e}")))
}
