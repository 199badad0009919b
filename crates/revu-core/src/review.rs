//! SM-2 review scheduling: how one answer moves a question's next due date.
//!
//! The update is a pure function of the prior state and the answer quality
//! (0 = blackout, 5 = perfect recall). A low quality lowers the ease factor
//! but still counts as a repetition; there is no lapse reset.

use serde::{Deserialize, Serialize};

use crate::constants::{
    FIRST_INTERVAL_DAYS, INITIAL_EASE_FACTOR, MAX_QUALITY, MIN_EASE_FACTOR, SECOND_INTERVAL_DAYS,
};
use crate::error::{CoreError, Result};
use crate::time::due_at;

/// Per-user, per-question spaced-repetition state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub repetitions: u32,
    pub ease_factor: f64,
    /// Days until the next review.
    pub interval: u32,
    #[serde(default)]
    pub last_quality: Option<u8>,
}

impl ReviewState {
    /// State of a question that has never been reviewed.
    pub fn fresh() -> Self {
        Self {
            repetitions: 0,
            ease_factor: INITIAL_EASE_FACTOR,
            interval: 0,
            last_quality: None,
        }
    }
}

impl Default for ReviewState {
    fn default() -> Self {
        Self::fresh()
    }
}

/// Binary answer from the session UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    GotIt,
    Revisit,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GotIt => "got_it",
            Self::Revisit => "revisit",
        }
    }
}

/// Mapping from binary feedback to an SM-2 quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackPolicy {
    pub got_it_quality: u8,
    pub revisit_quality: u8,
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self {
            got_it_quality: 4,
            revisit_quality: 2,
        }
    }
}

impl FeedbackPolicy {
    pub fn validate(&self) -> Result<()> {
        validate_quality(self.got_it_quality)?;
        validate_quality(self.revisit_quality)
    }

    pub fn quality_for(&self, feedback: Feedback) -> u8 {
        match feedback {
            Feedback::GotIt => self.got_it_quality,
            Feedback::Revisit => self.revisit_quality,
        }
    }
}

/// What the learner answered: either binary feedback or an explicit quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Answer {
    Feedback(Feedback),
    Quality(u8),
}

impl Answer {
    pub fn quality(&self, policy: &FeedbackPolicy) -> u8 {
        match self {
            Answer::Feedback(f) => policy.quality_for(*f),
            Answer::Quality(q) => *q,
        }
    }
}

/// One answer event forwarded by the session runner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub content_id: String,
    pub question_id: String,
    pub answer: Answer,
    #[serde(default)]
    pub response_time_seconds: Option<f64>,
}

/// Updated state plus the timestamps the review-state store persists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReview {
    pub state: ReviewState,
    pub quality: u8,
    pub reviewed_at: u64,
    pub next_review_due_at: u64,
}

fn validate_quality(quality: u8) -> Result<()> {
    if quality > MAX_QUALITY {
        return Err(CoreError::invalid(format!(
            "quality {quality} out of range 0..=5"
        )));
    }
    Ok(())
}

/// Ease factor after an answer of `quality`, floored at 1.3.
pub fn next_ease_factor(ease_factor: f64, quality: u8) -> Result<f64> {
    validate_quality(quality)?;
    let miss = f64::from(MAX_QUALITY - quality);
    Ok((ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR))
}

/// Apply one SM-2 step.
///
/// Intervals past the second repetition are `round(interval * ease')` with
/// `f64::round`, i.e. halves round away from zero.
pub fn update(state: &ReviewState, quality: u8) -> Result<ReviewState> {
    if !state.ease_factor.is_finite() {
        return Err(CoreError::invalid("ease factor is not finite"));
    }

    let ease_factor = next_ease_factor(state.ease_factor, quality)?;
    let interval = match state.repetitions {
        0 => FIRST_INTERVAL_DAYS,
        1 => SECOND_INTERVAL_DAYS,
        _ => (f64::from(state.interval) * ease_factor).round() as u32,
    };

    Ok(ReviewState {
        repetitions: state.repetitions.saturating_add(1),
        ease_factor,
        interval,
        last_quality: Some(quality),
    })
}

/// Resolve an answer event against `state` and compute the next due time.
pub fn schedule(
    state: &ReviewState,
    event: &FeedbackEvent,
    policy: &FeedbackPolicy,
    now: u64,
) -> Result<ScheduledReview> {
    if let Some(rt) = event.response_time_seconds
        && !(rt.is_finite() && rt >= 0.0)
    {
        return Err(CoreError::invalid(format!(
            "response time {rt} must be a non-negative number of seconds"
        )));
    }

    let quality = event.answer.quality(policy);
    let next = update(state, quality)?;
    let next_review_due_at = due_at(now, next.interval);

    tracing::debug!(
        question = %event.question_id,
        quality,
        interval = next.interval,
        ease = next.ease_factor,
        "scheduled review"
    );

    Ok(ScheduledReview {
        state: next,
        quality,
        reviewed_at: now,
        next_review_due_at,
    })
}
