//! Adaptive review scheduling and session allocation engine.
//!
//! Two independent pieces:
//! - an SM-2 updater turning one answer into the question's next review state,
//! - a session allocator choosing which candidate questions fill a timed review
//!   session, balancing difficulty mix and content weighting, then breaking up
//!   same-source runs and shuffling for presentation.
//!
//! Zero I/O: randomness is injected and persistence belongs to the caller.

pub mod allocator;
pub mod cluster;
pub mod constants;
pub mod difficulty;
pub mod error;
pub mod interchange;
pub mod question;
pub mod review;
pub mod selector;
pub mod shuffle;
pub mod time;
pub mod weight;

pub use allocator::{AllocationOptions, AllocationResult, allocate, arrange};
pub use cluster::{anti_cluster, longest_run};
pub use constants::{DIFFICULTY_LEVELS, INITIAL_EASE_FACTOR, MIN_EASE_FACTOR};
pub use difficulty::{DifficultyTargets, compute_targets};
pub use error::{CoreError, Result};
pub use interchange::{export_plan, parse_candidates};
pub use question::{Question, validate_pool};
pub use review::{
    Answer, Feedback, FeedbackEvent, FeedbackPolicy, ReviewState, ScheduledReview, schedule,
    update,
};
pub use selector::{Budget, Strategy, select_balanced, select_weighted};
pub use shuffle::shuffle_session;
pub use time::{days_until, due_at, now_unix_secs, unix_to_iso8601};
pub use weight::{ContentItem, content_items, content_weight};
