/// Lower bound for the SM-2 ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor of a question that has never been reviewed.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Highest answer quality on the SM-2 scale (0..=5).
pub const MAX_QUALITY: u8 = 5;

/// Interval after the first successful repetition (days).
pub const FIRST_INTERVAL_DAYS: u32 = 1;

/// Interval after the second repetition (days).
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Difficulty levels in iteration order, easiest first.
pub const DIFFICULTY_LEVELS: [u8; 5] = [1, 2, 3, 4, 5];

/// Default share of a session per difficulty level, aligned with `DIFFICULTY_LEVELS`.
pub const DEFAULT_DIFFICULTY_SPLIT: [f64; 5] = [0.10, 0.20, 0.40, 0.20, 0.10];

/// Share of a session given to the preferred difficulty level.
pub const PREFERRED_LEVEL_SHARE: f64 = 0.5;

/// Questions per hour at which the density bonus saturates.
pub const DENSITY_SATURATION: f64 = 15.0;

/// Maximum multiplicative boost from question density.
pub const DENSITY_BONUS_WEIGHT: f64 = 0.3;

/// Longest allowed run of consecutive questions from one content item.
pub const MAX_CONTENT_RUN: usize = 2;

/// Selections at or below this length are never reordered.
pub const ANTI_CLUSTER_MIN_LEN: usize = 3;

pub const SECONDS_PER_DAY: u64 = 86_400;
