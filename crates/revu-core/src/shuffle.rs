//! Presentation shuffle for a finished selection.
//!
//! The shuffle is unconstrained: anti-clustering holds for the order handed
//! in here, not for the order handed back.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::question::Question;

/// Uniform Fisher-Yates shuffle driven by the caller's RNG.
pub fn shuffle_session(mut items: Vec<Question>, rng: &mut impl Rng) -> Vec<Question> {
    items.shuffle(rng);
    items
}
