//! Scoring Engine
//!
//! Pure functions mapping a detector score to the points a prompt earns and
//! to the increment added to the training-progress meter. The two curves
//! deliberately pull in opposite directions: points reward fooling the
//! detector (lower score, more points), while training progress reflects
//! how much signal the model received regardless of being fooled (higher
//! score, more progress).

use tracing::warn;

/// Maximum points a single prompt can earn.
pub const MAX_POINTS_PER_PROMPT: u32 = 10;

/// Maximum training-progress increment a single detection can contribute.
pub const MAX_PROGRESS_INCREMENT: u32 = 10;

/// Clamps a detector score into the 0-100 range the detector contract
/// promises. Out-of-range input is a data-quality condition, not an error.
fn clamp_score(score: f64) -> f64 {
    if (0.0..=100.0).contains(&score) {
        score
    } else {
        warn!(score, "detector score out of bounds, clamping");
        score.clamp(0.0, 100.0)
    }
}

/// Points the player earns for a detection with the given score.
///
/// Linear and non-increasing in `score`: a detector that was completely
/// fooled (score 0) awards `max_points`, a perfect match awards 0.
pub fn points_for_score(score: f64, max_points: u32) -> u32 {
    let score = clamp_score(score);
    (f64::from(max_points) * (1.0 - score / 100.0)).round() as u32
}

/// Training-progress increment for a detection with the given score.
///
/// Square-root scaled so progress grows quickly at low scores and flattens
/// toward `max_increment` as the detector gets more confident.
pub fn progress_increment(score: f64, max_increment: u32) -> u32 {
    let score = clamp_score(score);
    (f64::from(max_increment) * (score / 100.0).sqrt()).round() as u32
}
