//! Dialog Sequencer
//!
//! Maps named game events to the (brief, expanded) dialog pair shown next
//! to the avatar, and builds the structured detection-result dialog from a
//! score and the points it earned. The detection-result body is a distinct
//! variant because the presentation layer renders it differently and wires
//! the score-finalize callback to its reveal.

use serde::{Deserialize, Serialize};

/// The fixed catalog of events the sequencer knows how to narrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Welcome,
    Loading,
    Completed,
    ImageSelected,
    SlotMachineWelcome,
    ClapWordsWelcome,
    FillBlankWelcome,
    Error,
}

/// Structured payload for a detection-result dialog.
///
/// Carries the same brief message the sequencer chose, the full expanded
/// message, and the raw score/points pair the presentation layer needs for
/// the deferred finalize step.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DetectionSummary {
    pub brief: String,
    pub expanded: String,
    pub score: f64,
    pub points: u32,
}

/// The expanded half of a dialog: plain text, or a detection result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum DialogBody {
    Text(String),
    DetectionResult(DetectionSummary),
}

/// A (brief, expanded) dialog pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DialogContent {
    pub brief: String,
    pub expanded: DialogBody,
}

impl DialogContent {
    fn text(brief: &str, expanded: &str) -> Self {
        Self {
            brief: brief.to_string(),
            expanded: DialogBody::Text(expanded.to_string()),
        }
    }

    /// The detection summary, when this dialog carries one.
    pub fn detection_summary(&self) -> Option<&DetectionSummary> {
        match &self.expanded {
            DialogBody::DetectionResult(summary) => Some(summary),
            DialogBody::Text(_) => None,
        }
    }
}

/// Resolves a catalog event to its dialog pair.
pub fn dialog_for(event: GameEvent) -> DialogContent {
    match event {
        GameEvent::Welcome => DialogContent::text(
            "Hellooo! Got a weird idea?\nHit me with your wildest prompt!",
            "Hellooo! Got a weird idea?\nHit me with your wildest prompt!\n\nNeed ideas? Just click one of those chips in the textfield – they're mini-games to spark your genius!",
        ),
        GameEvent::Loading => DialogContent::text(
            "Thanks for your prompt — you're helping make the roads a little safer, one idea at a time.\nJust a sec while we cook up some weirdness...",
            "Thanks for your prompt — you're helping make the roads a little safer, one idea at a time.\nJust a sec while we cook up some weirdness...",
        ),
        GameEvent::Completed => DialogContent::text(
            "Nice!\n\nPick the image that best matches your prompt — or regenerate if you want something different.",
            "Nice!\n\nPick the image that best matches your prompt — or regenerate if you want something different.",
        ),
        GameEvent::ImageSelected => DialogContent::text(
            "Interesting choice!",
            "Sending it to the other model... though I wouldn't get my hopes up. I'm still the sharpest mind in the room.",
        ),
        GameEvent::SlotMachineWelcome => DialogContent::text(
            "Welcome to Slot Machine!",
            "Welcome to Slot Machine!\n\nJust hit Spin and let the crazy prompts roll, or click a word to add it!",
        ),
        GameEvent::ClapWordsWelcome => DialogContent::text(
            "Welcome to clap words!",
            "Welcome to clap words!\n\nClick on the words, and watch the weird prompts come to life!",
        ),
        GameEvent::FillBlankWelcome => DialogContent::text(
            "Welcome to fill in the blank!",
            "Welcome to fill in the blank!\n\nTime to get creative – just fill in the blanks and watch the madness unfold!",
        ),
        GameEvent::Error => DialogContent::text(
            "Hmm, something didn't work right.\nWant to try again with a different prompt?",
            "Hmm, something didn't work right.\nWant to try again with a different prompt?\n\nSometimes being a bit more specific helps!",
        ),
    }
}

/// Picks the avatar's reaction line for a detector score.
///
/// Buckets are half-open in the same places the reaction table defines
/// them; anything outside 0-100 falls through to the neutral line.
fn score_message(score: f64) -> &'static str {
    if (0.0..=25.0).contains(&score) {
        "I genuinely have no idea what that was. Glorious."
    } else if score > 25.0 && score <= 40.0 {
        "Not bad. Not bad at all. I almost choked on that one."
    } else if score > 40.0 && score < 55.0 {
        "Nice try — parts of your prompt were tricky, I'll give you that."
    } else if (55.0..=70.0).contains(&score) {
        "I expected a little more chaos from you by now"
    } else if score > 70.0 && score <= 85.0 {
        "Really? You can do better."
    } else if score > 85.0 && score <= 100.0 {
        "Let me know when you're ready to play for real."
    } else {
        "The analysis is complete."
    }
}

/// Builds the dialog for a completed detection.
///
/// Deterministic: identical inputs always yield structurally identical
/// output, which the replay-driven presentation layer relies on.
pub fn detection_result_dialog(score: f64, points: u32) -> DialogContent {
    let brief = score_message(score);
    DialogContent {
        brief: brief.to_string(),
        expanded: DialogBody::DetectionResult(DetectionSummary {
            brief: brief.to_string(),
            expanded: format!(
                "{brief}\n\nAI analysis score: {score}. You've received {points} points."
            ),
            score,
            points,
        }),
    }
}
