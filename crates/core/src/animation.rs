//! Avatar Animation State Machine
//!
//! Finite states for the on-screen co-pilot, driven by request-lifecycle
//! events from the orchestrator and by the presentation layer's text-reveal
//! completion signal. Transitions live in a pure function so the protection
//! invariants are testable in isolation: an in-flight request's visual
//! state and a freshly computed emotional reaction must not be clobbered by
//! dialog changes that have nothing to do with them (switching a minigame
//! view, for example).

use serde::{Deserialize, Serialize};

/// What the avatar is currently doing. Exactly one state is active.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    Idle,
    Waiting,
    Scanning,
    Speaking,
    Laughing,
    Sad,
}

/// Events that can move the avatar between states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationEvent {
    /// A generation request was issued.
    GenerationStarted,
    /// A detection request was issued.
    DetectionStarted,
    /// The in-flight generation resolved, successfully or not.
    GenerationSettled,
    /// The in-flight detection resolved; `Some` carries the detector score.
    DetectionSettled(Option<f64>),
    /// Dialog content changed for a reason outside any request lifecycle.
    DialogSet,
    /// The presentation layer finished revealing the expanded dialog text.
    RevealFinished,
}

/// Computes the next animation state.
///
/// Request-lifecycle events claim the state unconditionally. A plain
/// `DialogSet` yields `Speaking` unless the current state is protected:
/// `Waiting`/`Scanning` stay until their request settles, and
/// `Laughing`/`Sad` stay until the next explicit event retires them.
pub fn transition(state: AnimationState, event: AnimationEvent) -> AnimationState {
    use AnimationState::*;

    match event {
        AnimationEvent::GenerationStarted => Waiting,
        AnimationEvent::DetectionStarted => Scanning,
        AnimationEvent::GenerationSettled => Speaking,
        AnimationEvent::DetectionSettled(Some(score)) if (0.0..50.0).contains(&score) => Laughing,
        AnimationEvent::DetectionSettled(Some(score)) if (50.0..=100.0).contains(&score) => Sad,
        AnimationEvent::DetectionSettled(_) => Speaking,
        AnimationEvent::RevealFinished => Idle,
        AnimationEvent::DialogSet => match state {
            Waiting | Scanning | Laughing | Sad => state,
            Idle | Speaking => Speaking,
        },
    }
}
