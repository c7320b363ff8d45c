//! Session Store
//!
//! The single source of truth for a game session. Every mutation goes
//! through a named action on [`GameState`]; no collaborator reads a field,
//! computes, and writes it back outside an action, which keeps overlapping
//! asynchronous completions from losing updates.

use crate::animation::{self, AnimationEvent, AnimationState};
use crate::dialog::{self, DialogContent, GameEvent};
use crate::transcript::{EntryId, EntryKind, GridUpdate, ImageGrid, TranscriptEntry};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which pane the player is looking at.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    Chat,
    SlotMachine,
    ClapWords,
    FillBlank,
}

impl ActiveView {
    /// The welcome dialog shown when this view becomes active.
    pub fn welcome_event(self) -> GameEvent {
        match self {
            ActiveView::Chat => GameEvent::Welcome,
            ActiveView::SlotMachine => GameEvent::SlotMachineWelcome,
            ActiveView::ClapWords => GameEvent::ClapWordsWelcome,
            ActiveView::FillBlank => GameEvent::FillBlankWelcome,
        }
    }
}

/// Upper bound of the training-progress meter.
pub const MAX_TRAINING_PROGRESS: u32 = 100;

/// The slice of session state that survives a restart.
///
/// Everything else in [`GameState`] is rebuilt from defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub earned_points: u32,
    pub training_progress: u32,
    pub detection_count: u32,
}

/// The singular mutable aggregate behind a game session.
#[derive(Serialize, Debug, Clone)]
pub struct GameState {
    pub transcript: Vec<TranscriptEntry>,
    pub prompt: String,
    pub active_view: ActiveView,
    pub generation_pending: bool,
    pub earned_points: u32,
    pub training_progress: u32,
    pub detection_count: u32,
    pub signal_modal_open: bool,
    pub dialog: DialogContent,
    pub animation: AnimationState,
    #[serde(skip)]
    next_entry_id: EntryId,
}

impl GameState {
    pub fn new() -> Self {
        Self::resume(SessionSnapshot::default())
    }

    /// Builds session state on top of a persisted snapshot; all transient
    /// fields start from their defaults.
    pub fn resume(snapshot: SessionSnapshot) -> Self {
        Self {
            transcript: Vec::new(),
            prompt: String::new(),
            active_view: ActiveView::Chat,
            generation_pending: false,
            earned_points: snapshot.earned_points,
            training_progress: snapshot.training_progress.min(MAX_TRAINING_PROGRESS),
            detection_count: snapshot.detection_count,
            signal_modal_open: false,
            dialog: dialog::dialog_for(GameEvent::Welcome),
            animation: AnimationState::Speaking,
            next_entry_id: 0,
        }
    }

    /// The persistable slice of this state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            earned_points: self.earned_points,
            training_progress: self.training_progress,
            detection_count: self.detection_count,
        }
    }

    fn allocate_entry_id(&mut self) -> EntryId {
        self.next_entry_id += 1;
        self.next_entry_id
    }

    /// Appends a user-prompt entry and returns its id.
    pub fn push_user_prompt(&mut self, text: impl Into<String>) -> EntryId {
        let id = self.allocate_entry_id();
        self.transcript.push(TranscriptEntry {
            id,
            created_at: Utc::now(),
            kind: EntryKind::UserPrompt(text.into()),
        });
        id
    }

    /// Appends a loading grid placeholder and returns its id.
    pub fn push_loading_grid(&mut self) -> EntryId {
        let id = self.allocate_entry_id();
        self.transcript.push(TranscriptEntry {
            id,
            created_at: Utc::now(),
            kind: EntryKind::ImageGrid(ImageGrid {
                is_loading: true,
                ..ImageGrid::default()
            }),
        });
        id
    }

    /// Patches a grid entry in place. Unknown ids are logged and ignored so
    /// a late completion for a removed entry cannot corrupt anything.
    pub fn update_grid(&mut self, id: EntryId, update: GridUpdate) -> bool {
        match self.grid_mut(id) {
            Some(grid) => {
                update.apply(grid);
                true
            }
            None => {
                warn!(entry = id, "ignoring update for unknown grid entry");
                false
            }
        }
    }

    /// Removes an entry; only used when a failed generation retracts its
    /// own placeholder.
    pub fn remove_entry(&mut self, id: EntryId) {
        self.transcript.retain(|entry| entry.id != id);
    }

    pub fn grid(&self, id: EntryId) -> Option<&ImageGrid> {
        self.transcript
            .iter()
            .find(|entry| entry.id == id)
            .and_then(TranscriptEntry::grid)
    }

    fn grid_mut(&mut self, id: EntryId) -> Option<&mut ImageGrid> {
        self.transcript
            .iter_mut()
            .find(|entry| entry.id == id)
            .and_then(TranscriptEntry::grid_mut)
    }

    /// The most recently appended grid entry, if any.
    pub fn latest_grid(&self) -> Option<(EntryId, &ImageGrid)> {
        self.transcript
            .iter()
            .rev()
            .find_map(|entry| entry.grid().map(|grid| (entry.id, grid)))
    }

    /// The user prompt immediately preceding `id` in the transcript.
    pub fn prompt_before(&self, id: EntryId) -> Option<&str> {
        let index = self.transcript.iter().position(|entry| entry.id == id)?;
        self.transcript[..index]
            .last()
            .and_then(TranscriptEntry::user_prompt)
    }

    pub fn set_prompt(&mut self, text: impl Into<String>) {
        self.prompt = text.into();
    }

    /// Clears the draft prompt, returning it.
    pub fn take_prompt(&mut self) -> String {
        std::mem::take(&mut self.prompt)
    }

    /// Copies a prior user prompt back into the draft for editing.
    pub fn recall_prompt(&mut self, id: EntryId) -> bool {
        let text = self
            .transcript
            .iter()
            .find(|entry| entry.id == id)
            .and_then(TranscriptEntry::user_prompt)
            .map(str::to_string);
        match text {
            Some(text) => {
                self.prompt = text;
                true
            }
            None => false,
        }
    }

    /// Plain view setter, used by the generate flow to land on chat without
    /// disturbing the dialog.
    pub fn set_active_view(&mut self, view: ActiveView) {
        self.active_view = view;
    }

    /// Switches the active view and resets the dialog to that view's
    /// welcome. Re-selecting chat while already on chat is a no-op.
    pub fn switch_view(&mut self, view: ActiveView) {
        if view == ActiveView::Chat && self.active_view == ActiveView::Chat {
            return;
        }
        self.active_view = view;
        self.set_dialog(dialog::dialog_for(view.welcome_event()));
    }

    pub fn set_generation_pending(&mut self, pending: bool) {
        self.generation_pending = pending;
    }

    /// Replaces the dialog content, routing the animation through the
    /// `DialogSet` rule so protected states are preserved.
    pub fn set_dialog(&mut self, content: DialogContent) {
        self.dialog = content;
        self.apply_animation(AnimationEvent::DialogSet);
    }

    /// Feeds a request-lifecycle or reveal event into the animation state
    /// machine.
    pub fn apply_animation(&mut self, event: AnimationEvent) {
        self.animation = animation::transition(self.animation, event);
    }

    pub fn add_points(&mut self, points: u32) {
        self.earned_points += points;
    }

    /// Adds to the training-progress meter through the clamp.
    pub fn add_progress(&mut self, increment: u32) {
        self.training_progress = (self.training_progress + increment).min(MAX_TRAINING_PROGRESS);
    }

    /// Bumps the detection counter and returns the new value so callers can
    /// capture it at resolution time.
    pub fn increment_detection_count(&mut self) -> u32 {
        self.detection_count += 1;
        self.detection_count
    }

    pub fn reset_detection_count(&mut self) {
        self.detection_count = 0;
    }

    pub fn open_signal_modal(&mut self) {
        self.signal_modal_open = true;
    }

    pub fn clear_signal_modal(&mut self) {
        self.signal_modal_open = false;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogBody;

    #[test]
    fn new_state_starts_on_chat_with_the_welcome_dialog() {
        let state = GameState::new();
        assert!(state.transcript.is_empty());
        assert_eq!(state.active_view, ActiveView::Chat);
        assert_eq!(state.dialog, dialog::dialog_for(GameEvent::Welcome));
        assert_eq!(state.animation, AnimationState::Speaking);
        assert!(!state.generation_pending);
        assert!(!state.signal_modal_open);
    }

    #[test]
    fn resume_restores_only_the_persisted_counters() {
        let state = GameState::resume(SessionSnapshot {
            earned_points: 42,
            training_progress: 130,
            detection_count: 3,
        });
        assert_eq!(state.earned_points, 42);
        // A tampered snapshot cannot push the meter past its bound.
        assert_eq!(state.training_progress, MAX_TRAINING_PROGRESS);
        assert_eq!(state.detection_count, 3);
        assert!(state.transcript.is_empty());
    }

    #[test]
    fn entry_ids_are_unique_and_insertion_ordered() {
        let mut state = GameState::new();
        let first = state.push_user_prompt("a flying cow");
        let second = state.push_loading_grid();
        let third = state.push_user_prompt("another");
        assert!(first < second && second < third);
        assert_eq!(state.transcript.len(), 3);
    }

    #[test]
    fn update_grid_rejects_unknown_ids() {
        let mut state = GameState::new();
        assert!(!state.update_grid(99, GridUpdate::default()));
    }

    #[test]
    fn prompt_before_finds_the_immediately_preceding_user_entry() {
        let mut state = GameState::new();
        state.push_user_prompt("a flying cow");
        let grid = state.push_loading_grid();
        assert_eq!(state.prompt_before(grid), Some("a flying cow"));

        // A grid with no user entry directly before it has no prompt.
        let orphan = state.push_loading_grid();
        assert_eq!(state.prompt_before(orphan), None);
    }

    #[test]
    fn recall_prompt_copies_user_entries_only() {
        let mut state = GameState::new();
        let prompt = state.push_user_prompt("a flying cow");
        let grid = state.push_loading_grid();

        assert!(state.recall_prompt(prompt));
        assert_eq!(state.prompt, "a flying cow");
        assert!(!state.recall_prompt(grid));
        assert_eq!(state.prompt, "a flying cow");
    }

    #[test]
    fn progress_is_clamped_at_the_top() {
        let mut state = GameState::new();
        for _ in 0..15 {
            state.add_progress(10);
        }
        assert_eq!(state.training_progress, MAX_TRAINING_PROGRESS);
    }

    #[test]
    fn detection_counter_round_trip() {
        let mut state = GameState::new();
        assert_eq!(state.increment_detection_count(), 1);
        assert_eq!(state.increment_detection_count(), 2);
        state.reset_detection_count();
        assert_eq!(state.detection_count, 0);
    }

    #[test]
    fn switching_views_resets_the_dialog_to_the_view_welcome() {
        let mut state = GameState::new();
        state.switch_view(ActiveView::SlotMachine);
        assert_eq!(state.active_view, ActiveView::SlotMachine);
        assert_eq!(
            state.dialog,
            dialog::dialog_for(GameEvent::SlotMachineWelcome)
        );
        assert_eq!(state.animation, AnimationState::Speaking);
    }

    #[test]
    fn switching_chat_to_chat_is_idempotent() {
        let mut state = GameState::new();
        state.set_dialog(dialog::dialog_for(GameEvent::Completed));
        state.switch_view(ActiveView::Chat);
        assert_eq!(state.dialog, dialog::dialog_for(GameEvent::Completed));
    }

    #[test]
    fn set_dialog_respects_animation_protection() {
        let mut state = GameState::new();
        state.apply_animation(AnimationEvent::DetectionStarted);
        state.set_dialog(dialog::dialog_for(GameEvent::Error));
        // Scanning is protected against plain dialog changes.
        assert_eq!(state.animation, AnimationState::Scanning);
        assert_eq!(state.dialog, dialog::dialog_for(GameEvent::Error));
    }

    #[test]
    fn snapshot_round_trips_through_resume() {
        let mut state = GameState::new();
        state.add_points(7);
        state.add_progress(5);
        state.increment_detection_count();
        let snapshot = state.snapshot();

        let restored = GameState::resume(snapshot);
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn state_serializes_for_broadcast() {
        let mut state = GameState::new();
        state.push_user_prompt("a flying cow");
        let raw = serde_json::to_string(&state).expect("serializable state");
        assert!(raw.contains("a flying cow"));
        match &state.dialog.expanded {
            DialogBody::Text(text) => assert!(raw.contains(&text[..10])),
            DialogBody::DetectionResult(_) => panic!("welcome dialog is plain text"),
        }
    }
}
