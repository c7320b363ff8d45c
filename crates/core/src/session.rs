//! Game Session Orchestrator
//!
//! Sequences prompt submission, the remote generate/detect calls, scoring,
//! avatar animation and dialog updates against the session store, while
//! tolerating overlapping asynchronous completions. Every mutation batch
//! runs synchronously under the state lock and the lock is never held
//! across a network await, so interleaved completions can only observe
//! whole actions.

use crate::animation::AnimationEvent;
use crate::backend::GameBackend;
use crate::dialog::{self, GameEvent};
use crate::engagement;
use crate::scoring::{self, MAX_POINTS_PER_PROMPT, MAX_PROGRESS_INCREMENT};
use crate::store::{ActiveView, GameState, SessionSnapshot};
use crate::transcript::{EntryId, GridUpdate};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// What a completed detection hands to the presentation layer.
///
/// The detection counter is captured here, at response time, so the
/// deferred finalize step never re-reads the live counter and cannot race
/// a concurrent modal-dismiss reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionOutcome {
    pub score: f64,
    pub points: u32,
    pub detection_count: u32,
}

/// One game session: the state store plus the coordination logic that
/// drives it from UI events and network completions.
pub struct GameSession {
    id: Uuid,
    state: Arc<Mutex<GameState>>,
    backend: Arc<dyn GameBackend>,
    state_tx: Option<mpsc::Sender<GameState>>,
}

impl GameSession {
    pub fn new(backend: Arc<dyn GameBackend>, state_tx: Option<mpsc::Sender<GameState>>) -> Self {
        Self::resume(backend, SessionSnapshot::default(), state_tx)
    }

    /// Builds a session on top of a previously persisted snapshot.
    pub fn resume(
        backend: Arc<dyn GameBackend>,
        snapshot: SessionSnapshot,
        state_tx: Option<mpsc::Sender<GameState>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: Arc::new(Mutex::new(GameState::resume(snapshot))),
            backend,
            state_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Clone-out accessor for the presentation layer.
    pub async fn state(&self) -> GameState {
        self.state.lock().await.clone()
    }

    /// Runs one synchronous mutation batch under the lock, then broadcasts
    /// the resulting state to any subscribed presentation layer.
    async fn mutate<R>(&self, action: impl FnOnce(&mut GameState) -> R) -> R {
        let (result, published) = {
            let mut state = self.state.lock().await;
            let result = action(&mut state);
            (result, state.clone())
        };
        if let Some(tx) = &self.state_tx {
            if tx.send(published).await.is_err() {
                warn!("state receiver dropped, skipping broadcast");
            }
        }
        result
    }

    pub async fn set_prompt(&self, text: impl Into<String>) {
        let text = text.into();
        self.mutate(|state| state.set_prompt(text)).await;
    }

    /// Copies a prior user prompt back into the draft for editing.
    pub async fn recall_prompt(&self, entry_id: EntryId) -> bool {
        self.mutate(|state| state.recall_prompt(entry_id)).await
    }

    pub async fn switch_view(&self, view: ActiveView) {
        self.mutate(|state| state.switch_view(view)).await;
    }

    /// The presentation layer's signal that the expanded dialog text has
    /// finished revealing. Arrives exactly once per dialog-content change.
    pub async fn text_reveal_finished(&self) {
        self.mutate(|state| state.apply_animation(AnimationEvent::RevealFinished))
            .await;
    }

    /// Dismisses the engagement prompt: consumes the one-shot signal and
    /// resets the detection counter.
    pub async fn dismiss_signal_modal(&self) {
        self.mutate(|state| {
            state.clear_signal_modal();
            state.reset_detection_count();
        })
        .await;
    }

    /// Runs the full generation flow for the current draft prompt.
    ///
    /// No-ops while a generation is already in flight or when the draft is
    /// blank. A failed request retracts its own placeholder and surfaces
    /// the error dialog; the session stays interactive either way.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn submit_prompt(&self) {
        let started = self
            .mutate(|state| {
                if state.generation_pending || state.prompt.trim().is_empty() {
                    return None;
                }
                state.set_generation_pending(true);
                state.apply_animation(AnimationEvent::GenerationStarted);
                if state.active_view != ActiveView::Chat {
                    state.set_active_view(ActiveView::Chat);
                }
                state.set_dialog(dialog::dialog_for(GameEvent::Loading));
                let prompt = state.take_prompt();
                state.push_user_prompt(prompt.clone());
                let placeholder_id = state.push_loading_grid();
                Some((prompt, placeholder_id))
            })
            .await;
        let Some((prompt, placeholder_id)) = started else {
            info!("generation pending or draft empty, ignoring submit");
            return;
        };

        info!(%prompt, "requesting image generation");
        let result = self.backend.generate(&prompt).await;

        self.mutate(|state| {
            match result {
                Ok(batch) => {
                    let images: Vec<String> = batch
                        .images
                        .into_iter()
                        .map(|image| format!("data:image/png;base64,{}", image.image_base64))
                        .collect();
                    info!(images = images.len(), "image generation succeeded");
                    state.update_grid(
                        placeholder_id,
                        GridUpdate {
                            images: Some(images),
                            is_loading: Some(false),
                            ..GridUpdate::default()
                        },
                    );
                    state.apply_animation(AnimationEvent::GenerationSettled);
                    state.set_dialog(dialog::dialog_for(GameEvent::Completed));
                }
                Err(err) => {
                    warn!(error = %err, "image generation failed");
                    state.remove_entry(placeholder_id);
                    state.apply_animation(AnimationEvent::GenerationSettled);
                    state.set_dialog(dialog::dialog_for(GameEvent::Error));
                }
            }
            state.set_generation_pending(false);
        })
        .await;
    }

    /// Runs the detection flow for one picked image of a grid entry.
    ///
    /// Returns the outcome the presentation layer must feed back into
    /// [`GameSession::finalize_score`] once the result dialog has finished
    /// revealing, or `None` when the selection was invalid or the request
    /// failed.
    #[instrument(skip(self), fields(session_id = %self.id, entry = entry_id))]
    pub async fn select_image(&self, entry_id: EntryId, index: usize) -> Option<DetectionOutcome> {
        let started = self
            .mutate(|state| {
                let Some(grid) = state.grid(entry_id) else {
                    warn!("image selected on unknown transcript entry");
                    return None;
                };
                if grid.is_detecting {
                    info!("detection already in flight for this entry, ignoring");
                    return None;
                }
                let Some(image) = grid.images.get(index).cloned() else {
                    warn!(index, "selected image index out of bounds");
                    return None;
                };
                let prompt = state
                    .prompt_before(entry_id)
                    .map(str::to_string)
                    .unwrap_or_else(|| {
                        warn!("no user prompt precedes the selected grid, detecting with an empty prompt");
                        String::new()
                    });
                state.update_grid(
                    entry_id,
                    GridUpdate {
                        selected_index: Some(index),
                        is_detecting: Some(true),
                        ..GridUpdate::default()
                    },
                );
                state.set_dialog(dialog::dialog_for(GameEvent::ImageSelected));
                state.apply_animation(AnimationEvent::DetectionStarted);
                Some((prompt, image))
            })
            .await;
        let (prompt, image) = started?;

        info!("requesting detection for selected image");
        let result = self.backend.detect(&prompt, &image).await;

        self.mutate(|state| match result {
            Ok(detection) => {
                let points = scoring::points_for_score(detection.score, MAX_POINTS_PER_PROMPT);
                info!(score = detection.score, points, "detection succeeded");
                state.apply_animation(AnimationEvent::DetectionSettled(Some(detection.score)));
                state.update_grid(
                    entry_id,
                    GridUpdate {
                        is_detecting: Some(false),
                        detected_image: Some(detection.image_base64),
                        last_accuracy: Some(detection.score),
                        last_points: Some(points),
                        ..GridUpdate::default()
                    },
                );
                let detection_count = state.increment_detection_count();
                state.set_dialog(dialog::detection_result_dialog(detection.score, points));
                Some(DetectionOutcome {
                    score: detection.score,
                    points,
                    detection_count,
                })
            }
            Err(err) => {
                warn!(error = %err, "detection failed");
                state.update_grid(
                    entry_id,
                    GridUpdate {
                        is_detecting: Some(false),
                        ..GridUpdate::default()
                    },
                );
                state.apply_animation(AnimationEvent::DetectionSettled(None));
                state.set_dialog(dialog::dialog_for(GameEvent::Error));
                None
            }
        })
        .await
    }

    /// Applies the deferred score/progress update once the presentation
    /// layer has finished revealing a detection-result dialog, and raises
    /// the one-shot engagement signal when the captured counter crossed
    /// the threshold.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn finalize_score(&self, outcome: DetectionOutcome) {
        self.mutate(|state| {
            state.add_points(outcome.points);
            state.add_progress(scoring::progress_increment(
                outcome.score,
                MAX_PROGRESS_INCREMENT,
            ));
            if engagement::should_signal(outcome.detection_count) {
                state.open_signal_modal();
            }
        })
        .await;
    }
}
