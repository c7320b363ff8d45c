//! Interactive Terminal App
//!
//! The presentation layer for a game session: reads player input, renders
//! dialog and transcript state, and feeds the reveal-finished, finalize and
//! modal-dismiss signals back into the orchestrator the same way a
//! graphical front end would. Rendering is plain line output; game state
//! never lives here.

use crate::snapshot::SnapshotStore;
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use traffic_core::backend::GameBackend;
use traffic_core::dialog::DialogBody;
use traffic_core::session::{DetectionOutcome, GameSession};
use traffic_core::store::ActiveView;
use tracing::info;

/// One parsed line of player input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Quit,
    Help,
    Score,
    View(ActiveView),
    /// 1-based image pick from the most recent grid.
    Pick(usize),
    Prompt(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Prompt(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    match parts.next() {
        Some("quit") => Command::Quit,
        Some("score") => Command::Score,
        Some("view") => match parts.next() {
            Some("chat") => Command::View(ActiveView::Chat),
            Some("slot") => Command::View(ActiveView::SlotMachine),
            Some("clap") => Command::View(ActiveView::ClapWords),
            Some("fill") => Command::View(ActiveView::FillBlank),
            _ => Command::Help,
        },
        Some("pick") => match parts.next().and_then(|n| n.parse().ok()) {
            Some(index) if index >= 1 => Command::Pick(index),
            _ => Command::Help,
        },
        _ => Command::Help,
    }
}

/// The terminal front end around one [`GameSession`].
pub struct App {
    session: GameSession,
    snapshots: SnapshotStore,
}

impl App {
    /// Builds the app, resuming any persisted meters from a prior run.
    pub fn new(backend: Arc<dyn GameBackend>, snapshots: SnapshotStore) -> Self {
        let snapshot = snapshots.load().unwrap_or_default();
        info!(?snapshot, "starting game session");
        Self {
            session: GameSession::resume(backend, snapshot, None),
            snapshots,
        }
    }

    /// Runs the input loop until the player quits or stdin closes.
    pub async fn run(&self) -> Result<()> {
        self.render_dialog(None).await?;
        print_help();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        show_input_marker()?;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                show_input_marker()?;
                continue;
            }
            match parse_command(&line) {
                Command::Quit => {
                    // An explicit quit ends the session, so the persisted
                    // meters go with it; closing the terminal keeps them.
                    self.snapshots.clear()?;
                    println!("Session ended. See you on the weird roads!");
                    return Ok(());
                }
                Command::Help => print_help(),
                Command::Score => self.show_meters().await,
                Command::View(view) => {
                    self.session.switch_view(view).await;
                    self.render_dialog(None).await?;
                }
                Command::Pick(index) => self.pick_image(index).await?,
                Command::Prompt(text) => self.submit_prompt(text).await?,
            }
            show_input_marker()?;
        }

        self.persist().await?;
        Ok(())
    }

    async fn submit_prompt(&self, text: String) -> Result<()> {
        self.session.set_prompt(text).await;
        self.session.submit_prompt().await;

        let state = self.session.state().await;
        if let Some((_, grid)) = state.latest_grid() {
            if !grid.is_loading && !grid.images.is_empty() {
                println!(
                    "Generated {} image(s). Pick one with /pick 1..{}",
                    grid.images.len(),
                    grid.images.len()
                );
            }
        }
        self.render_dialog(None).await
    }

    async fn pick_image(&self, index: usize) -> Result<()> {
        let latest = self.session.state().await.latest_grid().map(|(id, _)| id);
        let Some(entry_id) = latest else {
            println!("Nothing to pick from yet. Submit a prompt first!");
            return Ok(());
        };

        let outcome = self.session.select_image(entry_id, index - 1).await;
        self.render_dialog(outcome).await
    }

    /// Prints the current dialog, then raises the reveal-finished signal
    /// and, for detection results, the deferred finalize step. This is the
    /// terminal stand-in for a typewriter reveal's completion callback.
    async fn render_dialog(&self, outcome: Option<DetectionOutcome>) -> Result<()> {
        let state = self.session.state().await;
        println!();
        println!("[co-pilot] {}", state.dialog.brief);
        let expanded = match &state.dialog.expanded {
            DialogBody::Text(text) => text.as_str(),
            DialogBody::DetectionResult(summary) => summary.expanded.as_str(),
        };
        if expanded != state.dialog.brief {
            println!("[co-pilot] {expanded}");
        }

        self.session.text_reveal_finished().await;
        if let Some(outcome) = outcome {
            self.session.finalize_score(outcome).await;
            self.persist().await?;
            self.handle_signal_modal().await?;
        }
        Ok(())
    }

    async fn handle_signal_modal(&self) -> Result<()> {
        let state = self.session.state().await;
        if !state.signal_modal_open {
            return Ok(());
        }
        println!();
        println!(
            "You've fed the model {} detections this round. Share your best prompt with a friend!",
            state.detection_count
        );
        self.session.dismiss_signal_modal().await;
        self.persist().await
    }

    async fn show_meters(&self) {
        let state = self.session.state().await;
        println!(
            "Points: {}  Training progress: {}%  Detections: {}",
            state.earned_points, state.training_progress, state.detection_count
        );
    }

    async fn persist(&self) -> Result<()> {
        let snapshot = self.session.state().await.snapshot();
        self.snapshots.save(&snapshot)
    }
}

fn print_help() {
    println!(
        "Type a prompt to generate images, or: /pick <n>, /view chat|slot|clap|fill, /score, /quit"
    );
}

fn show_input_marker() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
