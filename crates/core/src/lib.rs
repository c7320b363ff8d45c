//! Game Session Orchestrator Core
//!
//! Domain library for the "fool the AI" prompt game: the session store and
//! its transcript, the scoring engine, the dialog sequencer, the avatar
//! animation state machine, the repeat-engagement trigger, and the
//! orchestrator that drives them all from player input and the remote
//! generate/detect calls. Presentation and transport concerns live in the
//! client crate; this one only knows the [`backend::GameBackend`] contract.

pub mod animation;
pub mod backend;
pub mod dialog;
pub mod engagement;
pub mod scoring;
pub mod session;
pub mod store;
pub mod transcript;
