//! Weird Traffic Game Client
//!
//! The runnable half of the game: environment configuration, file-based
//! session snapshot persistence, and the interactive terminal app that
//! plays the presentation layer for the core orchestrator. The `game`
//! binary is a thin wrapper around this library.

pub mod app;
pub mod config;
pub mod snapshot;
