//! Connwatch daemon library.
//!
//! This library exposes internal modules for integration testing.
//! In production, `connwatch-daemon` is used as a binary (main.rs).

pub mod cli;
pub mod health;
pub mod logging;
pub mod orchestrator;
