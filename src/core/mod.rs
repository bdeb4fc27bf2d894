// src/core/mod.rs

/// Data structures shared across the scanner: hosts, location strategies,
/// probe outcomes and discoveries.
pub mod models;

/// Per-run hit accounting shared by every concurrently scheduled host task.
pub mod counter;

/// The probing engine: candidate generation, the HTTP probe, and the
/// orchestrator that drives them.
pub mod scanner;
