//! Background tasks module
//!
//! This module contains the task that runs each timer engine.

pub mod engine_loop;

// Re-export main types
pub use engine_loop::{Command, EngineLoop, Request};
