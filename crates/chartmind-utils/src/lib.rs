//! Shared utilities for chartmind
//!
//! This crate provides common functionality used across the chartmind
//! workspace, currently the tracing subscriber setup used by the
//! command-line binary.

pub mod logging;

pub use logging::{LogFormat, LoggingError, init_tracing, init_tracing_with};
