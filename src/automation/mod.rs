//! The closed capture → detect → input loop.
//!
//! This module provides:
//! - Configuration loading (`config`)
//! - Cancellable pacing (`pacer`)
//! - Keypad input replay (`input`)
//! - The per-cycle state machine and its background runner
//! - The frame queue feeding the viewer

pub mod config;
pub mod input;
pub mod pacer;
pub mod queue;
pub mod runner;
pub mod state;

pub use config::{AppConfig, get_config, init_config};
pub use runner::{get_last_count, is_loop_running, start_detection};
pub use state::{is_abort_requested, request_abort};
