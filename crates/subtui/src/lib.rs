#![forbid(unsafe_code)]

//! `subtui`: play a SubRip file in the terminal.
//!
//! The binary is a thin wrapper over [`app::run`]; the library half exists
//! so the integration tests can drive the same code paths.

pub mod app;
pub mod cli;
pub mod srt;

pub use app::{AppError, dry_run, run, scheduler_config};
pub use cli::{Command, Opts};
pub use srt::{SrtError, load_srt, parse_srt};
