//! # Cadence Core Library
//!
//! This library provides the core logic for the Cadence interval-workout
//! timer. The CLI is a thin host over the same library.
//!
//! ## Architecture
//!
//! - **Timer state machine**: immutable [`TimerState`] values. The caller
//!   feeds measured elapsed time into [`TimerState::advance`] and reacts to
//!   the returned cue events.
//! - **Session**: optional host-side driver that owns a [`Clock`] and the
//!   current state, with start/pause/resume/reset.
//! - **Storage**: TOML configuration and a SQLite completion history.
//!
//! ## Key Components
//!
//! - [`build_stages`]: the standard Prepare/Work/Rest/Finish program
//! - [`TimerState`]: stage-sequencing state machine
//! - [`Session`]: clock-driven wrapper for host loops
//! - [`Config`]: application configuration management
//! - [`Database`]: completion history

pub mod error;
pub mod format;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use format::format_duration;
pub use storage::{CompletionRecord, CompletionStats, Config, Database};
pub use timer::{
    build_stages, build_stages_with, Clock, CueEvent, CueSink, ManualClock, MonotonicClock,
    Session, Stage, StageDurations, StagePosition, StageSequence, TimerSnapshot, TimerState,
    DEFAULT_CYCLES, PREPARE_CUE_LEAD_MS,
};
