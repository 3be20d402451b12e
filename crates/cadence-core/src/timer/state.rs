//! Stage-sequencing state machine.
//!
//! A [`TimerState`] is an immutable value. Every tick or navigation request
//! produces a brand-new state together with the cue events that happened on
//! that transition; the previous state is left untouched.
//!
//! ## State Transitions
//!
//! ```text
//! NotStarted -> InStage(0) -> ... -> InStage(N-1) -> Finished
//! ```
//!
//! `goto_relative` may jump to any `InStage(i)` from any position.
//!
//! ## Usage
//!
//! ```
//! use cadence_core::{build_stages, CueEvent, TimerState};
//!
//! let state = TimerState::new(build_stages(1));
//! let state = state.advance(1_000).advance(6_000);
//! assert_eq!(state.events(), &[CueEvent::Prepare]);
//! ```

use serde::{Deserialize, Serialize};

use super::cue::CueEvent;
use super::stage::{Stage, StageSequence};

/// How long before a rest-type stage ends the `prepare` cue fires.
pub const PREPARE_CUE_LEAD_MS: u64 = 3_000;

/// Where the timer sits in its program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum StagePosition {
    NotStarted,
    InStage(usize),
    Finished,
}

impl StagePosition {
    fn next(self, len: usize) -> Self {
        let candidate = match self {
            StagePosition::NotStarted => 0,
            StagePosition::InStage(i) => i + 1,
            StagePosition::Finished => return StagePosition::Finished,
        };
        if candidate < len {
            StagePosition::InStage(candidate)
        } else {
            StagePosition::Finished
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimerState {
    stages: StageSequence,
    position: StagePosition,
    remaining_stage_time_ms: u64,
    events: Vec<CueEvent>,
    /// Set once the current work stage has emitted its `stop`/`finish` cue
    /// while still sitting at zero remaining time.
    stage_end_cued: bool,
}

impl TimerState {
    /// Fresh, not-yet-started state over `stages`.
    pub fn new(stages: StageSequence) -> Self {
        Self {
            stages,
            position: StagePosition::NotStarted,
            remaining_stage_time_ms: 0,
            events: Vec::new(),
            stage_end_cued: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn stages(&self) -> &StageSequence {
        &self.stages
    }

    pub fn position(&self) -> StagePosition {
        self.position
    }

    /// Integer stage index: `-1` before the start, `N` once finished.
    pub fn stage_index(&self) -> i64 {
        match self.position {
            StagePosition::NotStarted => -1,
            StagePosition::InStage(i) => i as i64,
            StagePosition::Finished => self.stages.len() as i64,
        }
    }

    pub fn remaining_stage_time_ms(&self) -> u64 {
        self.remaining_stage_time_ms
    }

    pub fn reached_end(&self) -> bool {
        self.position == StagePosition::Finished
    }

    pub fn is_started(&self) -> bool {
        self.position != StagePosition::NotStarted
    }

    /// Cues produced by the transition that created this state.
    pub fn events(&self) -> &[CueEvent] {
        &self.events
    }

    pub fn current_stage(&self) -> Option<&Stage> {
        self.stage_at(self.position)
    }

    /// The stage that follows the current one, if any.
    pub fn next_stage(&self) -> Option<&Stage> {
        match self.position {
            StagePosition::NotStarted => self.stages.first(),
            StagePosition::InStage(i) => self.stages.get(i + 1),
            StagePosition::Finished => None,
        }
    }

    /// 0.0 .. 1.0 progress within the current stage.
    pub fn stage_progress(&self) -> f64 {
        let total = self.current_stage().map(|s| s.duration_ms).unwrap_or(0);
        if total == 0 {
            return if self.reached_end() { 1.0 } else { 0.0 };
        }
        1.0 - (self.remaining_stage_time_ms as f64 / total as f64)
    }

    /// Milliseconds of the program already behind the timer.
    pub fn elapsed_ms(&self) -> u64 {
        match self.position {
            StagePosition::NotStarted => 0,
            StagePosition::InStage(i) => {
                let done = self.stages.cumulative_ms(i);
                done.saturating_add(
                    self.stages[i]
                        .duration_ms
                        .saturating_sub(self.remaining_stage_time_ms),
                )
            }
            StagePosition::Finished => self.stages.total_duration_ms(),
        }
    }

    /// 0.0 .. 100.0 progress across the whole program.
    pub fn program_progress_pct(&self) -> f64 {
        let total = self.stages.total_duration_ms();
        if total == 0 {
            return if self.reached_end() { 100.0 } else { 0.0 };
        }
        (self.elapsed_ms() as f64 / total as f64 * 100.0).min(100.0)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let stage = self.current_stage();
        TimerSnapshot {
            stage_index: self.stage_index(),
            stage_count: self.stages.len(),
            stage_name: stage.map(|s| s.name.clone()),
            remaining_ms: self.remaining_stage_time_ms,
            stage_total_ms: stage.map(|s| s.duration_ms).unwrap_or(0),
            stage_progress: self.stage_progress(),
            program_progress_pct: self.program_progress_pct(),
            reached_end: self.reached_end(),
            events: self.events.clone(),
        }
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Apply `delta_ms` of elapsed time.
    ///
    /// A delta spanning several stages walks through each of them, so no
    /// boundary is lost when the host ticks coarsely. Cues are evaluated on
    /// the net transition only: cues belonging to stages skipped entirely
    /// inside one call are not reported.
    ///
    /// `prepare` fires only while counting down a `Prepare` or `Rest` stage;
    /// other stage names never get it.
    ///
    /// A finished state stays finished.
    pub fn advance(&self, delta_ms: u64) -> TimerState {
        let len = self.stages.len();
        let prior_after_delta = i128::from(self.remaining_stage_time_ms) - i128::from(delta_ms);

        let mut position = self.position;
        let mut remaining = prior_after_delta;
        while remaining < 0 {
            position = position.next(len);
            match position {
                StagePosition::InStage(i) => remaining += i128::from(self.stages[i].duration_ms),
                _ => {
                    remaining = 0;
                    break;
                }
            }
        }
        let remaining = u64::try_from(remaining).unwrap_or(0);
        let same_stage = position == self.position;

        let mut events = Vec::new();

        if same_stage {
            let rest_like = self.stage_at(position).is_some_and(Stage::is_rest_like);
            if rest_like
                && self.remaining_stage_time_ms > PREPARE_CUE_LEAD_MS
                && remaining <= PREPARE_CUE_LEAD_MS
            {
                events.push(CueEvent::Prepare);
            }
        }

        let mut stage_end_cued = same_stage && self.stage_end_cued;
        if let StagePosition::InStage(i) = self.position {
            if self.stages[i].is_work() && !self.stage_end_cued && prior_after_delta <= 0 {
                let followed_by_finish = self.stages.get(i + 1).is_some_and(Stage::is_finish);
                events.push(if followed_by_finish {
                    CueEvent::Finish
                } else {
                    CueEvent::Stop
                });
                stage_end_cued = same_stage;
            }
        }

        TimerState {
            stages: self.stages.clone(),
            position,
            remaining_stage_time_ms: remaining,
            events,
            stage_end_cued,
        }
    }

    /// Jump `amount` stages forward (or backward when negative).
    ///
    /// The target is clamped to the program and starts with its full
    /// duration. Navigation never emits cues.
    pub fn goto_relative(&self, amount: i64) -> TimerState {
        let last = self.stages.len().saturating_sub(1) as i64;
        let index = self.stage_index().saturating_add(amount).clamp(0, last) as usize;

        TimerState {
            stages: self.stages.clone(),
            position: StagePosition::InStage(index),
            remaining_stage_time_ms: self.stages[index].duration_ms,
            events: Vec::new(),
            stage_end_cued: false,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn stage_at(&self, position: StagePosition) -> Option<&Stage> {
        match position {
            StagePosition::InStage(i) => self.stages.get(i),
            _ => None,
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(StageSequence::default())
    }
}

/// Serializable view of a [`TimerState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub stage_index: i64,
    pub stage_count: usize,
    pub stage_name: Option<String>,
    pub remaining_ms: u64,
    pub stage_total_ms: u64,
    pub stage_progress: f64,
    pub program_progress_pct: f64,
    pub reached_end: bool,
    pub events: Vec<CueEvent>,
}
