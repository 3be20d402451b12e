//! Host-side driver for a [`TimerState`].
//!
//! The session owns the current state and a [`Clock`]. It measures the
//! elapsed time between ticks and feeds it into the state machine, so a
//! host loop only has to call [`Session::tick`] at its own cadence. There
//! is no internal thread.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = Session::new(build_stages(8), MonotonicClock::new());
//! session.start();
//! // In a loop:
//! for cue in session.tick() { /* play a sound */ }
//! ```

use super::clock::Clock;
use super::cue::CueEvent;
use super::stage::StageSequence;
use super::state::TimerState;

/// Receiver for cue events, e.g. a speaker or a vibration motor.
pub trait CueSink {
    fn on_cue(&mut self, cue: CueEvent, state: &TimerState);
}

impl<F> CueSink for F
where
    F: FnMut(CueEvent, &TimerState),
{
    fn on_cue(&mut self, cue: CueEvent, state: &TimerState) {
        self(cue, state)
    }
}

#[derive(Debug)]
pub struct Session<C: Clock> {
    clock: C,
    state: TimerState,
    /// Clock reading at the previous tick; `None` while stopped.
    last_tick_ms: Option<u64>,
}

impl<C: Clock> Session<C> {
    pub fn new(stages: StageSequence, clock: C) -> Self {
        Self {
            clock,
            state: TimerState::new(stages),
            last_tick_ms: None,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.last_tick_ms.is_some()
    }

    /// Start (or resume) measuring time. Returns `false` if already running
    /// or the program is over.
    pub fn start(&mut self) -> bool {
        if self.is_running() || self.state.reached_end() {
            return false;
        }
        self.last_tick_ms = Some(self.clock.now_ms());
        tracing::debug!(stage_index = self.state.stage_index(), "session started");
        true
    }

    /// Flush the time elapsed so far, then stop measuring.
    ///
    /// Returns the cues produced by the flush.
    pub fn pause(&mut self) -> Vec<CueEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        let cues = self.tick().to_vec();
        self.last_tick_ms = None;
        tracing::debug!(
            stage_index = self.state.stage_index(),
            remaining_ms = self.state.remaining_stage_time_ms(),
            "session paused"
        );
        cues
    }

    pub fn resume(&mut self) -> bool {
        self.start()
    }

    /// Back to a fresh, stopped state over the same program.
    pub fn reset(&mut self) {
        self.state = TimerState::new(self.state.stages().clone());
        self.last_tick_ms = None;
        tracing::debug!("session reset");
    }

    /// Advance by the time elapsed since the previous tick.
    ///
    /// Returns the cues of this transition; empty while stopped. The session
    /// stops itself once the program has ended.
    pub fn tick(&mut self) -> &[CueEvent] {
        let Some(last) = self.last_tick_ms else {
            return &[];
        };
        let now = self.clock.now_ms();
        let delta = now.saturating_sub(last);

        self.state = self.state.advance(delta);
        self.last_tick_ms = Some(now);

        for cue in self.state.events() {
            tracing::info!(
                cue = %cue,
                stage_index = self.state.stage_index(),
                "cue emitted"
            );
        }

        if self.state.reached_end() {
            self.last_tick_ms = None;
            tracing::debug!("program finished");
        }

        self.state.events()
    }

    /// Tick and hand every cue to `sink`. Returns how many were delivered.
    pub fn tick_into<S: CueSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        let cues = self.tick().to_vec();
        for cue in &cues {
            sink.on_cue(*cue, &self.state);
        }
        cues.len()
    }

    /// Jump `amount` stages; partial time of the current stage is discarded.
    pub fn goto_relative(&mut self, amount: i64) {
        self.state = self.state.goto_relative(amount);
        if self.is_running() {
            self.last_tick_ms = Some(self.clock.now_ms());
        }
        tracing::debug!(
            amount,
            stage_index = self.state.stage_index(),
            "jumped to stage"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::ManualClock;
    use crate::timer::stage::build_stages;

    fn session() -> (Session<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (Session::new(build_stages(2), clock.clone()), clock)
    }

    #[test]
    fn idle_session_ignores_time() {
        let (mut session, clock) = session();
        clock.advance(5_000);
        assert!(session.tick().is_empty());
        assert_eq!(session.state().stage_index(), -1);
    }

    #[test]
    fn tick_uses_measured_delta() {
        let (mut session, clock) = session();
        assert!(session.start());
        assert!(!session.start());

        clock.advance(1_000);
        session.tick();
        assert_eq!(session.state().stage_index(), 0);
        assert_eq!(session.state().remaining_stage_time_ms(), 9_000);

        clock.advance(6_000);
        assert_eq!(session.tick(), &[CueEvent::Prepare]);
    }

    #[test]
    fn paused_time_is_not_charged() {
        let (mut session, clock) = session();
        session.start();
        clock.advance(2_000);
        session.tick();

        clock.advance(500);
        assert!(session.pause().is_empty());
        assert!(!session.is_running());
        assert_eq!(session.state().remaining_stage_time_ms(), 7_500);

        clock.advance(60_000);
        session.tick();
        assert_eq!(session.state().remaining_stage_time_ms(), 7_500);

        assert!(session.resume());
        clock.advance(500);
        session.tick();
        assert_eq!(session.state().remaining_stage_time_ms(), 7_000);
    }

    #[test]
    fn reset_returns_to_sentinel() {
        let (mut session, clock) = session();
        session.start();
        clock.advance(12_000);
        session.tick();
        session.reset();
        assert_eq!(session.state().stage_index(), -1);
        assert!(!session.is_running());
    }

    #[test]
    fn sink_receives_cues_and_session_stops_at_end() {
        let (mut session, clock) = session();
        let mut seen = Vec::new();
        let mut sink = |cue: CueEvent, _: &TimerState| seen.push(cue);

        session.start();
        while session.is_running() {
            clock.advance(100);
            session.tick_into(&mut sink);
        }

        assert!(session.state().reached_end());
        assert_eq!(
            seen,
            vec![
                CueEvent::Prepare,
                CueEvent::Stop,
                CueEvent::Prepare,
                CueEvent::Finish
            ]
        );
        assert!(!session.start());
    }

    #[test]
    fn goto_discards_pending_time() {
        let (mut session, clock) = session();
        session.start();
        clock.advance(3_000);
        session.goto_relative(1);
        assert_eq!(session.state().stage_index(), 0);

        clock.advance(1_000);
        session.tick();
        assert_eq!(session.state().remaining_stage_time_ms(), 9_000);
    }
}
