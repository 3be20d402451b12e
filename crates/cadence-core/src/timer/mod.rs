mod clock;
mod cue;
mod session;
mod stage;
mod state;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use cue::CueEvent;
pub use session::{CueSink, Session};
pub use stage::{
    build_stages, build_stages_with, Stage, StageDurations, StageSequence, DEFAULT_CYCLES,
    FINISH, PREPARE, REST, WORK,
};
pub use state::{StagePosition, TimerSnapshot, TimerState, PREPARE_CUE_LEAD_MS};
