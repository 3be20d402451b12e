use std::io::{self, Write};

use clap::Args;

use cadence_core::{
    format_duration, CueEvent, CueSink, Database, MonotonicClock, Session, StageSequence,
    TimerState,
};

#[derive(Args)]
pub struct RunArgs {
    /// Override the configured number of cycles
    #[arg(long)]
    cycles: Option<u32>,
    /// Do not ring the terminal bell on cues
    #[arg(long)]
    no_bell: bool,
}

/// Prints cues, rings the bell and records completions.
struct TerminalCues<'a> {
    bell: bool,
    db: &'a Database,
    stages: StageSequence,
    recorded: bool,
    error: Option<Box<dyn std::error::Error>>,
}

impl TerminalCues<'_> {
    /// Store the completion at most once per run.
    fn record(&mut self) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        match self.db.record_completion(&self.stages).and_then(|_| self.db.stats()) {
            Ok(stats) => println!(">> workout complete, {} in total", stats.times_completed),
            Err(e) => {
                tracing::warn!(error = %e, "failed to record completion");
                self.error.get_or_insert(Box::new(e));
            }
        }
    }
}

impl CueSink for TerminalCues<'_> {
    fn on_cue(&mut self, cue: CueEvent, state: &TimerState) {
        let bell = if self.bell { "\x07" } else { "" };
        let label = match cue {
            CueEvent::Prepare => "get ready",
            CueEvent::Stop => "stop",
            CueEvent::Finish => "finished",
        };
        let next = state.current_stage().map(|s| s.name.as_str()).unwrap_or("-");
        println!("\r{bell}>> {label:<10} (now: {next}){:20}", "");

        if cue == CueEvent::Finish {
            self.record();
        }
    }
}

fn render(state: &TimerState) -> io::Result<()> {
    let name = state.current_stage().map(|s| s.name.as_str()).unwrap_or("Done");
    let position = state.stage_index().max(0) + 1;
    let mut out = io::stdout().lock();
    write!(
        out,
        "\r{:>3}/{}  {:<8} {}  [{:>5.1}%]",
        position.min(state.stages().len() as i64),
        state.stages().len(),
        name,
        format_duration(state.remaining_stage_time_ms()),
        state.program_progress_pct()
    )?;
    out.flush()
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, stages) = super::load_program(args.cycles)?;
    let db = Database::open()?;
    let interval = config.tick_interval();

    let mut sink = TerminalCues {
        bell: config.cues.bell && !args.no_bell,
        db: &db,
        stages: stages.clone(),
        recorded: false,
        error: None,
    };

    tracing::info!(
        stages = stages.len(),
        total_ms = stages.total_duration_ms(),
        "starting workout"
    );

    let mut session = Session::new(stages, MonotonicClock::new());
    session.start();
    render(session.state())?;
    while session.is_running() {
        std::thread::sleep(interval);
        session.tick_into(&mut sink);
        render(session.state())?;
    }
    println!();
    // A coarse final tick can skip the last Work stage's cue.
    if session.state().reached_end() {
        sink.record();
    }

    match sink.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
