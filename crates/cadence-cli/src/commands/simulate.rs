use std::fmt;
use std::str::FromStr;

use clap::Args;

use cadence_core::TimerState;

#[derive(Args)]
pub struct SimulateArgs {
    /// Override the configured number of cycles
    #[arg(long)]
    cycles: Option<u32>,
    /// Tick size in milliseconds when no script is given
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    step: u64,
    /// Comma-separated script, e.g. "advance:6500,goto:+1,advance:100"
    #[arg(long, value_delimiter = ',')]
    ops: Vec<Op>,
    /// Print every state instead of only those carrying cues
    #[arg(long)]
    all: bool,
}

/// One scripted input to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Advance(u64),
    Goto(i64),
}

#[derive(Debug)]
pub struct ParseOpError(String);

impl fmt::Display for ParseOpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid op '{}': expected advance:<ms> or goto:<+/-n>", self.0)
    }
}

impl std::error::Error for ParseOpError {}

impl FromStr for Op {
    type Err = ParseOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseOpError(s.to_string());
        let (kind, arg) = s.trim().split_once(':').ok_or_else(err)?;
        match kind {
            "advance" => arg.parse().map(Op::Advance).map_err(|_| err()),
            "goto" => arg.parse().map(Op::Goto).map_err(|_| err()),
            _ => Err(err()),
        }
    }
}

impl Op {
    fn apply(self, state: &TimerState) -> TimerState {
        match self {
            Op::Advance(ms) => state.advance(ms),
            Op::Goto(amount) => state.goto_relative(amount),
        }
    }
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, stages) = super::load_program(args.cycles)?;
    let mut state = TimerState::new(stages);

    let emit = |state: &TimerState| -> Result<(), serde_json::Error> {
        if args.all || !state.events().is_empty() {
            println!("{}", serde_json::to_string(&state.snapshot())?);
        }
        Ok(())
    };

    if args.ops.is_empty() {
        while !state.reached_end() {
            state = state.advance(args.step);
            emit(&state)?;
        }
    } else {
        for op in &args.ops {
            state = op.apply(&state);
            emit(&state)?;
        }
    }

    tracing::debug!(
        stage_index = state.stage_index(),
        reached_end = state.reached_end(),
        "simulation done"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ops() {
        assert_eq!("advance:1500".parse::<Op>().unwrap(), Op::Advance(1_500));
        assert_eq!("goto:+2".parse::<Op>().unwrap(), Op::Goto(2));
        assert_eq!(" goto:-1".parse::<Op>().unwrap(), Op::Goto(-1));
    }

    #[test]
    fn rejects_bad_ops() {
        assert!("advance:-5".parse::<Op>().is_err());
        assert!("jump:1".parse::<Op>().is_err());
        assert!("advance".parse::<Op>().is_err());
    }
}
