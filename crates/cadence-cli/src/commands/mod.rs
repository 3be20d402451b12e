pub mod config;
pub mod run;
pub mod simulate;
pub mod stages;
pub mod stats;

use cadence_core::{Config, StageSequence};

/// Load the config and build its program, with an optional cycle override.
pub fn load_program(
    cycles: Option<u32>,
) -> Result<(Config, StageSequence), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(cycles) = cycles {
        config.set("program.cycles", &cycles.to_string())?;
    }
    let stages = config.stages();
    Ok((config, stages))
}
