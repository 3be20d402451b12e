use clap::Args;
use serde::Serialize;

use cadence_core::format_duration;

#[derive(Args)]
pub struct StagesArgs {
    /// Override the configured number of cycles
    #[arg(long)]
    cycles: Option<u32>,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct StageRow<'a> {
    index: usize,
    name: &'a str,
    duration_ms: u64,
}

pub fn run(args: StagesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, stages) = super::load_program(args.cycles)?;

    if args.json {
        let rows: Vec<StageRow<'_>> = stages
            .iter()
            .enumerate()
            .map(|(index, stage)| StageRow {
                index,
                name: &stage.name,
                duration_ms: stage.duration_ms,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for (index, stage) in stages.iter().enumerate() {
        println!(
            "{:>3}  {:<8} {}",
            index + 1,
            stage.name,
            format_duration(stage.duration_ms)
        );
    }
    println!("     {:<8} {}", "Total", format_duration(stages.total_duration_ms()));
    Ok(())
}
