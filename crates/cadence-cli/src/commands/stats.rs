use clap::Args;

use cadence_core::{format_duration, Database};

#[derive(Args)]
pub struct StatsArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
    /// Also list the most recent completions
    #[arg(long, default_value = "0")]
    recent: usize,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let stats = db.stats()?;
    let recent = db.recent(args.recent)?;

    if args.json {
        let out = serde_json::json!({ "stats": stats, "recent": recent });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Times completed: {}", stats.times_completed);
    println!("Total work:      {}", format_duration(stats.total_work_ms));
    match stats.last_completed_at {
        Some(at) => println!("Last completed:  {}", at.format("%Y-%m-%d %H:%M")),
        None => println!("Last completed:  never"),
    }
    for record in recent {
        println!(
            "  {}  {} cycles  {}",
            record.completed_at.format("%Y-%m-%d %H:%M"),
            record.cycles,
            format_duration(record.total_ms)
        );
    }
    Ok(())
}
