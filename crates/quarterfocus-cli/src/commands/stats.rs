use chrono::Local;
use clap::Subcommand;
use quarterfocus_core::{stats, Database};

use super::CliResult;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's focus stats
    Today {
        /// Print a one-line summary instead of JSON
        #[arg(long)]
        short: bool,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let db = Database::open()?;

    match action {
        StatsAction::Today { short } => {
            let today = stats::today(&db, Local::now())?;
            if short {
                println!(
                    "{} focused, {} pomodoros, {} tasks",
                    today.focus_time_label(),
                    today.total_pomodoros,
                    today.tasks_focused
                );
            } else {
                println!("{}", serde_json::to_string_pretty(&today)?);
            }
        }
    }
    Ok(())
}
