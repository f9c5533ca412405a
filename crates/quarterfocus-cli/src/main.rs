use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "quarterfocus", version, about = "QuarterFocus CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pomodoro timer
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Session statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Task info notes and subtasks
    Info {
        #[command(subcommand)]
        action: commands::info::InfoAction,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("QUARTERFOCUS_LOG", "warn"))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Info { action } => commands::info::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
