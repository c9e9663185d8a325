use clap::{Parser, Subcommand};

mod alerts;
mod commands;

#[derive(Parser)]
#[command(name = "deskrest", version, about = "Deskrest CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Screen-break prompt control
    Break {
        #[command(subcommand)]
        action: commands::breaks::BreakAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Habit log
    Habits {
        #[command(subcommand)]
        action: commands::habits::HabitsAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Break { action } => commands::breaks::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Habits { action } => commands::habits::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
