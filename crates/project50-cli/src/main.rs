use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "project50", version, about = "Project 50 challenge tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Challenge(commands::challenge::ChallengeAction),
    #[command(flatten)]
    Task(commands::task::TaskAction),
    /// Daily notes
    Note {
        #[command(subcommand)]
        action: commands::note::NoteAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = project50_core::Config::load_or_default();
    project50_core::logging::init(&config.logging.level);

    let result = match cli.command {
        Commands::Challenge(action) => commands::challenge::run(action),
        Commands::Task(action) => commands::task::run(action),
        Commands::Note { action } => commands::note::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
