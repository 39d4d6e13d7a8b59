use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rhizome_loam::commands;
use rhizome_loam::commands::init::InitArgs;
use rhizome_loam::commands::modes::ModesAction;
use rhizome_loam::commands::run::RunArgs;
use rhizome_loam::commands::state::StateAction;

#[derive(Parser)]
#[command(name = "loam")]
#[command(about = "Workflow-orchestration CLI built around mode plugins")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (debug level)
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize loam in a directory
    Init(InitArgs),

    /// Inspect and manage registered modes
    Modes {
        #[command(subcommand)]
        action: ModesAction,

        /// Root directory (defaults to current directory)
        #[arg(short, long, global = true)]
        root: Option<PathBuf>,
    },

    /// Run a mode end to end
    Run(RunArgs),

    /// Inspect and clear durable mode state
    State {
        #[command(subcommand)]
        action: StateAction,

        /// Root directory (defaults to current directory)
        #[arg(short, long, global = true)]
        root: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Modes { action, root } => commands::modes::run(action, root, cli.verbose),
        Commands::Run(args) => commands::run::run(args, cli.verbose),
        Commands::State { action, root } => commands::state::run(action, root, cli.verbose),
    };
    std::process::exit(code);
}
