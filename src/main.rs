use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sitetree::build::PipelineError;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Show what every stage does (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: SitetreeCommand,
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the site description
    #[arg(short, long, default_value = "sitetree.yaml")]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct ReverseArgs {
    /// The path to the site description
    #[arg(short, long, default_value = "sitetree.yaml")]
    config_file: Option<PathBuf>,

    /// Only this section; every section with a source template otherwise
    #[arg(short, long)]
    section: Option<String>,

    /// Write the markdown files instead of listing what would be written
    #[arg(short, long, default_value = "false")]
    write: bool,
}

#[derive(Subcommand)]
enum SitetreeCommand {
    /// Initialize a new site description
    Init(InitArgs),

    /// Generate every section of the site
    Build(BuildArgs),

    /// Regenerate markdown sources from published pages
    Reverse(ReverseArgs),
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        SitetreeCommand::Init(args) => commands::init::run(&args),
        SitetreeCommand::Build(args) => commands::build::run(&args),
        SitetreeCommand::Reverse(args) => commands::reverse::run(&args),
    };

    // The operator already saw the abort message at the prompt.
    if let Err(e) = &result
        && matches!(e.downcast_ref::<PipelineError>(), Some(PipelineError::Aborted))
    {
        std::process::exit(1);
    }

    result
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
