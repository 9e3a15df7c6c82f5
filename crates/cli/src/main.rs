mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::PlanArgs;
use output::{OutputFormat, print_error};

/// stagebuild - Build CMake libraries and extension modules into a package tree
#[derive(Parser)]
#[command(name = "stagebuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Configure, build and install every target in order
  Build {
    #[command(flatten)]
    plan: PlanArgs,

    /// Copy extension auxiliary files into the source tree after building
    #[arg(long)]
    develop: bool,

    /// Source tree root for develop mode (default: plan's develop_root or its directory)
    #[arg(long, value_name = "DIR", requires = "develop")]
    develop_root: Option<PathBuf>,
  },

  /// Show resolved directories and cmake command lines without running them
  Plan {
    #[command(flatten)]
    plan: PlanArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the runtime search paths of each extension's linked libraries
  Rpath {
    #[command(flatten)]
    plan: PlanArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Print the library search path needed to load the installed libraries
  Env {
    #[command(flatten)]
    plan: PlanArgs,

    /// Only include these libraries (default: all)
    #[arg(short, long = "library", value_name = "NAME")]
    libraries: Vec<String>,
  },

  /// Show platform and toolchain information
  Info,
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build {
      plan,
      develop,
      develop_root,
    } => cmd::cmd_build(&plan, develop, develop_root),
    Commands::Plan { plan, output } => cmd::cmd_plan(&plan, output),
    Commands::Rpath { plan, output } => cmd::cmd_rpath(&plan, output),
    Commands::Env { plan, libraries } => cmd::cmd_env(&plan, &libraries),
    Commands::Info => cmd::cmd_info(),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&e);
      ExitCode::FAILURE
    }
  }
}
