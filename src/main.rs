use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod bridge;
mod capture;
mod cmd;
mod config;
mod error;
mod lifecycle;
mod mcp;
mod paths;
mod tools;
mod utils;

use cmd::{ExecArgs, ServeArgs, ToolsArgs};
use config::Config;

/// ADB MCP - Android device control for MCP clients
///
/// Command layout:
///   adb-mcp [serve]                                  MCP server over stdio (default)
///   adb-mcp tools [--json]                           print the operation catalog
///   adb-mcp exec <TOOL> [--param k=v ...] [--json]   run one operation and print the result
///
/// Global flags / env:
///   -v / -vv        Increase verbosity (logs go to stderr)
///   -q / --quiet    Errors only
///   --adb CMD       Bridge command line (or ADB_MCP_ADB), e.g. "adb -H 10.0.0.2 -P 5037"
///   -c / --config   YAML config file (or ADB_MCP_CONFIG)
///
/// Examples:
///   adb-mcp
///   adb-mcp tools
///   adb-mcp exec list_packages --param filter=chrome --json
///   adb-mcp exec capture_screen_to_file --param output_path=~/shots/home --param format=jpg
#[derive(Parser, Debug)]
#[command(
    name = "adb-mcp",
    version,
    author,
    about = "ADB MCP - Android device control over the Model Context Protocol",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Bridge command line (program plus leading arguments)
    #[arg(long, env = "ADB_MCP_ADB", global = true, value_name = "CMD")]
    adb: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "ADB_MCP_CONFIG", global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve MCP over stdio (default)
    Serve(ServeArgs),

    /// List the available tools
    Tools(ToolsArgs),

    /// Execute (invoke) a tool once
    Exec(ExecArgs),
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    let config = Config::load(cli.config.as_deref(), cli.adb.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            cmd::execute_serve(args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tools(args) => {
            cmd::execute_tools(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Exec(args) => cmd::execute_exec(args, &config),
    }
}
