// rlink - profile/payroll record linkage from the command line

mod exit_codes;
mod link;
mod logging;

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;

use exit_codes::EXIT_SUCCESS;
use link::LinkCommands;
use logging::LogConfig;

#[derive(Parser)]
#[command(name = "rlink")]
#[command(about = "Link personnel profiles to payroll records in rounds")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log detail (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: LinkCommands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_logging(
        &LogConfig::from_flags(cli.verbose, cli.quiet).with_ansi(std::io::stderr().is_terminal()),
    );

    match link::cmd_link(cli.command) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  rosterlink-linkage ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nengine:  rosterlink-linkage ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}
