//! symscope CLI: browse, dump, check and poke simulation model layouts.
//!
//! Provides `symscope tree` for printing the scope hierarchy, `symscope dump`
//! for listing every variable with its value, `symscope check` for validating
//! a layout, and `symscope console` for an interactive peek/poke session.

#![warn(missing_docs)]

mod check;
mod console;
mod dump;
mod model;
mod tree;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// symscope: inspect and drive named simulation state.
#[derive(Parser, Debug)]
#[command(name = "symscope", version, about = "Simulation symbol table browser")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the scope hierarchy of a layout.
    Tree {
        /// Layout file, or a directory containing `symscope.toml`.
        layout: PathBuf,
    },
    /// List every scope and variable with its current value.
    Dump(DumpArgs),
    /// Validate a layout and report its fingerprint.
    Check(CheckArgs),
    /// Start an interactive peek/poke console.
    Console {
        /// Layout file, or a directory containing `symscope.toml`.
        layout: PathBuf,
    },
}

/// Arguments for the `symscope dump` subcommand.
#[derive(Parser, Debug)]
pub struct DumpArgs {
    /// Layout file, or a directory containing `symscope.toml`.
    pub layout: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `symscope check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Layout file, or a directory containing `symscope.toml`.
    pub layout: PathBuf,

    /// Fingerprint the layout must still have; exit 1 when it differs.
    #[arg(long, value_name = "FINGERPRINT")]
    pub expect: Option<String>,
}

/// Output format for `dump`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let global = GlobalArgs { quiet: cli.quiet };

    let result = match cli.command {
        Command::Tree { ref layout } => tree::run(layout, &global),
        Command::Dump(ref args) => dump::run(args, &global),
        Command::Check(ref args) => check::run(args, &global),
        Command::Console { ref layout } => console::run(layout, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Maps `-v` count and `--quiet` to a log level; `RUST_LOG` wins when set.
fn log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(quiet, verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_tree() {
        let cli = Cli::parse_from(["symscope", "tree", "model/symscope.toml"]);
        match cli.command {
            Command::Tree { layout } => {
                assert_eq!(layout, PathBuf::from("model/symscope.toml"));
            }
            _ => panic!("expected Tree command"),
        }
    }

    #[test]
    fn parse_dump_default_format() {
        let cli = Cli::parse_from(["symscope", "dump", "model"]);
        match cli.command {
            Command::Dump(ref args) => {
                assert_eq!(args.layout, PathBuf::from("model"));
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Dump command"),
        }
    }

    #[test]
    fn parse_dump_json() {
        let cli = Cli::parse_from(["symscope", "dump", "model", "--format", "json"]);
        match cli.command {
            Command::Dump(ref args) => assert_eq!(args.format, ReportFormat::Json),
            _ => panic!("expected Dump command"),
        }
    }

    #[test]
    fn parse_check_and_console() {
        let cli = Cli::parse_from(["symscope", "check", "a.toml"]);
        assert!(matches!(cli.command, Command::Check(_)));
        let cli = Cli::parse_from(["symscope", "console", "a.toml"]);
        assert!(matches!(cli.command, Command::Console { .. }));
    }

    #[test]
    fn parse_check_expect() {
        let hex = "0123456789abcdef0123456789abcdef";
        let cli = Cli::parse_from(["symscope", "check", "a.toml", "--expect", hex]);
        match cli.command {
            Command::Check(ref args) => assert_eq!(args.expect.as_deref(), Some(hex)),
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["symscope", "--quiet", "check", "a.toml"]);
        assert!(cli.quiet);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_verbose_count() {
        let cli = Cli::parse_from(["symscope", "-vv", "tree", "a.toml"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(log_level(false, 0), "warn");
        assert_eq!(log_level(false, 1), "info");
        assert_eq!(log_level(false, 2), "debug");
        assert_eq!(log_level(false, 9), "trace");
        assert_eq!(log_level(true, 3), "error");
    }

    #[test]
    fn missing_layout_is_a_parse_error() {
        assert!(Cli::try_parse_from(["symscope", "tree"]).is_err());
    }
}
