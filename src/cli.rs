// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `render-driver`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "render-driver",
    version,
    about = "Drive the mc2pbrt -> pbrt render pipeline and manage its run logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the driver settings file (TOML).
    #[arg(long, value_name = "PATH", default_value = "RenderDriver.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RENDER_DRIVER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Submit a render request and follow it until the run ends.
    ///
    /// Ctrl-C cancels the run.
    Render {
        /// JSON file holding the render request.
        #[arg(long, value_name = "FILE")]
        request: String,
    },

    /// Inspect or remove per-run logs.
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },

    /// Validate the settings file and print the resolved paths.
    Check,
}

#[derive(Debug, Clone, Subcommand)]
pub enum LogsAction {
    /// List run logs, newest first.
    List,
    /// Print one run log.
    Show { name: String },
    /// Delete one run log.
    Delete { name: String },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_subcommand() {
        let args = CliArgs::try_parse_from([
            "render-driver",
            "--config",
            "drv.toml",
            "render",
            "--request",
            "req.json",
        ])
        .unwrap();
        assert_eq!(args.config, "drv.toml");
        assert!(matches!(args.command, Command::Render { ref request } if request == "req.json"));
    }

    #[test]
    fn parses_logs_show() {
        let args =
            CliArgs::try_parse_from(["render-driver", "logs", "show", "1700000000000.log"]).unwrap();
        assert_eq!(args.config, "RenderDriver.toml");
        assert!(matches!(
            args.command,
            Command::Logs { action: LogsAction::Show { ref name } } if name == "1700000000000.log"
        ));
    }
}
