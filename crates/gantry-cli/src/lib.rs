//! Gantry CLI library

pub mod commands;
pub mod error;

pub use error::{Error, Result};

use clap::{Parser, Subcommand, ValueEnum};
use gantry_common::telemetry::LogFormat;

/// Gantry - component assembly and reconciliation
#[derive(Parser, Debug)]
#[command(name = "gantry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Json)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a parameterized Template for the Redis component
    Template(commands::template::TemplateArgs),
    /// Print concrete Redis manifests
    Render(commands::render::RenderArgs),
    /// Reconcile the Redis component into a namespace
    Reconcile(commands::reconcile::ReconcileArgs),
}

/// `--log-format` values
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Json,
    Text,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Json => LogFormat::Json,
            LogFormatArg::Text => LogFormat::Text,
        }
    }
}

impl Cli {
    /// Run the CLI command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Template(args) => commands::template::run(args),
            Commands::Render(args) => commands::render::run(args),
            Commands::Reconcile(args) => commands::reconcile::run(args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reconcile_flags() {
        let cli = Cli::try_parse_from([
            "gantry",
            "--log-format",
            "text",
            "reconcile",
            "--app-label",
            "api",
            "--image",
            "redis:7",
            "--namespace",
            "3scale",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormatArg::Text);
        match cli.command {
            Commands::Reconcile(args) => {
                assert_eq!(args.namespace, "3scale");
                assert!(args.dry_run);
                assert_eq!(args.redis.app_label.as_deref(), Some("api"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn template_needs_no_values() {
        let cli = Cli::try_parse_from(["gantry", "template"]).unwrap();
        assert!(matches!(cli.command, Commands::Template(_)));
        assert_eq!(cli.log_format, LogFormatArg::Json);
    }
}
