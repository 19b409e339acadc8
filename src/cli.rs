//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// msgblast - bulk personalized message dispatch
#[derive(Parser)]
#[command(
    name = "msgblast",
    about = "Send a personalized message to every recipient in a spreadsheet",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send one message per recipient in the file
    Send(SendArgs),

    /// Render the template for the first rows without sending anything
    Preview(PreviewArgs),

    /// Show the columns, row counts, and placeholder coverage of a file
    Inspect(InspectArgs),
}

/// Arguments for `msgblast send`
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Recipient file (.csv or .tsv) with a `number` column
    #[arg(short, long)]
    pub file: PathBuf,

    /// Message template with {field} placeholders
    #[arg(short, long)]
    pub template: Option<String>,

    /// Read the message template from a file
    #[arg(long)]
    pub template_file: Option<PathBuf>,

    /// Seconds to wait between messages
    #[arg(short = 'd', long)]
    pub delay_secs: Option<u64>,

    /// Session/instance identifier (overrides config)
    #[arg(long)]
    pub instance: Option<String>,

    /// Access token (overrides config/env/file resolution)
    #[arg(long)]
    pub token: Option<String>,

    /// API base URL (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Output format for the run summary
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for `msgblast preview`
#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Recipient file (.csv or .tsv) with a `number` column
    #[arg(short, long)]
    pub file: PathBuf,

    /// Message template with {field} placeholders
    #[arg(short, long)]
    pub template: Option<String>,

    /// Read the message template from a file
    #[arg(long)]
    pub template_file: Option<PathBuf>,

    /// Number of rows to render
    #[arg(short = 'n', long, default_value = "5")]
    pub limit: usize,
}

/// Arguments for `msgblast inspect`
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Recipient file (.csv or .tsv)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Optional template to check placeholder coverage against the columns
    #[arg(short, long)]
    pub template: Option<String>,

    /// Read the template from a file
    #[arg(long)]
    pub template_file: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for summary/inspect commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_send() {
        let cli = Cli::parse_from([
            "msgblast",
            "send",
            "--file",
            "recipients.csv",
            "--template",
            "Hi {name}",
            "--delay-secs",
            "3",
            "--yes",
        ]);

        let Command::Send(args) = cli.command else {
            panic!("Expected Send command");
        };
        assert_eq!(args.file, PathBuf::from("recipients.csv"));
        assert_eq!(args.template.as_deref(), Some("Hi {name}"));
        assert_eq!(args.delay_secs, Some(3));
        assert!(args.yes);
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_parse_preview_defaults() {
        let cli = Cli::parse_from(["msgblast", "preview", "-f", "r.csv", "-t", "hi"]);

        let Command::Preview(args) = cli.command else {
            panic!("Expected Preview command");
        };
        assert_eq!(args.limit, 5);
    }

    #[test]
    fn test_cli_parse_inspect_json() {
        let cli = Cli::parse_from(["msgblast", "inspect", "-f", "r.csv", "--format", "json"]);

        let Command::Inspect(args) = cli.command else {
            panic!("Expected Inspect command");
        };
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["msgblast", "-c", "/path/to/config.yml", "inspect", "-f", "r.csv"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("invalid".parse::<OutputFormat>().is_err());
    }
}
