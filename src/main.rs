//! msgblast - bulk personalized message dispatch
//!
//! CLI entry point: validates inputs, extracts recipient rows, and drives
//! the paced dispatch run.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, bail};
use tracing::{debug, info, warn};
use uuid::Uuid;

use msgblast::cli::{Cli, Command, InspectArgs, OutputFormat, PreviewArgs, SendArgs};
use msgblast::config::Config;
use msgblast::gateway::HttpGateway;
use msgblast::rows::{self, RowSet};
use msgblast::sender::{BulkSender, CancelFlag, RunSummary};
use msgblast::template::Template;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("msgblast")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    // Logs go to a file so stdout stays clean for progress output
    let log_file = fs::File::create(log_dir.join("msgblast.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Send(args) => cmd_send(&config, args).await,
        Command::Preview(args) => cmd_preview(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

/// Resolve the message template from the CLI arguments
///
/// Missing or blank templates are input errors: the run must not start.
fn load_template(inline: Option<&str>, file: Option<&Path>) -> Result<Template> {
    let template = match (inline, file) {
        (Some(_), Some(_)) => bail!("Pass either --template or --template-file, not both"),
        (Some(raw), None) => Template::new(raw),
        (None, Some(path)) => {
            Template::load(path).context(format!("Failed to read template file {}", path.display()))?
        }
        (None, None) => bail!("Missing message template. Pass --template or --template-file."),
    };

    if template.is_blank() {
        bail!("Message template is empty");
    }
    Ok(template)
}

/// Extract recipient rows, surfacing extraction problems as input errors
fn load_rows(file: &Path) -> Result<RowSet> {
    rows::extract(file).context(format!("Failed to load recipients from {}", file.display()))
}

/// Ask the operator to confirm the run
fn confirm(total: usize, delay: Duration) -> Result<bool> {
    print!("Send {} messages with {}s between them? [y/N] ", total, delay.as_secs());
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Run a dispatch over every valid row in the file
async fn cmd_send(config: &Config, args: SendArgs) -> Result<()> {
    debug!(?args.file, "cmd_send: called");

    // Pre-run validation: nothing is sent unless all inputs are usable
    let template = load_template(args.template.as_deref(), args.template_file.as_deref())?;
    let set = load_rows(&args.file)?;

    let (delay, clamped) = config.send.effective_delay(args.delay_secs);
    if clamped {
        warn!(requested = ?args.delay_secs, floor = config.send.min_delay_secs, "cmd_send: delay raised to floor");
        eprintln!(
            "Warning: delay raised to the {}s minimum",
            config.send.min_delay_secs
        );
    }

    // CLI flags override the configured gateway settings
    let mut gateway_config = config.gateway.clone();
    if let Some(base_url) = args.base_url {
        gateway_config.base_url = base_url;
    }
    if let Some(instance) = args.instance {
        gateway_config.instance_id = instance;
    }
    if let Some(token) = args.token {
        gateway_config.token = Some(token);
    }

    let gateway = HttpGateway::from_config(&gateway_config)?;

    let total = set.valid_count();
    if set.skipped_count() > 0 {
        println!(
            "Loaded {} recipients ({} skipped without a number)",
            total,
            set.skipped_count()
        );
    } else {
        println!("Loaded {} recipients", total);
    }

    if total == 0 {
        println!("No rows with a usable number; nothing to send.");
        return Ok(());
    }

    if !args.yes && !confirm(total, delay)? {
        println!("Cancelled.");
        return Ok(());
    }

    let run_id = Uuid::new_v4();
    info!(%run_id, total, delay_secs = delay.as_secs(), "cmd_send: starting dispatch run");

    // Ctrl-C stops the run after the in-flight send; recorded outcomes are kept
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling after the current send...");
                cancel.cancel();
            }
        });
    }

    let sender = BulkSender::new(Arc::new(gateway), delay).with_cancel_flag(cancel);
    let summary = sender
        .run(&set.rows, &template, |p| {
            print!("\rSending {}/{}...", p.current, p.total);
            let _ = io::stdout().flush();
        })
        .await;
    println!();

    info!(%run_id, success = summary.success_count, failed = summary.failed_numbers.len(), "cmd_send: run finished");
    report_summary(&summary, args.format)
}

/// Print the run summary in the requested format
fn report_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "total": summary.total(),
                "success-count": summary.success_count,
                "failed-numbers": summary.failed_numbers,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            if summary.all_succeeded() {
                println!("{} All {} messages sent", "✓".green(), summary.total());
            } else {
                println!(
                    "{} {} sent, {} failed",
                    "✗".red(),
                    summary.success_count,
                    summary.failed_numbers.len()
                );
                for number in &summary.failed_numbers {
                    println!("  - {}", number);
                }
            }
        }
    }

    Ok(())
}

/// Render the first rows without sending anything
fn cmd_preview(args: PreviewArgs) -> Result<()> {
    debug!(?args.file, limit = args.limit, "cmd_preview: called");
    let template = load_template(args.template.as_deref(), args.template_file.as_deref())?;
    let set = load_rows(&args.file)?;

    let valid: Vec<_> = set.rows.iter().filter(|r| r.is_valid()).collect();
    if valid.is_empty() {
        println!("No rows with a usable number.");
        return Ok(());
    }

    for row in valid.iter().take(args.limit) {
        let number = row.number().unwrap_or_default();
        println!("{}", number.bold());
        println!("  {}", template.render(row).replace('\n', "\n  "));
    }

    if valid.len() > args.limit {
        println!("... and {} more", valid.len() - args.limit);
    }

    Ok(())
}

/// Show the columns, row counts, and placeholder coverage of a file
fn cmd_inspect(args: InspectArgs) -> Result<()> {
    debug!(?args.file, "cmd_inspect: called");
    let set = load_rows(&args.file)?;

    let template = match (args.template.as_deref(), args.template_file.as_deref()) {
        (None, None) => None,
        (inline, file) => Some(load_template(inline, file)?),
    };

    let placeholders = template.as_ref().map(Template::placeholders).unwrap_or_default();
    let uncovered: Vec<&String> = placeholders.iter().filter(|p| !set.headers.contains(*p)).collect();

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "columns": set.headers,
                "rows": set.len(),
                "valid-rows": set.valid_count(),
                "skipped-rows": set.skipped_count(),
                "placeholders": placeholders,
                "uncovered-placeholders": uncovered,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Columns: {}", set.headers.join(", "));
            println!("Rows: {} ({} valid, {} skipped)", set.len(), set.valid_count(), set.skipped_count());

            if !placeholders.is_empty() {
                println!("Placeholders: {}", placeholders.join(", "));
                if uncovered.is_empty() {
                    println!("{} every placeholder matches a column", "✓".green());
                } else {
                    for name in &uncovered {
                        println!("{} no column for {{{}}} - it will render empty", "✗".red(), name);
                    }
                }
            }
        }
    }

    Ok(())
}
