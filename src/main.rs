//! Slack History Export - write Slack conversations to flat text transcripts.
//!
//! Pages through users, conversations, history and thread replies of a
//! workspace, backing off whenever Slack rate-limits, and writes one
//! `[YYYY-MM-DD HH:MM:SS] <author> text` transcript per conversation.
//!
//! Usage:
//!   slack-export --list                              # Numbered conversation table
//!   slack-export --channels 0,general --start 2024-01-01
//!   slack-export --all-dms --save-unresolved         # DMs plus raw-token copies
//!   slack-export --all --end 2024-06-30 -o archive

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::io::Write;

use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    default_end, format_conversations_table, format_stats, parse_date, select, DateRange,
    ExportScope, ExportService, Workspace, DEFAULT_START,
};
use cli::Cli;
use domain::{AppConfig, AppError, ConversationInfo};
use infrastructure::{
    ensure_config_exists, load_config, timestamped_dir, ProgressWriter, SlackClient,
    TranscriptWriter,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Log lines go through the export bar so it is redrawn below them
    let progress = ProgressBar::hidden();
    setup_logging(cli.verbose, &progress);

    if let Err(e) = run(cli, progress).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli, progress: ProgressBar) -> domain::Result<()> {
    if cli.init_config {
        return cmd_init_config(&cli);
    }

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(secs) = cli.thread_sleep {
        config.backoff.thread_sleep_secs = secs;
    }

    let token = cli
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Config {
            message: "SLACK_TOKEN environment variable is not set.".into(),
        })?;

    let client = SlackClient::new(token, &config.api)?;
    println!("🔐 Authenticated.");

    let service = ExportService::new(&client, &config).with_progress(progress.clone());
    let workspace = service.load_workspace().await?;

    if cli.list {
        println!(
            "{}",
            format_conversations_table(&workspace.conversations, &workspace.users)
        );
        return Ok(());
    }

    let selected = match cli.scope() {
        Some(scope) => select(&workspace.conversations, &scope, &workspace.users),
        None => prompt_selection(&workspace)?,
    };
    if selected.is_empty() {
        println!("{} No conversations selected.", "⚠️".yellow());
        return Ok(());
    }

    let start = date_or_prompt(cli.start.as_deref(), "📆 Start date? [default: 2000-01-01]: ", || {
        parse_date(DEFAULT_START)
    })?;
    let end = date_or_prompt(cli.end.as_deref(), "📆 End date? [default: today]: ", || {
        Ok(default_end())
    })?;
    let range = DateRange::from_dates(start, end)?;

    let out_dir = cli
        .output_dir
        .clone()
        .or_else(|| config.export.output_dir.clone())
        .unwrap_or_else(|| timestamped_dir(&config.export.output_prefix, Local::now()));
    let writer = TranscriptWriter::create(out_dir, cli.save_unresolved)?;

    progress.set_draw_target(ProgressDrawTarget::stderr());

    let stats = service
        .export(&workspace, &selected, range, &writer)
        .await?;

    println!(
        "\n{} Done! Exported to: {}",
        "✅".green().bold(),
        writer.out_dir().display()
    );
    if let Some(dir) = writer.unresolved_dir() {
        println!("🗃 Raw unresolved files saved to: {}", dir.display());
    }
    println!();
    println!("{}", format_stats(&stats));

    Ok(())
}

/// Write the default config file.
fn cmd_init_config(cli: &Cli) -> domain::Result<()> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);

    if ensure_config_exists(&path)? {
        println!("{} Created {}", "✓".green().bold(), path.display());
    } else {
        println!("Config already exists: {}", path.display());
    }
    Ok(())
}

/// Show the conversation table and ask which ones to export.
fn prompt_selection(workspace: &Workspace) -> domain::Result<Vec<ConversationInfo>> {
    println!("\n📋 Available channels:");
    println!(
        "{}",
        format_conversations_table(&workspace.conversations, &workspace.users)
    );

    let input = prompt("Enter channel indexes or names (comma-separated) [Enter = ALL]: ")?;
    let scope = if input.is_empty() {
        ExportScope::All
    } else {
        ExportScope::Named(input)
    };
    Ok(select(&workspace.conversations, &scope, &workspace.users))
}

/// Parse a date flag, or prompt for it; empty input takes the default.
fn date_or_prompt(
    flag: Option<&str>,
    question: &str,
    default: impl FnOnce() -> domain::Result<NaiveDate>,
) -> domain::Result<NaiveDate> {
    let value = match flag {
        Some(v) => v.to_string(),
        None => prompt(question)?,
    };
    if value.is_empty() {
        default()
    } else {
        parse_date(&value)
    }
}

/// Read one trimmed line from stdin.
fn prompt(question: &str) -> domain::Result<String> {
    print!("{question}");
    std::io::stdout()
        .flush()
        .map_err(|e| AppError::io("Failed to flush stdout", e))?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| AppError::io("Failed to read from stdin", e))?;
    Ok(input.trim().to_string())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8, progress: &ProgressBar) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(ProgressWriter::new(progress.clone(), std::io::stdout)),
        )
        .with(filter)
        .init();
}
