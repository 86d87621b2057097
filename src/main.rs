// ai-cleaner: command line front-end of the cleanup client
//
// Each subcommand restores the persisted session, runs one command against
// the backend and, for long-running work, follows the push channel until the
// operation reaches a terminal state.

use ai_cleaner_client::transport::EVENTS_PATH;
use ai_cleaner_client::types::{FileCategory, format_size};
use ai_cleaner_client::{
    AlwaysConfirm, BaseUrl, CleanerClient, ClientOptions, Confirm, EventChannel, LogEntry,
    SessionState, Severity, Status,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ai-cleaner")]
#[command(version)]
#[command(about = "Scan a folder, let a local model triage old files, delete what you confirm")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (defaults to $AI_CLEANER_URL or http://localhost:5000)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Directory holding the persisted session
    #[arg(long, global = true, conflicts_with = "ephemeral")]
    state_dir: Option<PathBuf>,

    /// Keep the session in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Increase diagnostic output (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick the folder to scan
    Select {
        /// Use the platform folder picker
        #[arg(long)]
        native: bool,
    },
    /// Scan a folder for deletion candidates
    Scan {
        /// Folder to scan (defaults to the selected one)
        path: Option<String>,
        /// Restrict the scan to these categories (repeatable)
        #[arg(long = "category", value_parser = parse_category)]
        categories: Vec<FileCategory>,
        /// Ignore files modified more recently than this
        #[arg(long)]
        min_age_days: Option<u32>,
        /// Ignore files smaller than this
        #[arg(long)]
        min_size_mb: Option<f64>,
    },
    /// Classify the scanned candidates with the model
    Analyze {
        /// Model identifier
        #[arg(long)]
        model: Option<String>,
        /// Send at most this many candidates
        #[arg(long)]
        max_files: Option<u32>,
    },
    /// Delete the selected files of the delete list
    Delete {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Delete every scanned file of whole categories
    QuickDelete {
        /// Categories to wipe (repeatable)
        #[arg(long = "category", value_parser = parse_category, required = true)]
        categories: Vec<FileCategory>,
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Stop whatever the backend is doing
    Stop,
    /// Stop, then reset the session
    Restart,
    /// Check that the model is reachable
    AiStatus,
    /// Print the session summary
    Status,
    /// Follow backend events until interrupted
    Watch,
}

fn parse_category(raw: &str) -> Result<FileCategory, String> {
    raw.parse::<FileCategory>().map_err(|e| e.to_string())
}

/// Upper bound for following a scan or an analysis
const FOLLOW_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);

/// How long to wait for the push stream before sending a start request
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut builder = ClientOptions::from_env()
        .context("Invalid AI_CLEANER_* environment")?
        .to_builder();
    if let Some(url) = cli.url.as_deref() {
        builder = builder.base_url(BaseUrl::resolve(Some(url)));
    }
    if let Some(dir) = cli.state_dir.clone() {
        builder = builder.state_dir(dir);
    }
    if cli.ephemeral {
        builder = builder.ephemeral();
    }
    let options = builder.build()?;

    let client = CleanerClient::from_options(&options)?;
    run(cli.command, &client, &options).await
}

async fn run(command: Commands, client: &CleanerClient, options: &ClientOptions) -> Result<()> {
    match command {
        Commands::Select { native } => {
            let path = client.select_folder(native).await?;
            println!("{path}");
        }
        Commands::Scan {
            path,
            categories,
            min_age_days,
            min_size_mb,
        } => {
            if let Some(path) = path {
                client.set_target_path(path);
            }
            if !categories.is_empty() {
                select_file_types(client, &categories);
            }
            if let Some(days) = min_age_days {
                client.set_min_age_days(days);
            }
            if let Some(mb) = min_size_mb {
                client.set_min_size_mb(mb);
            }

            let _channel = open_events(client, options).await?;
            let printed = log_mark(client);
            client.start_scan().await?;
            follow(client, printed, |s| {
                s.pending.is_none() && s.status != Status::Scanning
            })
            .await;
            client.detach().await;
            print_summary(&client.state());
        }
        Commands::Analyze { model, max_files } => {
            if let Some(model) = model {
                client.set_model(&model);
            }
            if let Some(max) = max_files {
                client.set_max_files(max);
            }

            let _channel = open_events(client, options).await?;
            let printed = log_mark(client);
            client.start_analyze().await?;
            follow(client, printed, |s| {
                s.pending.is_none() && s.status != Status::Analyzing
            })
            .await;
            client.detach().await;
            print_results(&client.state());
        }
        Commands::Delete { yes } => {
            let printed = log_mark(client);
            let report = if yes {
                client.delete_selected(&AlwaysConfirm).await?
            } else {
                client.delete_selected(&StdinConfirm).await?
            };
            print_new_logs(client, printed);
            if report.is_none() {
                println!("Nothing deleted");
            }
        }
        Commands::QuickDelete { categories, yes } => {
            select_quick_delete(client, &categories);
            let printed = log_mark(client);
            let report = if yes {
                client.quick_delete_by_category(&AlwaysConfirm).await?
            } else {
                client.quick_delete_by_category(&StdinConfirm).await?
            };
            print_new_logs(client, printed);
            if report.is_none() {
                println!("Nothing deleted");
            }
        }
        Commands::Stop => client.stop_process().await?,
        Commands::Restart => client.restart_process().await,
        Commands::AiStatus => {
            let status = client.check_ai_status().await?;
            println!(
                "ready: {}",
                status.ollama_url.as_deref().unwrap_or("default endpoint")
            );
        }
        Commands::Status => {
            let state = client.state();
            print_summary(&state);
            print_results(&state);
        }
        Commands::Watch => {
            let _channel = open_events(client, options).await?;
            let mut printed = log_mark(client);
            let mut changes = client.changes();
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        printed = print_new_logs(client, printed);
                    }
                }
            }
            client.detach().await;
        }
    }
    Ok(())
}

/// Print activity until `done` holds, Ctrl-C stops the operation
async fn follow(
    client: &CleanerClient,
    mut printed: u64,
    done: impl Fn(&SessionState) -> bool,
) {
    let mut changes = client.changes();
    let deadline = tokio::time::sleep(FOLLOW_TIMEOUT);
    tokio::pin!(deadline);
    loop {
        printed = print_new_logs(client, printed);
        if client.with_state(&done) {
            return;
        }
        tokio::select! {
            () = &mut deadline => {
                eprintln!("Gave up waiting for the backend");
                return;
            }
            _ = tokio::signal::ctrl_c() => {
                if let Err(e) = client.stop_process().await {
                    eprintln!("Stop failed: {e}");
                }
                print_new_logs(client, printed);
                return;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// Open the push stream and attach the client to it
///
/// Fails when the stream is not up within `CONNECT_TIMEOUT`.
async fn open_events(client: &CleanerClient, options: &ClientOptions) -> Result<EventChannel> {
    let channel = EventChannel::connect(options)?;
    client.attach(&channel);
    if !channel.wait_connected(CONNECT_TIMEOUT).await {
        client.detach().await;
        anyhow::bail!(
            "Event stream {} did not open within {}s",
            options.base_url.url(EVENTS_PATH),
            CONNECT_TIMEOUT.as_secs()
        );
    }
    Ok(channel)
}

/// Sequence number of the newest log line
fn log_mark(client: &CleanerClient) -> u64 {
    client.with_state(|state| state.log_seq)
}

/// Print log lines appended after sequence number `seen`; returns the new mark
fn print_new_logs(client: &CleanerClient, seen: u64) -> u64 {
    client.with_state(|state| {
        for entry in state.logs_since(seen) {
            print_log(entry);
        }
        state.log_seq
    })
}

fn print_log(entry: &LogEntry) {
    let tag = match entry.severity {
        Severity::Info => "info",
        Severity::Success => " ok ",
        Severity::Warning => "warn",
        Severity::Error => "FAIL",
    };
    println!(
        "{} [{tag}] {}",
        entry.timestamp.format("%H:%M:%S"),
        entry.message
    );
    if let Some(detail) = &entry.detail {
        println!("           {detail}");
    }
}

fn print_summary(state: &SessionState) {
    let overview = state.overview();
    println!("status:     {}", state.display_status().as_str());
    println!(
        "folder:     {}",
        if state.config.target_path.is_empty() {
            "(none)"
        } else {
            &state.config.target_path
        }
    );
    println!(
        "candidates: {} ({}), {} protected",
        overview.candidate_count, overview.total_candidate_size, overview.protected_count
    );
    if let Some(stats) = &state.stats {
        for (category, count) in &stats.per_category {
            println!("  {category:<12} {count}");
        }
    }
    println!(
        "results:    {} delete ({} selected), {} keep, {} review",
        state.results.delete.len(),
        overview.selected_delete_count,
        state.results.keep.len(),
        state.results.review.len()
    );
}

fn print_results(state: &SessionState) {
    for (label, entries) in [
        ("DELETE", &state.results.delete),
        ("REVIEW", &state.results.review),
        ("KEEP", &state.results.keep),
    ] {
        for entry in entries {
            let mark = if label == "DELETE" && state.is_selected(entry.path()) {
                "[x]"
            } else {
                "[ ]"
            };
            let size = entry
                .size_label
                .clone()
                .unwrap_or_else(|| format_size(entry.file.size_bytes));
            println!(
                "{mark} {label:<6} {size:>9}  {}  {}",
                entry.path(),
                entry.reason
            );
        }
    }
}

fn select_file_types(client: &CleanerClient, wanted: &[FileCategory]) {
    for category in FileCategory::SCANNABLE {
        let enabled = client.with_state(|s| {
            s.config
                .file_type_toggles
                .get(&category)
                .copied()
                .unwrap_or(false)
        });
        if enabled != wanted.contains(&category) {
            client.toggle_file_type(category);
        }
    }
}

fn select_quick_delete(client: &CleanerClient, wanted: &[FileCategory]) {
    for category in FileCategory::QUICK_DELETE {
        let enabled = client.with_state(|s| {
            s.quick_delete_categories
                .get(&category)
                .copied()
                .unwrap_or(false)
        });
        if enabled != wanted.contains(&category) {
            client.toggle_quick_delete_category(category);
        }
    }
}

/// Asks on the terminal, default no
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}
