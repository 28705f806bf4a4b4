//! Top-level CLI definition and dispatch.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use vesper_portal::core::config::Config;
use vesper_portal::core::errors::VesperError;
use vesper_portal::core::paths::resolve_absolute_path;
use vesper_portal::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use vesper_portal::store::sqlite::SqliteAlertStore;
use vesper_portal::store::{AlertRecord, AlertStore, FeedLimit};
use vesper_portal::tui::format::{DetailedRow, ScoreTone, format_local_timestamp, format_score, score_tone};
use vesper_portal::tui::model::CLEAR_CONFIRM_PROMPT;
use vesper_portal::tui::update::CLEAR_SUCCESS_NOTICE;
use vesper_portal::tui::{DashboardRuntimeConfig, run_dashboard};

/// Vesper Portal: live view over the network-flow risk alert store.
#[derive(Debug, Parser)]
#[command(
    name = "vesper",
    author,
    version,
    about = "Vesper Portal - network-flow risk alert dashboard",
    long_about = None
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the alert database path.
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute (defaults to `dashboard`).
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Live terminal dashboard.
    Dashboard(DashboardArgs),
    /// Total, maximum and average alert score.
    Stats,
    /// List the most recent alerts.
    Alerts(AlertsArgs),
    /// Show one alert by id.
    Show(ShowArgs),
    /// Delete all alert history.
    Clear(ClearArgs),
    /// Check that the alert store answers queries.
    Health,
    /// View the effective configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct DashboardArgs {
    /// Initial refresh period in milliseconds.
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    refresh_ms: Option<u64>,
}

#[derive(Debug, Clone, Args, Default)]
struct AlertsArgs {
    /// Only the 10 newest alerts instead of 50.
    #[arg(long)]
    preview: bool,
}

#[derive(Debug, Clone, Args)]
struct ShowArgs {
    /// Alert id.
    #[arg(value_name = "ID")]
    id: i64,
}

#[derive(Debug, Clone, Args, Default)]
struct ClearArgs {
    /// Skip the confirmation prompt.
    #[arg(long)]
    yes: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the configuration and print its hash.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<VesperError> for CliError {
    fn from(err: VesperError) -> Self {
        match err {
            VesperError::InvalidConfig { .. }
            | VesperError::MissingConfig { .. }
            | VesperError::ConfigParse { .. } => Self::User(err.to_string()),
            VesperError::Serialization { .. } => Self::Internal(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        None => run_dashboard_command(cli, &DashboardArgs::default()),
        Some(Command::Dashboard(args)) => run_dashboard_command(cli, args),
        Some(Command::Stats) => run_stats(cli),
        Some(Command::Alerts(args)) => run_alerts(cli, args),
        Some(Command::Show(args)) => run_show(cli, args),
        Some(Command::Clear(args)) => run_clear(cli, args),
        Some(Command::Health) => run_health(cli),
        Some(Command::Config(args)) => run_config(cli, args),
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Effective config with the `--db` override applied.
fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.store.db_path = resolve_absolute_path(db);
    }
    Ok(config)
}

fn open_store(config: &Config) -> Result<SqliteAlertStore, CliError> {
    Ok(SqliteAlertStore::open(
        &config.store.db_path,
        config.store.busy_timeout(),
    )?)
}

fn run_dashboard_command(cli: &Cli, args: &DashboardArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let poll_interval = args
        .refresh_ms
        .map_or_else(|| config.poller.interval(), Duration::from_millis);

    let runtime = DashboardRuntimeConfig {
        db_path: config.store.db_path.clone(),
        busy_timeout: config.store.busy_timeout(),
        poll_interval,
        presets: config.poller.presets(),
        log: JsonlConfig::from_logging(&config.logging, false),
    };
    Ok(run_dashboard(&runtime)?)
}

fn run_stats(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let store = open_store(&config)?;
    let summary = store.summary()?;
    let avg = store.avg_score()?;

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{}", "Alert Store".bold());
            println!("  Path:       {}", store.path().display());
            println!("  Total:      {}", summary.total);
            println!("  Max score:  {}", colored_score(summary.max_score));
            println!("  Avg score:  {}", format_score(avg));
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "stats",
                "db_path": store.path().to_string_lossy(),
                "total": summary.total,
                "max_score": summary.max_score.map(round4),
                "avg_score": avg.map(round4),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_alerts(cli: &Cli, args: &AlertsArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let store = open_store(&config)?;
    let limit = if args.preview {
        FeedLimit::Preview
    } else {
        FeedLimit::History
    };
    let alerts = store.list_latest(limit)?;

    match output_mode(cli) {
        OutputMode::Human => {
            if alerts.is_empty() {
                println!("No alerts recorded.");
                return Ok(());
            }
            println!(
                "{}",
                format!(
                    "{:<6} {:<19}  {:<21}  {:<21}  {:<5}  {:<6}  Status",
                    "ID", "Time", "Source", "Destination", "Proto", "Score"
                )
                .bold()
            );
            for alert in &alerts {
                let row = DetailedRow::from_record(alert);
                println!(
                    "{:<6} {:<19}  {:<21}  {:<21}  {:<5}  {}  {}",
                    alert.id,
                    row.time,
                    row.source,
                    row.destination,
                    row.proto,
                    tone_text(&row.score, row.tone),
                    row.badge.red()
                );
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "alerts",
                "limit": limit.rows(),
                "count": alerts.len(),
                "alerts": alerts,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_show(cli: &Cli, args: &ShowArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let store = open_store(&config)?;
    let Some(alert) = store.find_by_id(args.id)? else {
        return Err(CliError::User(format!("alert {} not found", args.id)));
    };

    match output_mode(cli) {
        OutputMode::Human => print_alert(&alert),
        OutputMode::Json => {
            let payload = json!({
                "command": "show",
                "alert": alert,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_alert(alert: &AlertRecord) {
    println!("{}", format!("Alert #{}", alert.id).bold());
    println!("  Time:         {}", format_local_timestamp(alert.timestamp));
    println!("  Source:       {}:{}", alert.src_ip, alert.src_port);
    println!("  Destination:  {}:{}", alert.dst_ip, alert.dst_port);
    println!("  Protocol:     {}", alert.proto);
    println!("  Score:        {}", colored_score(Some(alert.score)));
}

fn run_clear(cli: &Cli, args: &ClearArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mut store = open_store(&config)?;

    if !args.yes && !confirm_clear()? {
        match output_mode(cli) {
            OutputMode::Human => println!("Aborted; history left untouched."),
            OutputMode::Json => write_json_line(&json!({
                "command": "clear",
                "cleared": false,
            }))?,
        }
        return Ok(());
    }

    let mut log = JsonlWriter::open(JsonlConfig::from_logging(&config.logging, true));
    match store.clear_all() {
        Ok(outcome) => {
            log.write_entry(
                &LogEntry::new(EventType::HistoryCleared, Severity::Info)
                    .with_count(u64::try_from(outcome.deleted).unwrap_or(u64::MAX))
                    .with_details("cli"),
            );
            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", CLEAR_SUCCESS_NOTICE.green());
                    println!("  Deleted {} alert(s).", outcome.deleted);
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "clear",
                    "cleared": true,
                    "deleted": outcome.deleted,
                    "sequence_reset": outcome.sequence_reset,
                }))?,
            }
            Ok(())
        }
        Err(err) => {
            log.write_entry(
                &LogEntry::new(EventType::ClearFailed, Severity::Error).with_error(&err),
            );
            Err(CliError::Runtime(format!("Failed to clear history: {err}")))
        }
    }
}

/// Ask on the terminal. Non-interactive stdin never confirms.
fn confirm_clear() -> Result<bool, CliError> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Err(CliError::User(
            "refusing to clear history without --yes on a non-interactive terminal".to_string(),
        ));
    }
    print!("{CLEAR_CONFIRM_PROMPT} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn run_health(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let result = open_store(&config).and_then(|store| store.health_check().map_err(CliError::from));
    let mode = output_mode(cli);

    match &result {
        Ok(()) => match mode {
            OutputMode::Human => println!(
                "{} alert store reachable at {}",
                "OK".green().bold(),
                config.store.db_path.display()
            ),
            OutputMode::Json => write_json_line(&json!({
                "command": "health",
                "healthy": true,
                "db_path": config.store.db_path.to_string_lossy(),
            }))?,
        },
        Err(err) => {
            if mode == OutputMode::Json {
                write_json_line(&json!({
                    "command": "health",
                    "healthy": false,
                    "db_path": config.store.db_path.to_string_lossy(),
                    "error": err.to_string(),
                }))?;
            }
        }
    }
    result
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        None | Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => {
            let config = load_config(cli)?;
            let hash = config.stable_hash()?;

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("Configuration is valid.");
                    println!("  Source: {}", config.paths.config_file.display());
                    println!("  Hash: {hash}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config validate",
                        "valid": true,
                        "path": config.paths.config_file.to_string_lossy(),
                        "hash": hash,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
    }
}

fn tone_text(text: &str, tone: ScoreTone) -> colored::ColoredString {
    match tone {
        ScoreTone::Danger => text.red().bold(),
        ScoreTone::Warning => text.yellow(),
    }
}

fn colored_score(score: Option<f64>) -> colored::ColoredString {
    let text = format_score(score);
    match score {
        Some(value) => tone_text(&text, score_tone(value)),
        None => text.normal(),
    }
}

/// Four-decimal rounding for JSON aggregates.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("VESPER_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
