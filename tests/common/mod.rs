#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, params};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_vesper") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "vesper.exe" } else { "vesper" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve vesper binary path for integration test"),
    }
}

/// Run the binary with `home` as `$HOME` so config and activity-log defaults
/// stay inside the test's temp dir.
pub fn run_cli_case(case_name: &str, home: &Path, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, home, args, &[])
}

pub fn run_cli_case_with_env(
    case_name: &str,
    home: &Path,
    args: &[&str],
    envs: &[(&str, &str)],
) -> CmdResult {
    let root = std::env::temp_dir().join("vesper-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("HOME", home)
        .env_remove("VESPER_DB_PATH")
        .env_remove("VESPER_ACTIVITY_LOG")
        .env_remove("VESPER_OUTPUT_FORMAT")
        .env("RUST_BACKTRACE", "1");
    for (key, value) in envs {
        command.env(key, value);
    }
    let output = command.output().expect("execute vesper command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Create an alert database with the pipeline's schema.
pub fn seed_db(dir: &Path) -> PathBuf {
    let path = dir.join("alerts.db");
    let conn = Connection::open(&path).expect("create alert db");
    conn.execute_batch(
        "CREATE TABLE high_risk_flows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            src_ip TEXT NOT NULL,
            dst_ip TEXT NOT NULL,
            src_port INTEGER NOT NULL,
            dst_port INTEGER NOT NULL,
            proto TEXT NOT NULL,
            score REAL NOT NULL,
            timestamp INTEGER NOT NULL
        );",
    )
    .expect("create schema");
    path
}

pub fn insert_alert(path: &Path, src: &str, dst: &str, score: f64, timestamp: i64) -> i64 {
    let conn = Connection::open(path).expect("open alert db");
    conn.execute(
        "INSERT INTO high_risk_flows (src_ip, dst_ip, src_port, dst_port, proto, score, timestamp)
         VALUES (?1, ?2, 51000, 443, 'TCP', ?3, ?4)",
        params![src, dst, score, timestamp],
    )
    .expect("insert alert");
    conn.last_insert_rowid()
}

pub fn parse_json_line(stdout: &str) -> serde_json::Value {
    let line = stdout
        .lines()
        .find(|l| !l.trim().is_empty())
        .expect("stdout has a JSON line");
    serde_json::from_str(line).expect("stdout line is valid JSON")
}
