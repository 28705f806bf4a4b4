//! End-to-end tests for the `vesper` binary against a seeded alert database.

mod common;

use common::{insert_alert, parse_json_line, run_cli_case, run_cli_case_with_env, seed_db};

fn seeded() -> (tempfile::TempDir, String) {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let db = seed_db(tmp.path());
    insert_alert(&db, "10.0.0.5", "203.0.113.9", 0.65, 1_700_000_000);
    insert_alert(&db, "10.0.0.6", "198.51.100.2", 0.93, 1_700_000_060);
    insert_alert(&db, "10.0.0.7", "192.0.2.44", 0.81, 1_700_000_030);
    let db = db.to_string_lossy().to_string();
    (tmp, db)
}

#[test]
fn help_lists_subcommands() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let result = run_cli_case("help_lists_subcommands", tmp.path(), &["--help"]);
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );
    for name in ["dashboard", "stats", "alerts", "show", "clear", "health", "config"] {
        assert!(result.stdout.contains(name), "missing {name} in help");
    }
}

#[test]
fn stats_json_reports_aggregates() {
    let (tmp, db) = seeded();
    let result = run_cli_case("stats_json", tmp.path(), &["--db", &db, "--json", "stats"]);
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );

    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["command"], "stats");
    assert_eq!(payload["total"], 3);
    assert_eq!(payload["max_score"], 0.93);
    assert_eq!(payload["avg_score"], 0.7967);
    assert!(
        payload["db_path"]
            .as_str()
            .is_some_and(|p| p.ends_with("alerts.db"))
    );
}

#[test]
fn stats_json_rounds_max_and_avg_to_four_places() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let db = seed_db(tmp.path());
    insert_alert(&db, "10.0.0.5", "203.0.113.9", 0.912_345_6, 1_700_000_000);
    insert_alert(&db, "10.0.0.6", "198.51.100.2", 0.1, 1_700_000_060);
    let db = db.to_string_lossy().to_string();

    let result = run_cli_case("stats_rounding", tmp.path(), &["--db", &db, "--json", "stats"]);
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );

    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["max_score"], 0.9123);
    assert_eq!(payload["avg_score"], 0.5062);
}

#[test]
fn stats_on_empty_store_reports_nulls() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let db = seed_db(tmp.path()).to_string_lossy().to_string();
    let result = run_cli_case("stats_empty", tmp.path(), &["--db", &db, "--json", "stats"]);
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );

    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["total"], 0);
    assert!(payload["max_score"].is_null());
    assert!(payload["avg_score"].is_null());
}

#[test]
fn alerts_are_newest_first() {
    let (tmp, db) = seeded();
    let result = run_cli_case("alerts_order", tmp.path(), &["--db", &db, "--json", "alerts"]);
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );

    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["limit"], 50);
    let alerts = payload["alerts"].as_array().expect("alerts array");
    let stamps: Vec<i64> = alerts
        .iter()
        .map(|a| a["timestamp"].as_i64().expect("timestamp"))
        .collect();
    assert_eq!(stamps, vec![1_700_000_060, 1_700_000_030, 1_700_000_000]);
}

#[test]
fn alerts_preview_caps_at_ten() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let db = seed_db(tmp.path());
    for i in 0..15 {
        insert_alert(&db, "10.1.1.1", "10.2.2.2", 0.5, 1_700_000_000 + i);
    }
    let db = db.to_string_lossy().to_string();

    let result = run_cli_case(
        "alerts_preview",
        tmp.path(),
        &["--db", &db, "--json", "alerts", "--preview"],
    );
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );

    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["limit"], 10);
    assert_eq!(payload["count"], 10);
    assert_eq!(payload["alerts"][0]["timestamp"], 1_700_000_014);
}

#[test]
fn show_returns_the_requested_alert() {
    let (tmp, db) = seeded();
    let result = run_cli_case("show_found", tmp.path(), &["--db", &db, "--json", "show", "2"]);
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );

    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["alert"]["id"], 2);
    assert_eq!(payload["alert"]["src_ip"], "10.0.0.6");
    assert_eq!(payload["alert"]["dst_port"], 443);
}

#[test]
fn show_unknown_id_is_a_user_error() {
    let (tmp, db) = seeded();
    let result = run_cli_case("show_missing", tmp.path(), &["--db", &db, "show", "999"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("alert 999 not found"));
}

#[test]
fn clear_with_yes_empties_store_and_logs() {
    let (tmp, db) = seeded();
    let activity = tmp.path().join("activity.jsonl");
    let activity_str = activity.to_string_lossy().to_string();

    let result = run_cli_case_with_env(
        "clear_yes",
        tmp.path(),
        &["--db", &db, "--json", "clear", "--yes"],
        &[("VESPER_ACTIVITY_LOG", activity_str.as_str())],
    );
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );

    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["cleared"], true);
    assert_eq!(payload["deleted"], 3);

    let stats = run_cli_case("clear_yes_stats", tmp.path(), &["--db", &db, "--json", "stats"]);
    assert_eq!(parse_json_line(&stats.stdout)["total"], 0);

    let log = std::fs::read_to_string(&activity).expect("activity log written");
    assert!(log.contains("\"event\":\"history_cleared\""));
}

#[test]
fn ids_restart_after_clear() {
    let (tmp, db) = seeded();
    let result = run_cli_case("clear_reset", tmp.path(), &["--db", &db, "clear", "--yes"]);
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );

    let id = insert_alert(std::path::Path::new(&db), "10.9.9.9", "10.8.8.8", 0.9, 1);
    assert_eq!(id, 1);
}

#[test]
fn clear_without_yes_refuses_non_interactive_stdin() {
    let (tmp, db) = seeded();
    let result = run_cli_case("clear_no_tty", tmp.path(), &["--db", &db, "clear"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());

    let stats = run_cli_case("clear_no_tty_stats", tmp.path(), &["--db", &db, "--json", "stats"]);
    assert_eq!(parse_json_line(&stats.stdout)["total"], 3);
}

#[test]
fn health_ok_on_reachable_store() {
    let (tmp, db) = seeded();
    let result = run_cli_case("health_ok", tmp.path(), &["--db", &db, "--json", "health"]);
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );
    assert_eq!(parse_json_line(&result.stdout)["healthy"], true);
}

#[test]
fn missing_database_is_a_runtime_error() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let db = tmp.path().join("absent.db").to_string_lossy().to_string();

    let health = run_cli_case("health_missing", tmp.path(), &["--db", &db, "--json", "health"]);
    assert_eq!(health.status.code(), Some(2), "log: {}", health.log_path.display());
    assert_eq!(parse_json_line(&health.stdout)["healthy"], false);

    let stats = run_cli_case("stats_missing", tmp.path(), &["--db", &db, "stats"]);
    assert_eq!(stats.status.code(), Some(2), "log: {}", stats.log_path.display());
    assert!(stats.stderr.contains("VSP-"));
}

#[test]
fn output_format_env_selects_json() {
    let (tmp, db) = seeded();
    let result = run_cli_case_with_env(
        "env_json",
        tmp.path(),
        &["--db", &db, "stats"],
        &[("VESPER_OUTPUT_FORMAT", "json")],
    );
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );
    assert_eq!(parse_json_line(&result.stdout)["command"], "stats");
}

#[test]
fn explicit_missing_config_is_a_user_error() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let cfg = tmp.path().join("nope.toml").to_string_lossy().to_string();
    let result = run_cli_case("config_missing", tmp.path(), &["--config", &cfg, "config", "show"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn config_validate_reports_hash() {
    let tmp = tempfile::tempdir().expect("create tempdir");
    let cfg = tmp.path().join("vesper.toml");
    std::fs::write(&cfg, "[poller]\ninterval_ms = 5000\n").expect("write config");
    let cfg = cfg.to_string_lossy().to_string();

    let result = run_cli_case(
        "config_validate",
        tmp.path(),
        &["--config", &cfg, "--json", "config", "validate"],
    );
    assert!(
        result.status.success(),
        "log: {}",
        result.log_path.display()
    );
    let payload = parse_json_line(&result.stdout);
    assert_eq!(payload["valid"], true);
    assert_eq!(payload["hash"].as_str().map(str::len), Some(16));
}
