use std::env;
use std::sync::{Mutex, OnceLock};

use hrdesk_cli::commands::{config, doctor, migrate, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("HRDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert!(payload.get("error_class").is_some_and(Value::is_null));
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("HRDESK_DATABASE_URL", "postgres://localhost/hrdesk")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn migrate_reports_unreachable_database() {
    with_env(&[("HRDESK_DATABASE_URL", "sqlite:///nonexistent-dir/hrdesk/hrdesk.db")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "db_connectivity");
    });
}

#[test]
fn seed_loads_every_built_in_year_by_default() {
    with_env(&[("HRDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run(&[]);
        assert_eq!(result.exit_code, 0, "expected seed success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let years = payload["details"]["years"].as_array().expect("years detail");
        let seeded = years.iter().map(|year| year["year"].as_i64().unwrap_or(0)).collect::<Vec<_>>();
        assert_eq!(seeded, vec![2024, 2025, 2026]);
        assert!(years.iter().all(|year| year["inserted"].as_u64().unwrap_or(0) > 0));
        assert!(years.iter().all(|year| year["skipped"] == 0));
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("hrdesk.db").display());

    with_env(&[("HRDESK_DATABASE_URL", url.as_str())], || {
        let first = seed::run(&[2025]);
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        let first_year = &first_payload["details"]["years"][0];
        let inserted = first_year["inserted"].as_u64().expect("inserted count");
        assert!(inserted > 0);
        assert_eq!(first_year["skipped"], 0);

        let second = seed::run(&[2025]);
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        let second_year = &second_payload["details"]["years"][0];
        assert_eq!(second_year["inserted"], 0);
        assert_eq!(second_year["skipped"].as_u64(), Some(inserted));
    });
}

#[test]
fn seed_rejects_years_outside_the_built_in_table() {
    with_env(&[("HRDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run(&[2025, 1999]);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "unsupported_year");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("1999"), "unexpected message: {message}");
    });
}

#[test]
fn config_reports_sources_and_redacts_the_proxy_secret() {
    with_env(
        &[
            ("HRDESK_DATABASE_URL", "sqlite::memory:"),
            ("HRDESK_SERVER_PORT", "9090"),
            ("HRDESK_LOG_LEVEL", "debug"),
            ("HRDESK_AUTH_PROXY_SECRET", "a-very-long-shared-secret"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0, "expected config success: {}", result.output);
            assert!(!result.output.contains("a-very-long-shared-secret"));

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "config");
            let entries = payload["details"]["entries"].as_array().expect("entries");
            let entry = |key: &str| {
                entries.iter().find(|entry| entry["key"] == key).cloned().unwrap_or(Value::Null)
            };

            assert_eq!(entry("server.port")["value"], "9090");
            assert_eq!(entry("server.port")["source"], "env (HRDESK_SERVER_PORT)");
            assert_eq!(entry("logging.level")["value"], "debug");
            assert_eq!(entry("logging.level")["source"], "env (HRDESK_LOG_LEVEL)");
            assert_eq!(entry("auth.proxy_secret")["value"], "<redacted>");
            assert_eq!(entry("database.max_connections")["source"], "default");
        },
    );
}

#[test]
fn config_shows_unset_proxy_secret() {
    with_env(&[("HRDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let entries = payload["details"]["entries"].as_array().expect("entries");
        let secret = entries
            .iter()
            .find(|entry| entry["key"] == "auth.proxy_secret")
            .expect("proxy secret entry");
        assert_eq!(secret["value"], "<unset>");
        assert_eq!(entries.len(), 10);
    });
}

#[test]
fn config_returns_failure_for_short_proxy_secret() {
    with_env(
        &[("HRDESK_DATABASE_URL", "sqlite::memory:"), ("HRDESK_AUTH_PROXY_SECRET", "short")],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 2);
            assert!(!result.output.contains("\"short\""));

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn doctor_flags_pending_migrations_on_a_fresh_database() {
    with_env(&[("HRDESK_DATABASE_URL", "sqlite::memory:")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(check_status(&report, "config_validation"), "pass");
        assert_eq!(check_status(&report, "database_connectivity"), "pass");
        assert_eq!(check_status(&report, "schema_migrations"), "fail");
    });
}

#[test]
fn doctor_passes_after_migrate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("hrdesk.db").display());

    with_env(&[("HRDESK_DATABASE_URL", url.as_str())], || {
        assert_eq!(migrate::run().exit_code, 0);

        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "expected doctor success: {}", result.output);
        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
        assert_eq!(check_status(&report, "schema_migrations"), "pass");

        let human = doctor::run(false);
        assert_eq!(human.exit_code, 0);
        assert!(human.output.starts_with("doctor: all readiness checks passed"));
        assert!(human.output.contains("- [ok] schema_migrations: 4 migrations applied"));
    });
}

#[test]
fn doctor_skips_database_checks_when_config_is_invalid() {
    with_env(&[("HRDESK_DATABASE_URL", "mysql://localhost/hrdesk")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(check_status(&report, "config_validation"), "fail");
        assert_eq!(check_status(&report, "database_connectivity"), "skipped");
        assert_eq!(check_status(&report, "schema_migrations"), "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn check_status(report: &Value, name: &str) -> String {
    report["checks"]
        .as_array()
        .and_then(|checks| checks.iter().find(|check| check["name"] == name))
        .and_then(|check| check["status"].as_str())
        .unwrap_or_default()
        .to_string()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "HRDESK_DATABASE_URL",
        "HRDESK_DATABASE_MAX_CONNECTIONS",
        "HRDESK_DATABASE_TIMEOUT_SECS",
        "HRDESK_SERVER_BIND_ADDRESS",
        "HRDESK_SERVER_PORT",
        "HRDESK_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "HRDESK_AUTH_PROXY_SECRET",
        "HRDESK_LEAVE_ANNUAL_ALLOWANCE_DAYS",
        "HRDESK_LOGGING_LEVEL",
        "HRDESK_LOGGING_FORMAT",
        "HRDESK_LOG_LEVEL",
        "HRDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
