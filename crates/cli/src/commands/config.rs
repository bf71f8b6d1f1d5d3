use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::json;
use toml::Value;

use crate::commands::{load_config, CommandResult};

/// Config keys shown by `hrdesk config`, with the env variables that can set them.
const FIELDS: &[(&str, &[&str])] = &[
    ("database.url", &["HRDESK_DATABASE_URL"]),
    ("database.max_connections", &["HRDESK_DATABASE_MAX_CONNECTIONS"]),
    ("database.timeout_secs", &["HRDESK_DATABASE_TIMEOUT_SECS"]),
    ("server.bind_address", &["HRDESK_SERVER_BIND_ADDRESS"]),
    ("server.port", &["HRDESK_SERVER_PORT"]),
    ("server.graceful_shutdown_secs", &["HRDESK_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ("auth.proxy_secret", &["HRDESK_AUTH_PROXY_SECRET"]),
    ("leave.annual_allowance_days", &["HRDESK_LEAVE_ANNUAL_ALLOWANCE_DAYS"]),
    ("logging.level", &["HRDESK_LOGGING_LEVEL", "HRDESK_LOG_LEVEL"]),
    ("logging.format", &["HRDESK_LOGGING_FORMAT", "HRDESK_LOG_FORMAT"]),
];

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = detect_config_path();
    let config_file_doc = match load_config_file_doc(config_file_path.as_deref()) {
        Ok(doc) => doc,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", format!("{error:#}"), 2)
        }
    };

    let values = config.redacted_summary();
    let entries = FIELDS
        .iter()
        .map(|(key, env_keys)| {
            json!({
                "key": key,
                "value": display_value(lookup(&values, key)),
                "source": field_source(
                    key,
                    env_keys,
                    config_file_doc.as_ref(),
                    config_file_path.as_deref(),
                ),
            })
        })
        .collect::<Vec<_>>();

    CommandResult::success_with_details(
        "config",
        "effective config (source precedence: env > file > default)",
        Some(json!({ "entries": entries })),
    )
}

fn detect_config_path() -> Option<PathBuf> {
    ["hrdesk.toml", "config/hrdesk.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> anyhow::Result<Option<Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read config file {}", path.display()))?;
    let doc = raw
        .parse::<Value>()
        .with_context(|| format!("config file {} is not valid TOML", path.display()))?;
    Ok(Some(doc))
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn lookup<'a>(root: &'a serde_json::Value, key_path: &str) -> &'a serde_json::Value {
    key_path.split('.').fold(root, |current, key| &current[key])
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "<unset>".to_string(),
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
