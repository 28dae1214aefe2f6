use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use roster_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    let mut push = |key: &str, value: &str, env_key: &str| {
        lines.push(render_line(
            key,
            value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    push("database.url", &config.database.url, "ROSTER_DATABASE_URL");
    push(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        "ROSTER_DATABASE_MAX_CONNECTIONS",
    );
    push(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        "ROSTER_DATABASE_TIMEOUT_SECS",
    );

    push("llm.provider", &format!("{:?}", config.llm.provider), "ROSTER_LLM_PROVIDER");
    push("llm.model", &config.llm.model, "ROSTER_LLM_MODEL");
    push("llm.base_url", config.llm.base_url.as_deref().unwrap_or("<unset>"), "ROSTER_LLM_BASE_URL");
    let llm_api_key = if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" };
    push("llm.api_key", llm_api_key, "ROSTER_LLM_API_KEY");
    push("llm.timeout_secs", &config.llm.timeout_secs.to_string(), "ROSTER_LLM_TIMEOUT_SECS");

    push("search.engine", &config.search.engine, "ROSTER_SEARCH_ENGINE");
    let search_api_key = if config.search.api_key.is_some() { "<redacted>" } else { "<unset>" };
    push("search.api_key", search_api_key, "ROSTER_SEARCH_API_KEY");
    push(
        "search.timeout_secs",
        &config.search.timeout_secs.to_string(),
        "ROSTER_SEARCH_TIMEOUT_SECS",
    );

    push("logging.level", &config.logging.level, "ROSTER_LOGGING_LEVEL");
    push("logging.format", &format!("{:?}", config.logging.format), "ROSTER_LOGGING_FORMAT");

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("roster.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/roster.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
