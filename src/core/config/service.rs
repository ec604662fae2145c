use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::types::AppConfig;
use super::validation::validate_config;
use crate::core::errors::RagError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "auth_",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "total_tokens", "tokens"];

/// Environment variables folded into the configuration tree, as
/// `(variable, section, key)`.
const ENV_OVERRIDES: [(&str, &str, &str); 2] = [
    ("OPENAI_API_KEY", "openai", "api_key"),
    ("OPENAI_BASE_URL", "openai", "base_url"),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("CHATRAG_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    pub fn load(&self) -> Result<AppConfig, RagError> {
        self.load_with(|name| env::var(name).ok())
    }

    /// Merged raw tree: `config.yml`, then `secrets.yaml`, then `lookup`
    /// (the process environment outside tests). Validated before it is
    /// returned.
    fn load_config_with<F>(&self, lookup: F) -> Result<Value, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        let merged = deep_merge(&public_config, &secrets_config);
        let merged = apply_env_overrides(merged, lookup);

        validate_config(&merged)?;
        Ok(merged)
    }

    fn load_with<F>(&self, lookup: F) -> Result<AppConfig, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = self.load_config_with(lookup)?;
        tracing::debug!(
            "Effective config: {}",
            redact_sensitive_values(&raw)
        );
        parse_config(raw)
    }
}

pub fn parse_config(raw: Value) -> Result<AppConfig, RagError> {
    serde_json::from_value(raw).map_err(RagError::config)
}

fn load_yaml_file(path: &Path) -> Result<Value, RagError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| RagError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let value = serde_yaml::from_str::<Value>(&contents)
        .map_err(|e| RagError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(RagError::Config(format!(
            "Invalid config at '{}': expected a mapping at the top level",
            path.display()
        ))),
    }
}

fn apply_env_overrides<F>(mut config: Value, lookup: F) -> Value
where
    F: Fn(&str) -> Option<String>,
{
    let Some(root) = config.as_object_mut() else {
        return config;
    };

    for (variable, section, key) in ENV_OVERRIDES {
        let Some(value) = lookup(variable).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let entry = root
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Some(map) = entry.as_object_mut() {
            map.insert(key.to_string(), Value::String(value));
        }
    }

    config
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service_in(dir: &Path) -> ConfigService {
        ConfigService::new(Arc::new(AppPaths::from_root(dir.to_path_buf())))
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "a": 1,
            "b": { "c": 2, "d": 3 },
            "arr": [1, 2]
        });
        let override_value = json!({
            "b": { "c": 99 },
            "arr": [3],
            "e": "x"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "a": 1,
                "b": { "c": 99, "d": 3 },
                "arr": [3],
                "e": "x"
            })
        );
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let config = json!({ "openai": { "api_key": "from-file", "chat_model": "m" } });
        let merged = apply_env_overrides(config, |name| match name {
            "OPENAI_API_KEY" => Some("from-env".to_string()),
            _ => None,
        });

        assert_eq!(merged["openai"]["api_key"], "from-env");
        assert_eq!(merged["openai"]["chat_model"], "m");
        assert!(merged["openai"].get("base_url").is_none());
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let merged = apply_env_overrides(json!({}), |_| Some("  ".to_string()));
        assert_eq!(merged, json!({}));
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "openai": {
                "api_key": "sk-secret",
                "chat_model": "gpt-3.5-turbo",
                "max_tokens": 42
            },
            "items": [
                { "password": "pw" }
            ]
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "openai": {
                    "api_key": "****",
                    "chat_model": "gpt-3.5-turbo",
                    "max_tokens": 42
                },
                "items": [
                    { "password": "****" }
                ]
            })
        );
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let raw = load_yaml_file(&dir.path().join("config.yml")).unwrap();
        let config = parse_config(raw).unwrap();

        assert_eq!(config.splitter.chunk_size, 500);
        assert_eq!(config.splitter.chunk_overlap, 0);
        assert_eq!(config.retriever.k, 3);
        assert_eq!(config.openai.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.openai.temperature, 0.0);
        assert!(config.prompts.system_template.contains("{context}"));
    }

    #[test]
    fn secrets_file_is_merged_over_public_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "openai:\n  chat_model: gpt-4o-mini\nretriever:\n  k: 5\n",
        )
        .unwrap();
        fs::write(dir.path().join("secrets.yaml"), "openai:\n  api_key: sk-test\n").unwrap();

        let config = service_in(dir.path()).load_with(|_| None).unwrap();

        assert_eq!(config.openai.chat_model, "gpt-4o-mini");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.retriever.k, 5);
        assert_eq!(config.splitter.chunk_size, 500);
    }

    #[test]
    fn load_applies_env_over_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("secrets.yaml"), "openai:\n  api_key: sk-file\n").unwrap();

        let config = service_in(dir.path())
            .load_with(|name| match name {
                "OPENAI_API_KEY" => Some("sk-env".to_string()),
                "OPENAI_BASE_URL" => Some("http://localhost:1234/v1".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.openai.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.openai.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn load_rejects_overlap_not_smaller_than_chunk_size() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "splitter:\n  chunk_size: 100\n  chunk_overlap: 100\n",
        )
        .unwrap();

        let err = service_in(dir.path()).load_with(|_| None).unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
        assert!(err.to_string().contains("splitter.chunk_overlap"));
    }

    #[test]
    fn load_reads_defaults_from_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = service_in(dir.path()).load().unwrap();

        assert_eq!(config.retriever.k, 3);
        assert_eq!(config.loader.selector, "body");
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "openai: [unclosed").unwrap();

        assert!(matches!(load_yaml_file(&path), Err(RagError::Config(_))));
    }

    #[test]
    fn scalar_top_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        fs::write(&path, "just a string").unwrap();

        assert!(load_yaml_file(&path).is_err());
    }
}
