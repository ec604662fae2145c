use serde_json::{Map, Value};

use crate::core::errors::RagError;

pub fn validate_config(config: &Value) -> Result<(), RagError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(openai) = expect_optional_object(root, "openai")? {
        validate_optional_string_field(openai, "openai.base_url", "base_url")?;
        validate_optional_string_field(openai, "openai.api_key", "api_key")?;
        validate_non_empty_string_field(openai, "openai.chat_model", "chat_model")?;
        validate_non_empty_string_field(openai, "openai.embedding_model", "embedding_model")?;
        validate_f64_field(openai, "openai.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(openai, "openai.timeout_secs", "timeout_secs", 1, 86_400)?;
        validate_u64_field(
            openai,
            "openai.embedding_batch_size",
            "embedding_batch_size",
            1,
            2048,
        )?;
        validate_bool_field(openai, "openai.strip_new_lines", "strip_new_lines")?;
    }

    if let Some(loader) = expect_optional_object(root, "loader")? {
        validate_non_empty_string_field(loader, "loader.url", "url")?;
        validate_non_empty_string_field(loader, "loader.selector", "selector")?;
        validate_u64_field(loader, "loader.timeout_secs", "timeout_secs", 1, 86_400)?;
        validate_optional_string_field(loader, "loader.user_agent", "user_agent")?;
    }

    if let Some(splitter) = expect_optional_object(root, "splitter")? {
        validate_u64_field(splitter, "splitter.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(
            splitter,
            "splitter.chunk_overlap",
            "chunk_overlap",
            0,
            1_000_000,
        )?;

        let chunk_size = splitter.get("chunk_size").and_then(Value::as_u64);
        let chunk_overlap = splitter.get("chunk_overlap").and_then(Value::as_u64);
        if let (Some(size), Some(overlap)) = (chunk_size, chunk_overlap) {
            if overlap >= size {
                return Err(RagError::Config(format!(
                    "Invalid config at 'splitter.chunk_overlap': must be smaller than chunk_size ({})",
                    size
                )));
            }
        }
    }

    if let Some(retriever) = expect_optional_object(root, "retriever")? {
        validate_u64_field(retriever, "retriever.k", "k", 1, 1_000)?;
    }

    if let Some(prompts) = expect_optional_object(root, "prompts")? {
        validate_non_empty_string_field(prompts, "prompts.system_template", "system_template")?;
        validate_non_empty_string_field(prompts, "prompts.query_transform", "query_transform")?;
    }

    if let Some(logging) = expect_optional_object(root, "logging")? {
        validate_optional_string_field(logging, "logging.level", "level")?;
        validate_bool_field(logging, "logging.file", "file")?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, RagError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(RagError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(RagError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(RagError::Config(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    match section.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(config_type_error(path, "string")),
    }
}

fn config_type_error(path: &str, expected: &str) -> RagError {
    RagError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
