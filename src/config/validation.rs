use crate::config::types::{
    Config, CrawlConfig, FieldsConfig, OutputConfig, SessionConfig, SinkFormat, TaskSourceConfig,
};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_session_config(&config.session)?;
    validate_output_config(&config.output)?;
    validate_fields_config(&config.fields)?;
    if let Some(tasks) = &config.tasks {
        validate_task_source(tasks, &config.fields)?;
    }
    Ok(())
}

/// Validates orchestration tunables
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_base_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms must be >= 100ms, got {}ms",
            config.backoff_base_ms
        )));
    }

    if config.backoff_cap_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_cap_ms ({}ms) must be >= backoff_base_ms ({}ms)",
            config.backoff_cap_ms, config.backoff_base_ms
        )));
    }

    if config.pace_min_ms > config.pace_max_ms {
        return Err(ConfigError::Validation(format!(
            "pace_min_ms ({}ms) must be <= pace_max_ms ({}ms)",
            config.pace_min_ms, config.pace_max_ms
        )));
    }

    if config.item_cap == Some(0) {
        return Err(ConfigError::Validation(
            "item_cap must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch session settings
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_ms < 1000 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 1000ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    Ok(())
}

/// Validates that the chosen sink format has the paths it needs
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    match config.format {
        SinkFormat::Csv => {
            if config.results_path.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Validation(
                    "results_path is required for the csv output format".to_string(),
                ));
            }
        }
        SinkFormat::Json => {
            if config.output_dir.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::Validation(
                    "output_dir is required for the json output format".to_string(),
                ));
            }
        }
    }

    if config.ledger_path.is_empty() {
        return Err(ConfigError::Validation(
            "ledger_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the record field set
fn validate_fields_config(config: &FieldsConfig) -> Result<(), ConfigError> {
    if config.names.is_empty() {
        return Err(ConfigError::Validation(
            "fields.names cannot be empty".to_string(),
        ));
    }

    if config.key_fields.is_empty() {
        return Err(ConfigError::Validation(
            "fields.key_fields cannot be empty".to_string(),
        ));
    }

    for key in &config.key_fields {
        if !config.names.contains(key) {
            return Err(ConfigError::Validation(format!(
                "key field '{}' is not in fields.names",
                key
            )));
        }
    }

    for req in &config.required {
        if !config.names.contains(req) {
            return Err(ConfigError::Validation(format!(
                "required field '{}' is not in fields.names",
                req
            )));
        }
    }

    Ok(())
}

/// Validates the CSV task source section
fn validate_task_source(config: &TaskSourceConfig, _fields: &FieldsConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "tasks.path cannot be empty".to_string(),
        ));
    }

    if config.id_column.is_empty() || config.label_column.is_empty() {
        return Err(ConfigError::Validation(
            "tasks.id_column and tasks.label_column cannot be empty".to_string(),
        ));
    }

    if config.key_columns.is_empty() {
        return Err(ConfigError::Validation(
            "tasks.key_columns cannot be empty".to_string(),
        ));
    }

    Ok(())
}
