//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, LoggingConfig, PollingConfig, TidegramConfig, WebhookConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validates the entire configuration.
pub fn validate_config(config: &TidegramConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot, &config.polling)?;
    validate_polling_config(&config.polling)?;
    if let Some(webhook) = &config.webhook {
        validate_webhook_config(webhook)?;
    }
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_bot_config(bot: &BotConfig, polling: &PollingConfig) -> ConfigResult<()> {
    if bot.token.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.token"));
    }

    validate_url(&bot.api_url)?;

    if bot.request_timeout_secs <= polling.timeout_secs {
        return Err(ConfigError::validation(format!(
            "bot.request_timeout_secs ({}) must exceed polling.timeout_secs ({})",
            bot.request_timeout_secs, polling.timeout_secs
        )));
    }

    Ok(())
}

fn validate_polling_config(polling: &PollingConfig) -> ConfigResult<()> {
    if !(1..=100).contains(&polling.limit) {
        return Err(ConfigError::validation(format!(
            "polling.limit must be between 1 and 100, got {}",
            polling.limit
        )));
    }

    if let Some(kind) = polling.allowed_updates.iter().find(|kind| kind.is_media()) {
        return Err(ConfigError::validation(format!(
            "polling.allowed_updates: '{}' is not an update payload",
            kind.as_str()
        )));
    }

    Ok(())
}

fn validate_webhook_config(webhook: &WebhookConfig) -> ConfigResult<()> {
    if webhook.listen.trim().is_empty() {
        return Err(ConfigError::missing_field("webhook.listen"));
    }

    if !webhook.path.starts_with('/') {
        return Err(ConfigError::validation("webhook.path must start with '/'"));
    }

    if let Some(url) = &webhook.url {
        validate_url(url)?;
    }

    // The platform accepts 1-256 characters from A-Z, a-z, 0-9, _ and -.
    if let Some(secret) = &webhook.secret_token {
        let valid_chars = secret
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if secret.is_empty() || secret.len() > 256 || !valid_chars {
            return Err(ConfigError::validation(
                "webhook.secret_token must be 1-256 characters of A-Z, a-z, 0-9, '_' or '-'",
            ));
        }
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    validate_level("logging.level", &logging.level)?;
    for (target, level) in &logging.filters {
        validate_level(&format!("logging.filters.{target}"), level)?;
    }
    Ok(())
}

fn validate_level(field: &str, level: &str) -> ConfigResult<()> {
    if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        return Err(ConfigError::validation(format!(
            "Invalid log level for {field}: {level}. Valid values are: {LOG_LEVELS:?}"
        )));
    }
    Ok(())
}

fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("url"));
    }

    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }

    Ok(())
}
