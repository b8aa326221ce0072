use crate::config::types::{Config, CrawlerConfig, UserAgentConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 100 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 100, got {}",
            config.max_workers
        )));
    }

    if !config.throttle_factor.is_finite() || config.throttle_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "throttle-factor must be a non-negative number, got {}",
            config.throttle_factor
        )));
    }

    if config.watchdog_multiplier < 1 {
        return Err(ConfigError::Validation(
            "watchdog-multiplier must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.completion_poll_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "completion-poll-ms must be >= 10ms, got {}ms",
            config.completion_poll_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_reject_zero_workers() {
        let mut config = Config::default();
        config.crawler.max_workers = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_reject_too_many_workers() {
        let mut config = Config::default();
        config.crawler.max_workers = 101;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_reject_negative_throttle_factor() {
        let mut config = Config::default();
        config.crawler.throttle_factor = -0.5;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_accept_zero_throttle_factor() {
        let mut config = Config::default();
        config.crawler.throttle_factor = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_reject_empty_crawler_name() {
        let mut config = Config::default();
        config.user_agent.crawler_name = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_reject_crawler_name_with_spaces() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "my bot".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_reject_fast_completion_poll() {
        let mut config = Config::default();
        config.crawler.completion_poll_ms = 1;
        assert!(validate(&config).is_err());
    }
}
