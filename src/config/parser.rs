use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(
            r#"
[crawler]
default-crawl-delay = 2
throttle-factor = 0.05
max-workers = 50

[user-agent]
crawler-name = "testbot"
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.crawler.default_crawl_delay, 2);
        assert_eq!(config.crawler.throttle_factor, 0.05);
        assert_eq!(config.crawler.max_workers, 50);
        assert_eq!(config.user_agent.crawler_name, "testbot");
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let file = create_temp_config("");

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.crawler.default_crawl_delay, 1);
        assert_eq!(config.crawler.throttle_factor, 0.02);
        assert_eq!(config.crawler.max_workers, 100);
        assert_eq!(config.crawler.watchdog_multiplier, 10);
        assert_eq!(config.user_agent.crawler_name, "rickbot");
    }

    #[test]
    fn test_load_partial_config_keeps_other_defaults() {
        let file = create_temp_config("[crawler]\nthrottle-factor = 0.1\n");

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.crawler.throttle_factor, 0.1);
        assert_eq!(config.crawler.max_workers, 100);
        assert_eq!(config.user_agent.crawler_name, "rickbot");
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[crawler\nbroken");

        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let file = create_temp_config("[crawler]\nmax-workers = 0\n");

        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
