use super::types::*;
use crate::config::{expand_env_vars, expand_tilde, unexpanded_env_vars};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse a YAML document into a validated config
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);

    let unset = unexpanded_env_vars(&yaml_string);
    if !unset.is_empty() {
        return Err(ConfigError::Validation(format!(
            "environment variables are not set: {}",
            unset.join(", ")
        )));
    }

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn expand_paths(config: &mut Config) {
    config.logging.dir = expand_tilde(&config.logging.dir);
    config.client.db_dir = expand_tilde(&config.client.db_dir);
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.client.db_file.trim().is_empty() {
        errors.push("client.db_file must not be empty".to_string());
    }

    if config.client.request_timeout.is_zero() {
        errors.push("client.request_timeout must be greater than zero".to_string());
    }

    if !is_host_port(&config.server.listen) {
        errors.push(format!(
            "server.listen '{}' must be <host>:<port>",
            config.server.listen
        ));
    }

    if config.server.max_paragraphs == 0 {
        errors.push("server.max_paragraphs must be greater than zero".to_string());
    }

    if config.server.max_words == 0 {
        errors.push("server.max_words must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

/// `<host>:<port>`; an IPv6 host must be bracketed
fn is_host_port(listen: &str) -> bool {
    let Some((host, port)) = listen.rsplit_once(':') else {
        return false;
    };
    if port.parse::<u16>().is_err() {
        return false;
    }
    match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        Some(v6) => v6.parse::<std::net::Ipv6Addr>().is_ok(),
        None => !host.is_empty() && !host.contains(':'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config.client.db_file, "loremipsum.duckdb");
        assert_eq!(config.client.request_timeout, Duration::from_secs(30));
        assert_eq!(config.client.stamp_policy, StampPolicy::PerRun);
        assert_eq!(config.server.listen, "127.0.0.1:8000");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
logging:
  dir: /var/log/lorem
  level: debug
client:
  db_dir: /tmp/lorem-db
  request_timeout: 5s
  stamp_policy: per_task
server:
  listen: 0.0.0.0:9000
  max_paragraphs: 50
  max_words: 500
"#;
        let config = parse_config(yaml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.client.db_path(),
            Path::new("/tmp/lorem-db/loremipsum.duckdb")
        );
        assert_eq!(config.client.request_timeout, Duration::from_secs(5));
        assert_eq!(config.client.stamp_policy, StampPolicy::PerTask);
        assert_eq!(config.server.max_paragraphs, 50);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let yaml = r#"
server:
  listen: not-an-address
  max_paragraphs: 0
  max_words: 0
"#;
        match parse_config(yaml) {
            Err(ConfigError::ValidationList(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_listen_accepts_host_names() {
        assert!(is_host_port("localhost:8000"));
        assert!(is_host_port("0.0.0.0:80"));
        assert!(!is_host_port(":8000"));
        assert!(!is_host_port("localhost"));
        assert!(!is_host_port("localhost:99999"));
        assert!(is_host_port("[::1]:8000"));
        assert!(!is_host_port("::1:8000"));
        assert!(!is_host_port("[not-an-address]:8000"));
    }

    #[test]
    fn test_unset_env_var_is_reported() {
        let yaml = "client:\n  db_dir: $env{LOREM_PARSE_UNSET_DIR}/db\n";
        match parse_config(yaml) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("LOREM_PARSE_UNSET_DIR")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_stamp_policy_is_rejected() {
        let yaml = "client:\n  stamp_policy: sometimes\n";
        assert!(matches!(parse_config(yaml), Err(ConfigError::YamlParse(_))));
    }
}
