pub mod parse;
pub mod types;

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use parse::{load_config, validate_config, ConfigError};
pub use types::{ClientConfig, Config, LoggingConfig, ServerConfig, StampPolicy};

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
    })
}

/// Expands `$env{VAR_NAME}` references in a string.
/// Unset variables are left unchanged so they can be reported later.
pub fn expand_env_vars(text: &str) -> String {
    env_var_pattern()
        .replace_all(text, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
}

/// Names of `$env{...}` references still present in `text`, sorted and deduplicated
pub fn unexpanded_env_vars(text: &str) -> Vec<String> {
    let mut names: Vec<String> = env_var_pattern()
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }

    path.to_path_buf()
}

/// Resolves the config file path. Returns the first existing path from:
/// 1. Explicit path (with tilde expansion)
/// 2. ~/.config/lorem/config.yml
/// 3. /etc/lorem/config.yml
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(".config/lorem/config.yml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/lorem/config.yml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// Load the resolved config file, or fall back to built-in defaults when none exists.
pub fn load_or_default(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match resolve_config_path(explicit) {
        Some(path) => load_config(&path),
        None => Ok(Config::default()),
    }
}

/// Create `path` and any missing parents.
/// Succeeds when the directory already exists; fails when `path` is a file.
pub fn ensure_dir(path: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}
