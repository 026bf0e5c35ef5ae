//! Filesystem path helpers shared by the persistence layers.

use std::env;
use std::path::PathBuf;

use dirs_next::{config_dir, home_dir};

/// Directory name under the platform config directory.
pub const APP_CONFIG_DIR: &str = "crowdmap";

/// Expand a leading `~` (Unix or Windows separator) into the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = trimmed.strip_prefix("~\\") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}

/// Like [`expand_tilde`], but leaves paths that do not start with `~` untouched.
pub fn expand_tilde_path(path: PathBuf) -> PathBuf {
    if let Some(first) = path.components().next()
        && first.as_os_str() != "~"
    {
        return path;
    }
    expand_tilde(&path.to_string_lossy())
}

/// Resolve a config file path: the value of `env_var` when set and non-empty,
/// otherwise `<config_dir>/crowdmap/<file_name>`.
pub fn config_file_path(env_var: &str, file_name: &str) -> PathBuf {
    if let Ok(path) = env::var(env_var)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_CONFIG_DIR)
        .join(file_name)
}
