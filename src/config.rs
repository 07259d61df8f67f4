//! Configuration loading: data path resolution, cache backend selection,
//! embedding model choice, and upstream catalog URL.
//!
//! Priority chain mirrors the teacher's `load_db_config`/`load_provider_config`:
//! explicit file (`{data_path}/config.toml`) > environment variables > defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Which cache backend to use for a given process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Embedded vector-capable store (default).
    Vector,
    /// Structured-only store; `semantic_search` raises `NotSupported`.
    Structured,
}

impl Default for CacheBackend {
    fn default() -> Self {
        CacheBackend::Vector
    }
}

impl CacheBackend {
    fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "vector" => Some(CacheBackend::Vector),
            "structured" => Some(CacheBackend::Structured),
            _ => None,
        }
    }
}

fn default_embedding_model() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_upstream_url() -> String {
    "https://api.open5e.com".to_string()
}

/// On-disk / env-sourced configuration for a LoreKeeper process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache_backend: CacheBackend,
    /// Overrides the default on-disk database path (`{data_path}/lorekeeper.db` implicit).
    #[serde(default)]
    pub db_path: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_upstream_url")]
    pub upstream_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_backend: CacheBackend::default(),
            db_path: None,
            embedding_model: default_embedding_model(),
            upstream_base_url: default_upstream_url(),
        }
    }
}

/// Resolve the data directory: explicit path > `LOREKEEPER_DATA_PATH` env >
/// `./.lorekeeper` (if it already exists) > `~/.lorekeeper`.
pub fn resolve_data_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| {
            std::env::var("LOREKEEPER_DATA_PATH")
                .ok()
                .map(PathBuf::from)
        })
        .or_else(|| {
            let local = Path::new(".lorekeeper");
            if local.exists() && local.is_dir() {
                Some(local.to_path_buf())
            } else {
                None
            }
        })
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".lorekeeper"))
                .unwrap_or_else(|| PathBuf::from(".lorekeeper"))
        })
}

/// Load configuration with priority:
/// 1. `{data_path}/config.toml` file
/// 2. `LOREKEEPER_CACHE_BACKEND` / `LOREKEEPER_DB_PATH` / `LOREKEEPER_EMBEDDING_MODEL` /
///    `LOREKEEPER_UPSTREAM_URL` env vars (each overrides the matching field independently)
/// 3. Built-in defaults
///
/// A malformed config file degrades to defaults with a warning rather than
/// failing startup — configuration is best-effort.
pub fn load_config(data_path: &Path) -> Config {
    let mut config = {
        let config_path = data_path.join("config.toml");
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {}", config_path.display());
                        config
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to parse {}: {}. Using defaults.",
                            config_path.display(),
                            e
                        );
                        Config::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        "Failed to read {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    Config::default()
                }
            }
        } else {
            Config::default()
        }
    };

    if let Ok(backend) = std::env::var("LOREKEEPER_CACHE_BACKEND") {
        match CacheBackend::from_str_loose(&backend) {
            Some(b) => config.cache_backend = b,
            None => tracing::warn!(
                "Unrecognized LOREKEEPER_CACHE_BACKEND '{}', ignoring",
                backend
            ),
        }
    }
    if let Ok(path) = std::env::var("LOREKEEPER_DB_PATH") {
        config.db_path = Some(path);
    }
    if let Ok(model) = std::env::var("LOREKEEPER_EMBEDDING_MODEL") {
        config.embedding_model = model;
    }
    if let Ok(url) = std::env::var("LOREKEEPER_UPSTREAM_URL") {
        config.upstream_base_url = url;
    }

    config
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_vector() {
        assert_eq!(Config::default().cache_backend, CacheBackend::Vector);
    }

    #[test]
    fn from_str_loose_accepts_known_values() {
        assert_eq!(
            CacheBackend::from_str_loose("VECTOR"),
            Some(CacheBackend::Vector)
        );
        assert_eq!(
            CacheBackend::from_str_loose("structured"),
            Some(CacheBackend::Structured)
        );
        assert_eq!(CacheBackend::from_str_loose("bogus"), None);
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths_alone() {
        let p = expand_tilde("/tmp/x");
        assert_eq!(p, PathBuf::from("/tmp/x"));
    }
}
