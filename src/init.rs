//! Shared initialization logic for MCP and CLI modes.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::client::{HttpUpstreamClient, UpstreamClient};
use crate::config::{load_config, resolve_data_path, Config};
use crate::repository::RepositoryFactory;

/// Application context holding the configuration and repository factory
/// shared between MCP server and CLI commands.
pub struct AppContext {
    pub data_path: PathBuf,
    pub config: Config,
    pub repositories: RepositoryFactory,
}

impl AppContext {
    /// Initialize application context.
    ///
    /// Data path priority: explicit path > `LOREKEEPER_DATA_PATH` env >
    /// `./.lorekeeper` (if it exists) > `~/.lorekeeper`.
    pub async fn new(explicit_path: Option<PathBuf>) -> Result<Self> {
        let data_path = resolve_data_path(explicit_path);
        std::fs::create_dir_all(&data_path)?;
        tracing::info!("Using data path: {}", data_path.display());

        let config = load_config(&data_path);
        tracing::info!(
            "Cache backend: {:?}, embedding model: {}, upstream: {}",
            config.cache_backend,
            config.embedding_model,
            config.upstream_base_url
        );

        let client: Arc<dyn UpstreamClient> =
            Arc::new(HttpUpstreamClient::new(config.upstream_base_url.clone()));

        let repositories = RepositoryFactory::from_config(client, &config, &data_path).await?;

        Ok(Self {
            data_path,
            config,
            repositories,
        })
    }
}
