//! Repository layer (§4.4): one repository per domain, each implementing
//! cache-aside (try cache -> on miss, fetch upstream, store, return) and
//! routing between structured and semantic queries.
//!
//! `RepositoryFactory` holds the shared upstream client and cache and builds
//! each domain repository with them injected (§9: explicit constructor
//! injection, not a module-level mutable context). The process-wide cache
//! singleton is an optional optimization (`shared_cache`/`reset_cache`), not
//! a correctness requirement — repositories work fine built directly around
//! a test-local cache.

pub mod character_option;
pub mod creature;
pub mod equipment;
pub mod rule;
pub mod spell;

pub use character_option::{CharacterOptionQuery, CharacterOptionRepository};
pub use creature::{CreatureQuery, CreatureRepository};
pub use equipment::{EquipmentQuery, EquipmentRepository};
pub use rule::{RuleQuery, RuleRepository};
pub use spell::{SpellQuery, SpellRepository};

use std::path::Path;
use std::sync::Arc;
use std::sync::OnceLock;

use tokio::sync::Mutex;

use crate::cache::{open_cache, CacheProtocol};
use crate::client::UpstreamClient;
use crate::config::Config;
use crate::embedding::{resolve_model, LocalEmbeddingService};
use crate::error::Result;

/// Default number of results a repository's `search` returns when the
/// caller doesn't set `limit` explicitly.
pub const DEFAULT_LIMIT: usize = 20;

fn cache_slot() -> &'static Mutex<Option<Arc<dyn CacheProtocol>>> {
    static SLOT: OnceLock<Mutex<Option<Arc<dyn CacheProtocol>>>> = OnceLock::new();
    SLOT.get_or_init(|| Mutex::new(None))
}

/// The process-wide shared cache instance, built from `config`/`data_path`
/// on first call and reused by every later call (§4.4: "a process-wide
/// shared cache singleton, lazy-created via the cache factory from config").
pub async fn shared_cache(config: &Config, data_path: &Path) -> Result<Arc<dyn CacheProtocol>> {
    let mut slot = cache_slot().lock().await;
    if let Some(cache) = slot.as_ref() {
        return Ok(cache.clone());
    }
    let db_path = config
        .db_path
        .as_deref()
        .map(crate::config::expand_tilde)
        .unwrap_or_else(|| data_path.join("lorekeeper.db"));
    let embedding_config = resolve_model(&config.embedding_model)?;
    let embedding = Arc::new(LocalEmbeddingService::new(embedding_config));
    let cache = open_cache(config.cache_backend, db_path, embedding).await?;
    *slot = Some(cache.clone());
    Ok(cache)
}

/// Drop the shared cache singleton so the next `shared_cache` call rebuilds
/// it from scratch. For test isolation between cases that rely on the
/// singleton rather than constructing a `RepositoryFactory` directly.
pub async fn reset_cache() {
    *cache_slot().lock().await = None;
}

/// Builds one repository per domain, injecting a shared `client` and
/// `cache` into each (§4.4: "each repository takes client and cache by
/// construction").
#[derive(Clone)]
pub struct RepositoryFactory {
    client: Arc<dyn UpstreamClient>,
    cache: Arc<dyn CacheProtocol>,
}

impl RepositoryFactory {
    pub fn new(client: Arc<dyn UpstreamClient>, cache: Arc<dyn CacheProtocol>) -> Self {
        Self { client, cache }
    }

    /// Build a factory around the process-wide shared cache.
    pub async fn from_config(
        client: Arc<dyn UpstreamClient>,
        config: &Config,
        data_path: &Path,
    ) -> Result<Self> {
        let cache = shared_cache(config, data_path).await?;
        Ok(Self::new(client, cache))
    }

    pub fn cache(&self) -> Arc<dyn CacheProtocol> {
        self.cache.clone()
    }

    pub fn spells(&self) -> SpellRepository {
        SpellRepository::new(self.client.clone(), self.cache.clone())
    }

    pub fn creatures(&self) -> CreatureRepository {
        CreatureRepository::new(self.client.clone(), self.cache.clone())
    }

    pub fn equipment(&self) -> EquipmentRepository {
        EquipmentRepository::new(self.client.clone(), self.cache.clone())
    }

    pub fn character_options(&self) -> CharacterOptionRepository {
        CharacterOptionRepository::new(self.client.clone(), self.cache.clone())
    }

    pub fn rules(&self) -> RuleRepository {
        RuleRepository::new(self.client.clone(), self.cache.clone())
    }
}
