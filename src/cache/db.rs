//! Embedded SurrealDB connection, adapted from the teacher's single-process
//! RocksDB path. LoreKeeper never needs the remote/WebSocket mode, so only
//! that half of the original `DbConfig` survives.

use std::path::Path;

use surrealdb::engine::any::Any;
use surrealdb::opt::capabilities::Capabilities;
use surrealdb::Surreal;

use crate::error::Result;

/// Unified database handle type.
pub type LoreDb = Surreal<Any>;

const NAMESPACE: &str = "lorekeeper";
const DATABASE: &str = "cache";

/// Open (creating if absent) the embedded RocksDB-backed store at `db_path`.
pub async fn open(db_path: &Path) -> Result<LoreDb> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let config = surrealdb::opt::Config::new()
        .capabilities(Capabilities::all().with_all_experimental_features_allowed());
    let db = surrealdb::engine::any::connect((
        format!("rocksdb:{}", db_path.display()),
        config,
    ))
    .await?;
    db.use_ns(NAMESPACE).use_db(DATABASE).await?;
    Ok(db)
}
