//! MCP tool request/response shapes. Deliberately thin: every field maps
//! straight onto a repository query or cache call, with no business logic
//! beyond parameter validation and dictionary shaping.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Entity;
use crate::repository::DEFAULT_LIMIT;

/// Hard ceiling on any tool's `limit` parameter, regardless of what the
/// caller requests.
pub const MAX_LIMIT: usize = 200;

pub fn clamp_limit(limit: Option<usize>) -> usize {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        DEFAULT_LIMIT
    } else {
        limit.min(MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LookupInput {
    /// The entity's slug, e.g. "fireball" or "adult-red-dragon".
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SpellSearchInput {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub document: Option<Vec<String>>,
    #[serde(default)]
    pub level: Option<i64>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub concentration: Option<bool>,
    #[serde(default)]
    pub ritual: Option<bool>,
    #[serde(default)]
    pub class_key: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreatureSearchInput {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub document: Option<Vec<String>>,
    #[serde(default)]
    pub creature_type: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub cr_min: Option<f64>,
    #[serde(default)]
    pub cr_max: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EquipmentSearchInput {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub document: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CharacterOptionSearchInput {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub option_type: Option<String>,
    #[serde(default)]
    pub document: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RuleSearchInput {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub rule_type: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub document: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DocumentMetadataInput {
    pub document: String,
}

/// Uniform response wrapping a list of entities plus how many were returned.
#[derive(Debug, Clone, Serialize)]
pub struct EntityListResponse {
    pub count: usize,
    pub results: Vec<Value>,
}

impl From<Vec<Entity>> for EntityListResponse {
    fn from(entities: Vec<Entity>) -> Self {
        Self {
            count: entities.len(),
            results: entities
                .into_iter()
                .map(|e| serde_json::to_value(e).unwrap_or(Value::Null))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetadataResponse {
    pub document: String,
    pub counts: std::collections::HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatusResponse {
    pub collections: std::collections::HashMap<String, usize>,
    pub total: usize,
    pub db_path: String,
}
