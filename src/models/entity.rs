//! The uniform entity record returned by the cache and repository layers.
//!
//! Every D&D entity type (spell, creature, piece of equipment, ...) is
//! represented by the same envelope: a stable `slug`, a handful of fields
//! every collection shares, and a dynamic payload holding everything else
//! verbatim. Indexed scalar fields (e.g. a spell's `level`) live inside
//! `data` like any other field — the schema (see `schema.rs`) only decides
//! which of those fields the cache engine can filter on efficiently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A cached D&D entity.
///
/// `data` never contains the `embedding` field — the cache engine strips it
/// before handing a record back to a caller (vector omission invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub slug: String,
    pub name: String,
    pub document: String,
    #[serde(default)]
    pub source_api: String,
    /// Every other field, indexed or not, verbatim from the source.
    #[serde(flatten)]
    pub data: Map<String, Value>,
    /// Present only on results from `semantic_search`: cosine similarity in
    /// `[0, 1]`, higher is better.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f32>,
}

impl Entity {
    /// Build an entity from a raw JSON object (as returned by the upstream
    /// client or read from an import file). Missing `slug` is stored as an
    /// empty string per the spec's boundary behavior — callers own the
    /// consequence of colliding empty-slug rows.
    pub fn from_json(mut value: Map<String, Value>) -> Self {
        let slug = value
            .remove("slug")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let name = value
            .remove("name")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let document = value
            .remove("document")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let source_api = value
            .remove("source_api")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        value.remove("embedding");
        value.remove("_score");

        Self {
            slug,
            name,
            document,
            source_api,
            data: value,
            score: None,
        }
    }

    /// Get a scalar field from the dynamic payload.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_extracts_envelope_fields() {
        let mut obj = Map::new();
        obj.insert("slug".into(), json!("fireball"));
        obj.insert("name".into(), json!("Fireball"));
        obj.insert("document".into(), json!("srd"));
        obj.insert("level".into(), json!(3));
        obj.insert("embedding".into(), json!([0.1, 0.2]));

        let entity = Entity::from_json(obj);
        assert_eq!(entity.slug, "fireball");
        assert_eq!(entity.name, "Fireball");
        assert_eq!(entity.document, "srd");
        assert_eq!(entity.field("level"), Some(&json!(3)));
        assert!(entity.field("embedding").is_none());
    }

    #[test]
    fn missing_slug_defaults_to_empty_string() {
        let obj = Map::new();
        let entity = Entity::from_json(obj);
        assert_eq!(entity.slug, "");
    }
}
