//! Type-specific searchable-text extraction.
//!
//! Concatenates the fields named in §4.1's extraction table, skipping
//! None/empty ones, always leading with `name` when present. This is the
//! text handed to the embedding service before a `store_entities` call.

use crate::models::Entity;

/// Build the searchable text for an entity, using the field list for its
/// entity type (falling back to `name + desc` for unknown types).
pub fn searchable_text(entity_type: &str, entity: &Entity) -> String {
    let mut parts = Vec::new();

    if !entity.name.is_empty() {
        parts.push(entity.name.clone());
    }

    match entity_type {
        "spells" => {
            push_field(&mut parts, entity, "desc");
            push_field(&mut parts, entity, "higher_level");
        }
        "creatures" => {
            push_field(&mut parts, entity, "desc");
            push_field(&mut parts, entity, "type");
            push_named_list(&mut parts, entity, "actions");
            push_named_list(&mut parts, entity, "special_abilities");
        }
        "equipment" | "weapons" | "armor" | "magicitems" => {
            push_field(&mut parts, entity, "desc");
            push_field(&mut parts, entity, "type");
            push_string_list(&mut parts, entity, "properties");
        }
        "rules" | "rule_sections" | "conditions" => {
            push_field(&mut parts, entity, "desc");
            push_field(&mut parts, entity, "content");
        }
        _ => {
            push_field(&mut parts, entity, "desc");
        }
    }

    parts.join(" ")
}

fn push_field(parts: &mut Vec<String>, entity: &Entity, key: &str) {
    if let Some(value) = entity.field(key).and_then(|v| v.as_str()) {
        if !value.trim().is_empty() {
            parts.push(value.to_string());
        }
    }
}

/// Append the `name` of every object in an array field (e.g. each action of
/// a creature).
fn push_named_list(parts: &mut Vec<String>, entity: &Entity, key: &str) {
    if let Some(items) = entity.field(key).and_then(|v| v.as_array()) {
        for item in items {
            if let Some(name) = item.get("name").and_then(|v| v.as_str()) {
                if !name.trim().is_empty() {
                    parts.push(name.to_string());
                }
            }
        }
    }
}

/// Append every string in a string-array field (e.g. equipment properties).
fn push_string_list(parts: &mut Vec<String>, entity: &Entity, key: &str) {
    if let Some(items) = entity.field(key).and_then(|v| v.as_array()) {
        for item in items {
            if let Some(s) = item.as_str() {
                if !s.trim().is_empty() {
                    parts.push(s.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn entity(fields: Vec<(&str, serde_json::Value)>) -> Entity {
        let mut obj = Map::new();
        for (k, v) in fields {
            obj.insert(k.to_string(), v);
        }
        Entity::from_json(obj)
    }

    #[test]
    fn spell_text_includes_name_desc_higher_level() {
        let e = entity(vec![
            ("slug", json!("fireball")),
            ("name", json!("Fireball")),
            ("desc", json!("A bright streak of fire.")),
            ("higher_level", json!("Damage increases by 1d6.")),
        ]);
        let text = searchable_text("spells", &e);
        assert!(text.contains("Fireball"));
        assert!(text.contains("bright streak"));
        assert!(text.contains("Damage increases"));
    }

    #[test]
    fn creature_text_includes_action_and_ability_names() {
        let e = entity(vec![
            ("slug", json!("goblin")),
            ("name", json!("Goblin")),
            ("desc", json!("A small, vicious humanoid.")),
            ("type", json!("humanoid")),
            (
                "actions",
                json!([{"name": "Scimitar", "desc": "ignored"}]),
            ),
            (
                "special_abilities",
                json!([{"name": "Nimble Escape", "desc": "ignored"}]),
            ),
        ]);
        let text = searchable_text("creatures", &e);
        assert!(text.contains("Goblin"));
        assert!(text.contains("humanoid"));
        assert!(text.contains("Scimitar"));
        assert!(text.contains("Nimble Escape"));
        assert!(!text.contains("ignored"));
    }

    #[test]
    fn unknown_type_falls_back_to_name_and_desc() {
        let e = entity(vec![
            ("slug", json!("x")),
            ("name", json!("Mystery Thing")),
            ("desc", json!("Does mysterious stuff.")),
        ]);
        let text = searchable_text("reference_tables", &e);
        assert_eq!(text, "Mystery Thing Does mysterious stuff.");
    }

    #[test]
    fn empty_fields_are_skipped() {
        let e = entity(vec![("slug", json!("x")), ("name", json!("Just A Name"))]);
        let text = searchable_text("spells", &e);
        assert_eq!(text, "Just A Name");
    }
}
