//! Per-collection schema: which scalar fields are indexed for filtering.
//!
//! Schema is fixed at collection creation (schema monotonicity, §3.3);
//! adding a field is a migration, not a runtime operation.

/// Type of an indexed scalar field, used when building `DEFINE FIELD`
/// migrations and when coercing filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    Float,
    Bool,
    StringList,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexedField {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn f(name: &'static str, kind: FieldKind) -> IndexedField {
    IndexedField { name, kind }
}

/// A collection's indexed-field whitelist. `document` is implicit on every
/// collection and is not repeated here.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    pub table: &'static str,
    pub indexed_fields: &'static [IndexedField],
}

const DOCUMENT: IndexedField = f("document", FieldKind::String);

const SPELL_FIELDS: &[IndexedField] = &[
    DOCUMENT,
    f("level", FieldKind::Int),
    f("school", FieldKind::String),
    f("concentration", FieldKind::Bool),
    f("ritual", FieldKind::Bool),
];

const CREATURE_FIELDS: &[IndexedField] = &[
    DOCUMENT,
    // Indexed as numeric per the spec's recommended resolution of the
    // "challenge_rating as string vs. numeric range filter" open question
    // (see SPEC_FULL.md §9 / DESIGN.md) so cr_min/cr_max can be pushed down
    // as cache-side >=/<= predicates instead of a client-side post-filter.
    f("challenge_rating", FieldKind::Float),
    f("type", FieldKind::String),
    f("size", FieldKind::String),
];

const EQUIPMENT_FIELDS: &[IndexedField] = &[
    DOCUMENT,
    f("category", FieldKind::String),
    f("rarity", FieldKind::String),
];

const WEAPON_FIELDS: &[IndexedField] = &[
    DOCUMENT,
    f("category", FieldKind::String),
    f("damage_type", FieldKind::String),
];

const ARMOR_FIELDS: &[IndexedField] = &[
    DOCUMENT,
    f("category", FieldKind::String),
    f("armor_class", FieldKind::Int),
];

const MAGICITEM_FIELDS: &[IndexedField] = &[
    DOCUMENT,
    f("rarity", FieldKind::String),
    f("requires_attunement", FieldKind::Bool),
];

const CHARACTER_OPTION_FIELDS: &[IndexedField] = &[DOCUMENT, f("name", FieldKind::String)];

const RULE_FIELDS: &[IndexedField] = &[DOCUMENT, f("section", FieldKind::String)];

const DEFAULT_FIELDS: &[IndexedField] = &[DOCUMENT];

/// Look up the schema for an entity type (collection/table name). Unknown
/// entity types get the default schema (`document` only), per §3.2.
pub fn schema_for(entity_type: &str) -> CollectionSchema {
    let indexed_fields: &'static [IndexedField] = match entity_type {
        "spells" => SPELL_FIELDS,
        "creatures" => CREATURE_FIELDS,
        "equipment" => EQUIPMENT_FIELDS,
        "weapons" => WEAPON_FIELDS,
        "armor" => ARMOR_FIELDS,
        "magicitems" => MAGICITEM_FIELDS,
        "classes" | "subclasses" | "races" | "subraces" | "backgrounds" | "feats"
        | "conditions" => CHARACTER_OPTION_FIELDS,
        "rules" | "rule_sections" => RULE_FIELDS,
        _ => DEFAULT_FIELDS,
    };

    CollectionSchema {
        // Leak is unnecessary: all callers pass one of the static names
        // above or fall through to the default; we echo back a static str
        // when known and otherwise a fixed placeholder, since `table` is
        // only used for logging/migrations keyed by the known set.
        table: known_table_name(entity_type),
        indexed_fields,
    }
}

fn known_table_name(entity_type: &str) -> &'static str {
    match entity_type {
        "spells" => "spells",
        "creatures" => "creatures",
        "equipment" => "equipment",
        "weapons" => "weapons",
        "armor" => "armor",
        "magicitems" => "magicitems",
        "classes" => "classes",
        "subclasses" => "subclasses",
        "races" => "races",
        "subraces" => "subraces",
        "backgrounds" => "backgrounds",
        "feats" => "feats",
        "conditions" => "conditions",
        "rules" => "rules",
        "rule_sections" => "rule_sections",
        _ => "_default",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_entity_type_gets_document_only_schema() {
        let schema = schema_for("nonsense_type");
        assert_eq!(schema.indexed_fields.len(), 1);
        assert_eq!(schema.indexed_fields[0].name, "document");
    }

    #[test]
    fn spell_schema_includes_level_and_school() {
        let schema = schema_for("spells");
        let names: Vec<_> = schema.indexed_fields.iter().map(|f| f.name).collect();
        assert!(names.contains(&"level"));
        assert!(names.contains(&"school"));
        assert!(names.contains(&"document"));
    }

    #[test]
    fn creature_schema_indexes_challenge_rating_as_float() {
        let schema = schema_for("creatures");
        let cr = schema
            .indexed_fields
            .iter()
            .find(|f| f.name == "challenge_rating")
            .expect("challenge_rating indexed");
        assert_eq!(cr.kind, FieldKind::Float);
    }
}
