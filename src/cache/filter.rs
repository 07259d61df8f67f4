//! Filter expression grammar (§4.2): `field == value`, `field in [..]`,
//! conjunction with `and`, `None` dropped. Only indexed fields (per the
//! collection's schema) are pushed into the SurrealQL WHERE clause; any
//! other filter key is still honored, but as a client-side post-filter over
//! the dynamic payload (no performance contract, per spec).
//!
//! `>=`/`<=` range predicates on numeric indexed fields are the spec's named
//! "well-defined extension" (§4.2) for ranges like creature CR — used by
//! `CreatureRepository`'s `cr_min`/`cr_max`.

use serde_json::Value as Json;

use crate::models::schema::CollectionSchema;
use crate::models::Entity;

/// A single filter value. Lists are used for `IN` membership.
#[derive(Debug, Clone)]
pub enum FilterValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrList(Vec<String>),
}

impl FilterValue {
    fn to_json(&self) -> Json {
        match self {
            FilterValue::Str(s) => Json::String(s.clone()),
            FilterValue::Int(i) => Json::from(*i),
            FilterValue::Float(f) => Json::from(*f),
            FilterValue::Bool(b) => Json::Bool(*b),
            FilterValue::StrList(items) => {
                Json::Array(items.iter().map(|s| Json::String(s.clone())).collect())
            }
        }
    }

    fn is_list(&self) -> bool {
        matches!(self, FilterValue::StrList(_))
    }
}

/// A `>=` or `<=` range bound on a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Ge,
    Le,
}

/// A set of scalar filters plus the special `document` membership filter,
/// combined with AND semantics. Construct with `Filters::new()` and the
/// builder methods, or `Filters::default()` for "no filters".
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub document: Option<Vec<String>>,
    pub fields: Vec<(String, FilterValue)>,
    pub ranges: Vec<(String, RangeOp, f64)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(mut self, docs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.document = Some(docs.into_iter().map(Into::into).collect());
        self
    }

    pub fn eq_str(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((field.into(), FilterValue::Str(value.into())));
        self
    }

    pub fn eq_int(mut self, field: impl Into<String>, value: i64) -> Self {
        self.fields.push((field.into(), FilterValue::Int(value)));
        self
    }

    pub fn eq_float(mut self, field: impl Into<String>, value: f64) -> Self {
        self.fields.push((field.into(), FilterValue::Float(value)));
        self
    }

    pub fn eq_bool(mut self, field: impl Into<String>, value: bool) -> Self {
        self.fields.push((field.into(), FilterValue::Bool(value)));
        self
    }

    pub fn ge(mut self, field: impl Into<String>, value: f64) -> Self {
        self.ranges.push((field.into(), RangeOp::Ge, value));
        self
    }

    pub fn le(mut self, field: impl Into<String>, value: f64) -> Self {
        self.ranges.push((field.into(), RangeOp::Le, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_none() && self.fields.is_empty() && self.ranges.is_empty()
    }
}

/// Result of compiling `Filters` against a collection's schema: the SQL
/// fragment + bindings to send to SurrealDB, and the leftover filters that
/// must be applied client-side because they aren't indexed.
pub struct CompiledFilter {
    /// `""` if there are no filters at all, otherwise `"WHERE a = $a AND b IN $b"`.
    pub where_clause: String,
    pub bindings: Vec<(String, Json)>,
    pub client_side: Vec<(String, FilterValue)>,
    pub client_side_ranges: Vec<(String, RangeOp, f64)>,
}

/// Compile `filters` against `schema`'s indexed-field whitelist.
pub fn compile(schema: &CollectionSchema, filters: &Filters) -> CompiledFilter {
    let mut predicates = Vec::new();
    let mut bindings = Vec::new();
    let mut client_side = Vec::new();
    let mut next_param = 0usize;

    let mut bind = |name_hint: &str, value: Json, bindings: &mut Vec<(String, Json)>, next_param: &mut usize| {
        let key = format!("{name_hint}_{next_param}");
        *next_param += 1;
        bindings.push((key.clone(), value));
        key
    };

    if let Some(docs) = &filters.document {
        if docs.is_empty() {
            // Empty documents list short-circuits to "match nothing" — the
            // caller (get_entities/semantic_search) is expected to detect
            // this and return [] without querying at all, per the boundary
            // behavior in §8; compiling a clause that can never match is a
            // defensive fallback if that short-circuit is bypassed.
            predicates.push("false".to_string());
        } else {
            let key = bind("document", FilterValue::StrList(docs.clone()).to_json(), &mut bindings, &mut next_param);
            predicates.push(format!("document IN ${key}"));
        }
    }

    for (field, value) in &filters.fields {
        let indexed = schema.indexed_fields.iter().any(|f| f.name == *field);
        if !indexed {
            client_side.push((field.clone(), value.clone()));
            continue;
        }
        let key = bind(field, value.to_json(), &mut bindings, &mut next_param);
        if value.is_list() {
            predicates.push(format!("{field} IN ${key}"));
        } else {
            predicates.push(format!("{field} = ${key}"));
        }
    }

    let mut client_side_ranges = Vec::new();
    for (field, op, value) in &filters.ranges {
        let indexed = schema.indexed_fields.iter().any(|f| f.name == *field);
        if !indexed {
            client_side_ranges.push((field.clone(), *op, *value));
            continue;
        }
        let key = bind(field, Json::from(*value), &mut bindings, &mut next_param);
        let operator = match op {
            RangeOp::Ge => ">=",
            RangeOp::Le => "<=",
        };
        predicates.push(format!("{field} {operator} ${key}"));
    }

    let where_clause = if predicates.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", predicates.join(" AND "))
    };

    CompiledFilter {
        where_clause,
        bindings,
        client_side,
        client_side_ranges,
    }
}

/// Look up `field` on `entity`, checking the envelope fields
/// (`slug`/`name`/`document`/`source_api`) that `Entity::from_json` hoists
/// out of the dynamic payload before falling back to `data`. Without this,
/// a client-side filter on one of those four fields (e.g. the structured
/// backend's `name` fallback for an unsupported semantic query) could never
/// match, since `data` never contains them.
fn field_value(entity: &Entity, field: &str) -> Option<Json> {
    match field {
        "slug" => Some(Json::String(entity.slug.clone())),
        "name" => Some(Json::String(entity.name.clone())),
        "document" => Some(Json::String(entity.document.clone())),
        "source_api" => Some(Json::String(entity.source_api.clone())),
        _ => entity.data.get(field).cloned(),
    }
}

/// Apply leftover client-side filters (equality/membership and ranges) to an
/// entity, checking both its envelope fields and its dynamic payload.
pub fn matches_client_side(
    entity: &Entity,
    client_side: &[(String, FilterValue)],
    client_side_ranges: &[(String, RangeOp, f64)],
) -> bool {
    let eq_ok = client_side.iter().all(|(field, value)| {
        let Some(actual) = field_value(entity, field) else {
            return false;
        };
        match value {
            FilterValue::StrList(allowed) => actual
                .as_str()
                .map(|s| allowed.iter().any(|a| a == s))
                .unwrap_or(false),
            other => actual == other.to_json(),
        }
    });
    if !eq_ok {
        return false;
    }
    client_side_ranges.iter().all(|(field, op, bound)| {
        let Some(actual) = field_value(entity, field).and_then(|v| v.as_f64()) else {
            return false;
        };
        match op {
            RangeOp::Ge => actual >= *bound,
            RangeOp::Le => actual <= *bound,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::schema_for;

    #[test]
    fn indexed_field_becomes_sql_predicate() {
        let schema = schema_for("spells");
        let filters = Filters::new().eq_int("level", 3);
        let compiled = compile(&schema, &filters);
        assert!(compiled.where_clause.contains("level = $"));
        assert!(compiled.client_side.is_empty());
    }

    #[test]
    fn non_indexed_field_is_deferred_client_side() {
        let schema = schema_for("spells");
        let filters = Filters::new().eq_str("not_indexed", "x");
        let compiled = compile(&schema, &filters);
        assert!(!compiled.where_clause.contains("not_indexed"));
        assert_eq!(compiled.client_side.len(), 1);
    }

    #[test]
    fn document_filter_uses_in_membership() {
        let schema = schema_for("spells");
        let filters = Filters::new().document(["srd", "homebrew"]);
        let compiled = compile(&schema, &filters);
        assert!(compiled.where_clause.contains("document IN $"));
    }

    #[test]
    fn empty_filters_produce_empty_clause() {
        let schema = schema_for("spells");
        let compiled = compile(&schema, &Filters::new());
        assert_eq!(compiled.where_clause, "");
    }

    #[test]
    fn indexed_numeric_range_becomes_sql_predicate() {
        let schema = schema_for("creatures");
        let filters = Filters::new().ge("challenge_rating", 5.0).le("challenge_rating", 10.0);
        let compiled = compile(&schema, &filters);
        assert!(compiled.where_clause.contains("challenge_rating >= $"));
        assert!(compiled.where_clause.contains("challenge_rating <= $"));
        assert!(compiled.client_side_ranges.is_empty());
    }

    #[test]
    fn non_indexed_range_is_deferred_client_side() {
        let schema = schema_for("spells");
        let filters = Filters::new().ge("not_indexed", 1.0);
        let compiled = compile(&schema, &filters);
        assert!(compiled.where_clause.is_empty());
        assert_eq!(compiled.client_side_ranges.len(), 1);
    }

    #[test]
    fn client_side_filter_on_name_matches_the_envelope_field() {
        let entity = Entity::from_json(
            [
                ("slug".to_string(), Json::from("fire-bolt")),
                ("name".to_string(), Json::from("fire damage")),
            ]
            .into_iter()
            .collect(),
        );
        let client_side = vec![("name".to_string(), FilterValue::Str("fire damage".to_string()))];
        assert!(matches_client_side(&entity, &client_side, &[]));
    }

    #[test]
    fn client_side_filter_on_name_rejects_a_mismatch() {
        let entity = Entity::from_json(
            [
                ("slug".to_string(), Json::from("fire-bolt")),
                ("name".to_string(), Json::from("fire damage")),
            ]
            .into_iter()
            .collect(),
        );
        let client_side = vec![("name".to_string(), FilterValue::Str("ice storm".to_string()))];
        assert!(!matches_client_side(&entity, &client_side, &[]));
    }
}
