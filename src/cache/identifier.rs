//! Table/field identifier validation for SurrealQL query safety.
//!
//! Collection names come from entity types chosen at the repository layer,
//! but an unknown entity type still has to become a real table name, so we
//! validate rather than trust it before it is interpolated into DDL that
//! SurrealDB can't accept as a bound parameter.

use crate::error::LoreError;

fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars().next().is_some_and(|c| c.is_ascii_lowercase())
        && s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Validate that `entity_type` is safe to use as a SurrealDB table name.
pub fn validate_table(entity_type: &str) -> Result<&str, LoreError> {
    if is_valid_identifier(entity_type) {
        Ok(entity_type)
    } else {
        Err(LoreError::ValidationError {
            slug: String::new(),
            message: format!(
                "invalid entity type '{}': must be lowercase alphanumeric with underscores",
                entity_type
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_entity_types() {
        assert!(validate_table("spells").is_ok());
        assert!(validate_table("rule_sections").is_ok());
    }

    #[test]
    fn rejects_injection_attempts() {
        assert!(validate_table("spells; DROP TABLE spells").is_err());
        assert!(validate_table("Spells").is_err());
        assert!(validate_table("").is_err());
    }
}
