//! Core data models used throughout Guided Kitchen.
//!
//! A [`RecipeRecord`] is the canonical, normalized form of one recipe
//! document. Records are built once by [`crate::normalize::normalize_recipe`]
//! and never mutated afterwards.

use serde::Serialize;
use serde_json::Value;

/// Name used when a recipe has no name field and no filename to fall back on.
pub const UNNAMED_RECIPE: &str = "Unnamed Recipe";

/// Description used when the document has none.
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

/// Canonical unit of recipe knowledge.
///
/// `ingredients` and `steps` are never empty: the normalizer substitutes
/// placeholder content, so consumers need no empty-sequence handling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeRecord {
    /// Human-readable name.
    pub display_name: String,
    /// `display_name` lowercased and trimmed. Unique within a [`crate::NameIndex`].
    pub lookup_key: String,
    pub description: String,
    /// Rendered `"<quantity> <unit> <name>"` strings.
    pub ingredients: Vec<String>,
    /// Ordered instruction strings.
    pub steps: Vec<String>,
    /// The original document, kept for fields that are not normalized.
    pub raw: Value,
}

impl RecipeRecord {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Preparation time in minutes as written in the source document.
    pub fn prep_time_mins(&self) -> Option<String> {
        minutes_field(&self.raw, "prep_time_mins")
    }

    /// Cooking time in minutes as written in the source document.
    pub fn cook_time_mins(&self) -> Option<String> {
        minutes_field(&self.raw, "cook_time_mins")
    }

    pub fn summary(&self) -> RecipeSummary {
        RecipeSummary {
            name: self.display_name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Name and description only, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub name: String,
    pub description: String,
}

/// Compute the index key for a name: trimmed, then lowercased.
///
/// Load-time keys and query-time keys both go through this function.
pub fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn minutes_field(raw: &Value, field: &str) -> Option<String> {
    match raw.get(field)? {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(raw: Value) -> RecipeRecord {
        RecipeRecord {
            display_name: "Rolex".to_string(),
            lookup_key: "rolex".to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            ingredients: vec!["2 eggs".to_string()],
            steps: vec!["Fry".to_string()],
            raw,
        }
    }

    #[test]
    fn test_lookup_key_trims_and_folds() {
        assert_eq!(lookup_key("  Matooke Stew "), "matooke stew");
        assert_eq!(lookup_key("ROLEX"), "rolex");
        assert_eq!(lookup_key(""), "");
    }

    #[test]
    fn test_minutes_from_numbers_and_strings() {
        let r = record(json!({ "prep_time_mins": 10, "cook_time_mins": "25" }));
        assert_eq!(r.prep_time_mins().as_deref(), Some("10"));
        assert_eq!(r.cook_time_mins().as_deref(), Some("25"));
    }

    #[test]
    fn test_minutes_missing_or_unusable() {
        let r = record(json!({ "prep_time_mins": null, "cook_time_mins": "  " }));
        assert_eq!(r.prep_time_mins(), None);
        assert_eq!(r.cook_time_mins(), None);
    }
}
