//! Name index over normalized recipes.
//!
//! Keys are [`lookup_key`]s (trimmed, lowercased display names), so lookups
//! are insensitive to case and surrounding whitespace. Iteration follows
//! insertion order. Inserting a key that already exists replaces the record
//! in place (last write wins) and hands the previous record back to the
//! caller so it can be reported.
//!
//! An index is built once and then shared read-only behind an `Arc`;
//! reloading builds a fresh index instead of mutating a shared one.

use indexmap::IndexMap;

use crate::error::{KitchenError, Result};
use crate::models::{lookup_key, RecipeRecord, RecipeSummary};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameIndex {
    records: IndexMap<String, RecipeRecord>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its `lookup_key`, returning any record it replaced.
    pub fn insert(&mut self, record: RecipeRecord) -> Option<RecipeRecord> {
        self.records.insert(record.lookup_key.clone(), record)
    }

    /// Look a recipe up by name, ignoring case and surrounding whitespace.
    pub fn resolve(&self, query: &str) -> Result<&RecipeRecord> {
        self.get(query)
            .ok_or_else(|| KitchenError::NotFound(query.trim().to_string()))
    }

    pub fn get(&self, query: &str) -> Option<&RecipeRecord> {
        self.records.get(&lookup_key(query))
    }

    /// Display names of every record whose key or display name contains
    /// `keyword` (case-folded). An empty keyword matches everything.
    pub fn search(&self, keyword: &str) -> Vec<&str> {
        let needle = keyword.trim().to_lowercase();
        self.records
            .values()
            .filter(|r| {
                needle.is_empty()
                    || r.lookup_key.contains(&needle)
                    || r.display_name.to_lowercase().contains(&needle)
            })
            .map(|r| r.display_name.as_str())
            .collect()
    }

    /// Display names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.records
            .values()
            .map(|r| r.display_name.as_str())
            .collect()
    }

    pub fn summaries(&self) -> Vec<RecipeSummary> {
        self.records.values().map(RecipeRecord::summary).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipeRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<RecipeRecord> for NameIndex {
    fn from_iter<T: IntoIterator<Item = RecipeRecord>>(iter: T) -> Self {
        let mut index = NameIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_recipe;
    use serde_json::json;

    fn sample_index() -> NameIndex {
        [
            json!({ "name": { "en": "Rolex" }, "description": "Chapati and eggs" }),
            json!({ "name": "Matooke Stew" }),
            json!({ "name": "Luwombo" }),
        ]
        .into_iter()
        .map(|raw| normalize_recipe(raw, None))
        .collect()
    }

    #[test]
    fn test_resolve_ignores_case_and_whitespace() {
        let index = sample_index();
        let a = index.resolve("Rolex").unwrap();
        let b = index.resolve("rolex").unwrap();
        let c = index.resolve(" rolex ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.description, "Chapati and eggs");
    }

    #[test]
    fn test_resolve_unknown_is_not_found() {
        let index = sample_index();
        match index.resolve("  Pilau ") {
            Err(KitchenError::NotFound(name)) => assert_eq!(name, "Pilau"),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_search_substring_in_insertion_order() {
        let index = sample_index();
        assert_eq!(index.search("o"), vec!["Rolex", "Matooke Stew", "Luwombo"]);
        assert_eq!(index.search("STEW"), vec!["Matooke Stew"]);
        assert!(index.search("pilau").is_empty());
    }

    #[test]
    fn test_empty_keyword_matches_everything() {
        let index = sample_index();
        assert_eq!(index.search(""), index.names());
        assert_eq!(index.search("   ").len(), 3);
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let mut index = sample_index();
        let previous = index.insert(normalize_recipe(
            json!({ "name": "ROLEX ", "description": "Second definition" }),
            None,
        ));
        assert_eq!(previous.unwrap().description, "Chapati and eggs");
        assert_eq!(index.len(), 3);
        assert_eq!(index.resolve("rolex").unwrap().description, "Second definition");
    }
}
