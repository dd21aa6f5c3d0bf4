//! Recipe schema normalization.
//!
//! Recipe documents in the wild disagree on shape: ingredients arrive as a
//! flat list or grouped by category, names as plain strings or localized
//! maps, steps as loosely typed objects. This module resolves every variant
//! once, at load time, into the canonical [`RecipeRecord`] sequences.
//!
//! # Rules
//!
//! | Field | Accepted shapes | Fallback |
//! |-------|-----------------|----------|
//! | `name` | `{"en": "..."}`, `"..."` | filename stem, then `"Unnamed Recipe"` |
//! | `description` | `"..."`, `{"en": "..."}` | `"No description available."` |
//! | `ingredients` | `{category: [item]}`, `[item]` | `["Traditional ingredients"]` |
//! | `steps` | `[{"instruction": "..."}]` | prepare / cook / serve placeholder |
//!
//! Normalization is a pure function of the document, so running it again on
//! a record's `raw` field reproduces the same sequences.

use serde_json::{Map, Value};

use crate::models::{lookup_key, RecipeRecord, DEFAULT_DESCRIPTION, UNNAMED_RECIPE};

/// Substituted when no ingredient item can be rendered.
pub const PLACEHOLDER_INGREDIENT: &str = "Traditional ingredients";

/// Substituted when no usable step remains.
pub const PLACEHOLDER_STEPS: [&str; 3] = [
    "Prepare the ingredients",
    "Cook according to traditional methods",
    "Serve and enjoy",
];

/// The two ingredient layouts found in recipe documents.
#[derive(Debug, Clone, Copy)]
pub enum IngredientSource<'a> {
    /// `{"Main": [...], "Spices": [...]}`: category order, then item order.
    Grouped(&'a Map<String, Value>),
    /// `[...]`
    Flat(&'a [Value]),
    /// Field absent or of an unusable type.
    Missing,
}

impl<'a> IngredientSource<'a> {
    pub fn from_raw(raw: &'a Value) -> Self {
        match raw.get("ingredients") {
            Some(Value::Object(groups)) => IngredientSource::Grouped(groups),
            Some(Value::Array(items)) => IngredientSource::Flat(items.as_slice()),
            _ => IngredientSource::Missing,
        }
    }

    /// All ingredient items in document order, categories flattened.
    pub fn items(&self) -> Vec<&'a Value> {
        match *self {
            IngredientSource::Grouped(groups) => groups
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .collect(),
            IngredientSource::Flat(items) => items.iter().collect(),
            IngredientSource::Missing => Vec::new(),
        }
    }
}

/// Build a [`RecipeRecord`] from one raw recipe object.
///
/// `file_stem` is the name of the file the recipe came from, without
/// extension, used when the document carries no usable name.
pub fn normalize_recipe(raw: Value, file_stem: Option<&str>) -> RecipeRecord {
    let display_name = resolve_display_name(&raw, file_stem);
    let description = raw
        .get("description")
        .and_then(localized_text)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    RecipeRecord {
        lookup_key: lookup_key(&display_name),
        display_name,
        description,
        ingredients: normalize_ingredients(&raw),
        steps: normalize_steps(&raw),
        raw,
    }
}

/// Resolve the display name: `name.en`, then a plain `name` string, then
/// the filename stem, then [`UNNAMED_RECIPE`].
pub fn resolve_display_name(raw: &Value, file_stem: Option<&str>) -> String {
    let from_doc = match raw.get("name") {
        Some(Value::Object(localized)) => localized.get("en").and_then(Value::as_str),
        Some(Value::String(name)) => Some(name.as_str()),
        _ => None,
    };

    from_doc
        .filter(|n| !n.trim().is_empty())
        .or(file_stem.filter(|s| !s.trim().is_empty()))
        .unwrap_or(UNNAMED_RECIPE)
        .to_string()
}

/// Render the ingredient sequence, falling back to [`PLACEHOLDER_INGREDIENT`].
pub fn normalize_ingredients(raw: &Value) -> Vec<String> {
    let rendered: Vec<String> = IngredientSource::from_raw(raw)
        .items()
        .into_iter()
        .filter_map(render_ingredient)
        .collect();

    if rendered.is_empty() {
        vec![PLACEHOLDER_INGREDIENT.to_string()]
    } else {
        rendered
    }
}

/// Keep every step object that carries an `instruction` string, falling
/// back to [`PLACEHOLDER_STEPS`].
pub fn normalize_steps(raw: &Value) -> Vec<String> {
    let steps: Vec<String> = raw
        .get("steps")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_object()?.get("instruction")?.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if steps.is_empty() {
        PLACEHOLDER_STEPS.iter().map(|s| s.to_string()).collect()
    } else {
        steps
    }
}

/// Render one item as `"{quantity} {unit} {name}"`, outer whitespace trimmed.
///
/// Items without a name are dropped. A bare string is taken as the name.
fn render_ingredient(item: &Value) -> Option<String> {
    match item {
        Value::String(name) if !name.trim().is_empty() => Some(name.trim().to_string()),
        Value::Object(fields) => {
            let name = fields
                .get("name")
                .and_then(localized_text)
                .filter(|n| !n.trim().is_empty())?;
            let quantity = fields.get("quantity").map(scalar_text).unwrap_or_default();
            let unit = fields.get("unit").map(scalar_text).unwrap_or_default();
            Some(format!("{} {} {}", quantity, unit, name).trim().to_string())
        }
        _ => None,
    }
}

fn localized_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(localized) => localized.get("en")?.as_str().map(str::to_string),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
