//! Recipe directory loader.
//!
//! Walks the configured recipe directory, parses every file whose extension
//! is recognized, normalizes each contained recipe, and builds a
//! [`NameIndex`]. One bad file never aborts the load: it is logged,
//! recorded in the [`LoadReport`], and skipped.
//!
//! # Degraded modes
//!
//! | Situation | Behaviour |
//! |-----------|-----------|
//! | Directory missing, `seed_sample = true` | create it, write a sample recipe, load it |
//! | Directory missing, `seed_sample = false` | warn, return an empty index |
//! | Path is a file | fatal: [`KitchenError::StorageNotDirectory`] |
//!
//! Files are visited in file-name order. When two recipes resolve to the
//! same lookup key, the one visited later replaces the earlier one and the
//! collision is reported.

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use guided_kitchen_core::normalize::normalize_recipe;
use guided_kitchen_core::{KitchenError, NameIndex};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::RecipesConfig;

/// File name of the recipe written on first run.
pub const SAMPLE_FILE_NAME: &str = "rolex.json";

/// Recipe written into a freshly created directory.
pub const SAMPLE_RECIPE: &str = r#"{
  "name": { "en": "Rolex", "lg": "Rolex" },
  "description": "Uganda's favourite street food: a vegetable omelette rolled in a chapati.",
  "prep_time_mins": 10,
  "cook_time_mins": 15,
  "ingredients": {
    "Main": [
      { "name": "eggs", "quantity": "2", "unit": "" },
      { "name": "chapati", "quantity": "1", "unit": "" }
    ],
    "Vegetables": [
      { "name": "tomato, diced", "quantity": "1", "unit": "" },
      { "name": "onion, chopped", "quantity": "1/2", "unit": "" },
      { "name": "cabbage, shredded", "quantity": "1/2", "unit": "cup" }
    ],
    "Seasoning": [
      { "name": "salt", "quantity": "1", "unit": "pinch" },
      { "name": "vegetable oil", "quantity": "1", "unit": "tbsp" }
    ]
  },
  "steps": [
    { "instruction": "Whisk the eggs with the tomato, onion, cabbage and salt." },
    { "instruction": "Heat the oil in a pan and pour in the egg mixture." },
    { "instruction": "Cook until set, then lay the chapati on top and flip." },
    { "instruction": "Roll the chapati around the omelette and serve hot." }
  ]
}
"#;

/// A file that could not be used.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// What happened during one load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub directory: PathBuf,
    pub files_scanned: usize,
    pub recipes_loaded: usize,
    /// Lookup keys that were defined more than once (later definition kept).
    pub duplicates: Vec<String>,
    pub skipped: Vec<SkippedFile>,
    pub directory_missing: bool,
    pub seeded_sample: bool,
}

/// Load every recipe under `config.dir` into a fresh index.
pub fn load_recipes(config: &RecipesConfig) -> Result<(NameIndex, LoadReport)> {
    let root = &config.dir;
    let mut report = LoadReport {
        directory: root.clone(),
        ..LoadReport::default()
    };

    if root.exists() && !root.is_dir() {
        return Err(KitchenError::StorageNotDirectory(root.clone()).into());
    }

    if !root.exists() {
        report.directory_missing = true;
        if !config.seed_sample {
            warn!(dir = %root.display(), "recipes folder not found; starting with no recipes");
            return Ok((NameIndex::new(), report));
        }
        seed_sample(root)?;
        report.seeded_sample = true;
        warn!(dir = %root.display(), "recipes folder not found; created it with a sample recipe");
    }

    let matcher = build_extension_set(&config.extensions)?;
    let depth = if config.recursive { usize::MAX } else { 1 };
    let mut index = NameIndex::new();

    let walker = WalkDir::new(root)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "unreadable entry in recipes folder");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if !matcher.is_match(relative) {
            continue;
        }

        report.files_scanned += 1;
        let recipes = match read_document(path) {
            Ok(recipes) => recipes,
            Err(e) => {
                warn!(error = %e, "skipping recipe file");
                report.skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let stem = path.file_stem().map(|s| s.to_string_lossy().to_string());
        for raw in recipes {
            let record = normalize_recipe(raw, stem.as_deref());
            let key = record.lookup_key.clone();
            if index.insert(record).is_some() {
                warn!(recipe = %key, file = %path.display(), "duplicate recipe name; later definition wins");
                report.duplicates.push(key);
            }
        }
    }

    report.recipes_loaded = index.len();
    info!(
        dir = %root.display(),
        files = report.files_scanned,
        recipes = report.recipes_loaded,
        skipped = report.skipped.len(),
        "recipes loaded"
    );

    Ok((index, report))
}

/// Read one file and split it into raw recipe objects.
///
/// An object yields one recipe; an array yields one per object element.
pub fn read_document(path: &Path) -> std::result::Result<Vec<Value>, KitchenError> {
    let malformed = |reason: String| KitchenError::MalformedSource {
        path: path.to_path_buf(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    parse_document(&content).map_err(malformed)
}

/// Split a JSON document into raw recipe objects.
pub fn parse_document(content: &str) -> std::result::Result<Vec<Value>, String> {
    let document: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
    match document {
        Value::Object(_) => Ok(vec![document]),
        Value::Array(items) => {
            let total = items.len();
            let objects: Vec<Value> = items.into_iter().filter(Value::is_object).collect();
            if objects.len() < total {
                debug!(dropped = total - objects.len(), "non-object array elements skipped");
            }
            Ok(objects)
        }
        other => Err(format!(
            "expected a recipe object or an array of recipes, found {}",
            json_kind(&other)
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn seed_sample(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)
        .with_context(|| format!("Failed to create recipes folder: {}", root.display()))?;
    let sample = root.join(SAMPLE_FILE_NAME);
    std::fs::write(&sample, SAMPLE_RECIPE)
        .with_context(|| format!("Failed to write sample recipe: {}", sample.display()))?;
    Ok(())
}

fn build_extension_set(extensions: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for ext in extensions {
        let ext = ext.trim().trim_start_matches('.');
        let glob = GlobBuilder::new(&format!("*.{}", ext))
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Invalid recipe extension: {}", ext))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &Path) -> RecipesConfig {
        RecipesConfig {
            dir: dir.to_path_buf(),
            ..RecipesConfig::default()
        }
    }

    #[test]
    fn test_parse_object_and_array() {
        assert_eq!(parse_document(r#"{"name": "Posho"}"#).unwrap().len(), 1);
        let items = parse_document(r#"[{"name": "A"}, 3, "x", {"name": "B"}]"#).unwrap();
        assert_eq!(items.len(), 2);
        assert!(parse_document("42").unwrap_err().contains("a number"));
        assert!(parse_document("{ not json").is_err());
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.json"), "{ \"name\": ").unwrap();
        fs::write(
            tmp.path().join("good.json"),
            r#"{"name": {"en": "Rolex"}, "steps": [{"instruction": "Fry"}]}"#,
        )
        .unwrap();

        let (index, report) = load_recipes(&config_for(tmp.path())).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.resolve("rolex").is_ok());
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("broken.json"));
    }

    #[test]
    fn test_array_file_and_name_fallbacks() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("street_food.json"),
            r#"[{"name": {"en": "Rolex"}}, {"name": "Kikomando"}, {"description": "no name"}]"#,
        )
        .unwrap();
        fs::write(tmp.path().join("matooke.json"), r#"{"description": "steamed"}"#).unwrap();

        let (index, _) = load_recipes(&config_for(tmp.path())).unwrap();
        assert_eq!(
            index.names(),
            vec!["matooke", "Rolex", "Kikomando", "street_food"]
        );
    }

    #[test]
    fn test_unrecognized_extensions_ignored() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "not a recipe").unwrap();
        fs::write(tmp.path().join("POSHO.JSON"), r#"{"name": "Posho"}"#).unwrap();

        let (index, report) = load_recipes(&config_for(tmp.path())).unwrap();
        assert_eq!(index.names(), vec!["Posho"]);
        assert_eq!(report.files_scanned, 1);
    }

    #[test]
    fn test_duplicates_last_write_wins() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("a.json"),
            r#"{"name": "Rolex", "description": "first"}"#,
        )
        .unwrap();
        fs::write(
            tmp.path().join("b.json"),
            r#"{"name": " ROLEX", "description": "second"}"#,
        )
        .unwrap();

        let (index, report) = load_recipes(&config_for(tmp.path())).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve("rolex").unwrap().description, "second");
        assert_eq!(report.duplicates, vec!["rolex"]);
    }

    #[test]
    fn test_loading_twice_is_stable() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.json"), r#"[{"name": "A"}, {"name": "B"}]"#).unwrap();
        fs::write(tmp.path().join("c.json"), r#"{"name": "C"}"#).unwrap();

        let (first, _) = load_recipes(&config_for(tmp.path())).unwrap();
        let (second, _) = load_recipes(&config_for(tmp.path())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_dir_without_seed_is_empty() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("Recipes");
        let config = RecipesConfig {
            seed_sample: false,
            ..config_for(&dir)
        };

        let (index, report) = load_recipes(&config).unwrap();
        assert!(index.is_empty());
        assert!(report.directory_missing);
        assert!(!dir.exists());
    }

    #[test]
    fn test_missing_dir_is_seeded() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data").join("Recipes");

        let (index, report) = load_recipes(&config_for(&dir)).unwrap();
        assert!(report.seeded_sample);
        assert!(dir.join(SAMPLE_FILE_NAME).exists());
        let rolex = index.resolve("Rolex").unwrap();
        assert_eq!(rolex.step_count(), 4);
        assert_eq!(rolex.ingredients[0], "2  eggs");
    }

    #[test]
    fn test_file_path_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("recipes.json");
        fs::write(&file, "{}").unwrap();

        let err = load_recipes(&config_for(&file)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KitchenError>(),
            Some(KitchenError::StorageNotDirectory(_))
        ));
    }

    #[test]
    fn test_recursive_walk() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("soups")).unwrap();
        fs::write(tmp.path().join("soups").join("groundnut.json"), r#"{"name": "Groundnut Soup"}"#)
            .unwrap();

        let (flat, _) = load_recipes(&config_for(tmp.path())).unwrap();
        assert!(flat.is_empty());

        let config = RecipesConfig {
            recursive: true,
            ..config_for(tmp.path())
        };
        let (deep, _) = load_recipes(&config).unwrap();
        assert_eq!(deep.names(), vec!["Groundnut Soup"]);
    }
}
