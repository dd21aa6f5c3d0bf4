//! Shared, reloadable recipe catalog.
//!
//! Readers take an `Arc<NameIndex>` snapshot and never block a reload for
//! longer than the pointer swap. A reload builds a complete new index off
//! to the side and only publishes it once loading succeeded, so a failed
//! reload leaves the previous catalog in place.
//!
//! Each published index carries a SHA-256 fingerprint of its normalized
//! content, which lets callers tell whether a reload actually changed
//! anything.

use anyhow::Result;
use guided_kitchen_core::NameIndex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::config::RecipesConfig;
use crate::loader::{load_recipes, LoadReport};

struct Published {
    index: Arc<NameIndex>,
    fingerprint: String,
}

pub struct Catalog {
    config: RecipesConfig,
    current: RwLock<Published>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadSummary {
    pub changed: bool,
    pub recipes: usize,
    pub fingerprint: String,
    pub report: LoadReport,
}

impl Catalog {
    /// Load the configured directory and publish the result.
    pub fn load(config: &RecipesConfig) -> Result<(Self, LoadReport)> {
        let (index, report) = load_recipes(config)?;
        let catalog = Self::with_index(config.clone(), index);
        Ok((catalog, report))
    }

    /// Wrap an already-built index. Reloads still read `config.dir`.
    pub fn with_index(config: RecipesConfig, index: NameIndex) -> Self {
        let fingerprint = fingerprint(&index);
        Self {
            config,
            current: RwLock::new(Published {
                index: Arc::new(index),
                fingerprint,
            }),
        }
    }

    /// The index as of now. Later reloads do not affect the returned snapshot.
    pub fn snapshot(&self) -> Arc<NameIndex> {
        Arc::clone(&self.read().index)
    }

    pub fn fingerprint(&self) -> String {
        self.read().fingerprint.clone()
    }

    pub fn len(&self) -> usize {
        self.read().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-read the recipe directory and swap in the new index.
    pub fn reload(&self) -> Result<ReloadSummary> {
        let (index, report) = load_recipes(&self.config)?;
        let new_fingerprint = fingerprint(&index);
        let recipes = index.len();

        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let changed = current.fingerprint != new_fingerprint;
        *current = Published {
            index: Arc::new(index),
            fingerprint: new_fingerprint.clone(),
        };
        drop(current);

        info!(recipes, changed, "catalog reloaded");
        Ok(ReloadSummary {
            changed,
            recipes,
            fingerprint: new_fingerprint,
            report,
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Published> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Hex SHA-256 over every record's normalized fields, in index order.
pub fn fingerprint(index: &NameIndex) -> String {
    let mut hasher = Sha256::new();
    for record in index.iter() {
        hasher.update(record.lookup_key.as_bytes());
        hasher.update([0u8]);
        hasher.update(record.display_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(record.description.as_bytes());
        for ingredient in &record.ingredients {
            hasher.update([1u8]);
            hasher.update(ingredient.as_bytes());
        }
        for step in &record.steps {
            hasher.update([2u8]);
            hasher.update(step.as_bytes());
        }
        hasher.update(record.raw.to_string().as_bytes());
        hasher.update([0xffu8]);
    }
    format!("{:x}", hasher.finalize())
}
