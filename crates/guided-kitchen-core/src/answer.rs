//! Intent-based question answering.
//!
//! Questions are classified by keyword containment over the lowercased
//! text. Intents are checked in a fixed priority order and the first match
//! wins:
//!
//! | Priority | Intent | Keywords |
//! |----------|--------|----------|
//! | 1 | [`Intent::Ingredients`] | `ingredient`, `what is in`, `what goes in`, `contains` |
//! | 2 | [`Intent::Timing`] | `how long`, `time`, `minutes`, `hours` |
//! | 3 | [`Intent::Steps`] | `how to make`, `how to cook`, `steps` |
//! | 4 | [`Intent::General`] | anything else |
//!
//! Without an active recipe every intent falls through to a general
//! remark. General remarks come from a small fixed set; which one is
//! chosen is delegated to a [`FallbackSelector`] so tests can make the
//! choice deterministic.
//!
//! The steps answer only tells the user how many steps there are. Starting
//! a session is a separate, explicit operation.

use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{KitchenError, Result};
use crate::models::RecipeRecord;

const INGREDIENT_KEYWORDS: &[&str] = &["ingredient", "what is in", "what goes in", "contains"];
const TIMING_KEYWORDS: &[&str] = &["how long", "time", "minutes", "hours"];
const STEPS_KEYWORDS: &[&str] = &["how to make", "how to cook", "steps"];

/// Number of ingredients listed before the answer is cut off with `"..."`.
pub const MAX_LISTED_INGREDIENTS: usize = 5;

/// Generic remarks used when no recipe is active or no intent matches.
pub const FALLBACK_REMARKS: &[&str] = &[
    "Ugandan cuisine is full of flavour! Pick a recipe and ask me about its ingredients, timing, or steps.",
    "Every great meal starts with good ingredients. Choose a recipe and I'll walk you through it.",
    "From rolex to luwombo, there is always something delicious to cook. Which recipe shall we try?",
    "Cooking is best enjoyed one step at a time. Start cooking a recipe and I'll guide you.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Ingredients,
    Timing,
    Steps,
    General,
}

/// Classify a question. Pure and deterministic.
pub fn classify(question: &str) -> Intent {
    let folded = question.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| folded.contains(k));

    if matches(INGREDIENT_KEYWORDS) {
        Intent::Ingredients
    } else if matches(TIMING_KEYWORDS) {
        Intent::Timing
    } else if matches(STEPS_KEYWORDS) {
        Intent::Steps
    } else {
        Intent::General
    }
}

/// Chooses which fallback remark to return.
pub trait FallbackSelector: Send + Sync {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniformly random choice, for production.
pub struct RandomSelector;

impl FallbackSelector for RandomSelector {
    fn pick(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Always the same remark (modulo the set size).
pub struct FixedSelector(pub usize);

impl FallbackSelector for FixedSelector {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

/// Reproducible pseudo-random sequence from a seed.
pub struct SeededSelector {
    rng: Mutex<StdRng>,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl FallbackSelector for SeededSelector {
    fn pick(&self, len: usize) -> usize {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random_range(0..len)
    }
}

/// Answers questions about the active recipe.
pub struct Answerer {
    selector: Box<dyn FallbackSelector>,
}

impl Answerer {
    pub fn new(selector: Box<dyn FallbackSelector>) -> Self {
        Self { selector }
    }

    pub fn random() -> Self {
        Self::new(Box::new(RandomSelector))
    }

    /// Answer `question` about `recipe`.
    ///
    /// Blank questions are rejected with [`KitchenError::EmptyQuestion`]
    /// before classification.
    pub fn answer(&self, question: &str, recipe: Option<&RecipeRecord>) -> Result<String> {
        if question.trim().is_empty() {
            return Err(KitchenError::EmptyQuestion);
        }

        let recipe = match recipe {
            Some(recipe) => recipe,
            None => return Ok(self.fallback().to_string()),
        };

        Ok(match classify(question) {
            Intent::Ingredients => ingredients_answer(recipe),
            Intent::Timing => timing_answer(recipe),
            Intent::Steps => steps_answer(recipe),
            Intent::General => self.fallback().to_string(),
        })
    }

    pub fn fallback(&self) -> &'static str {
        FALLBACK_REMARKS[self.selector.pick(FALLBACK_REMARKS.len()) % FALLBACK_REMARKS.len()]
    }
}

impl Default for Answerer {
    fn default() -> Self {
        Self::random()
    }
}

fn ingredients_answer(recipe: &RecipeRecord) -> String {
    let listed: Vec<&str> = recipe
        .ingredients
        .iter()
        .take(MAX_LISTED_INGREDIENTS)
        .map(String::as_str)
        .collect();
    let more = if recipe.ingredients.len() > MAX_LISTED_INGREDIENTS {
        "..."
    } else {
        ""
    };
    format!(
        "Main ingredients for {}: {}{}",
        recipe.display_name,
        listed.join(", "),
        more
    )
}

fn timing_answer(recipe: &RecipeRecord) -> String {
    format!(
        "{} takes {} mins to prepare and {} mins to cook",
        recipe.display_name,
        recipe.prep_time_mins().as_deref().unwrap_or("Unknown"),
        recipe.cook_time_mins().as_deref().unwrap_or("Unknown"),
    )
}

fn steps_answer(recipe: &RecipeRecord) -> String {
    format!(
        "{} has {} steps. Start cooking to be guided through them one at a time.",
        recipe.display_name,
        recipe.step_count()
    )
}

/// Plain-text summary of a recipe, handed to generative answer sources as
/// context.
pub fn recipe_context(recipe: &RecipeRecord) -> String {
    let mut context = format!("Recipe: {}\n{}\n", recipe.display_name, recipe.description);
    context.push_str("Ingredients:\n");
    for ingredient in &recipe.ingredients {
        context.push_str(&format!("- {}\n", ingredient));
    }
    context.push_str("Steps:\n");
    for (i, step) in recipe.steps.iter().enumerate() {
        context.push_str(&format!("{}. {}\n", i + 1, step));
    }
    context
}
