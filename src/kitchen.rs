//! The kitchen facade.
//!
//! [`Kitchen`] ties the catalog, the session registry, the intent answerer
//! and the optional generative source together behind the operations that
//! both transports (CLI and HTTP) expose:
//!
//! | Operation | Result |
//! |-----------|--------|
//! | [`Kitchen::list_recipe_names`] | display names in load order |
//! | [`Kitchen::get_recipe`] | the normalized record |
//! | [`Kitchen::search`] | display names containing a keyword |
//! | [`Kitchen::start_cooking`] | ingredients and steps, cursor at 0 |
//! | [`Kitchen::advance_step`] | next step or completion |
//! | [`Kitchen::ask`] | an answer and where it came from |
//!
//! Every session-aware operation takes an optional [`SessionId`]; `None`
//! means the shared default session.

use anyhow::Result;
use guided_kitchen_core::answer::{recipe_context, Answerer};
use guided_kitchen_core::models::RecipeSummary;
use guided_kitchen_core::session::{Advance, CookingStart, SessionId, SessionRegistry};
use guided_kitchen_core::{KitchenError, RecipeRecord};
use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::{Catalog, ReloadSummary};
use crate::config::Config;
use crate::generate::{create_source, AnswerSource, DisabledSource};
use crate::loader::LoadReport;

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    Intent,
    Generative,
}

#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub source: AnswerOrigin,
    /// Display name of the recipe the answer is about, if any.
    pub recipe: Option<String>,
}

pub struct Kitchen {
    catalog: Catalog,
    sessions: SessionRegistry,
    answerer: Answerer,
    source: Box<dyn AnswerSource>,
}

impl Kitchen {
    pub fn new(catalog: Catalog, answerer: Answerer, source: Box<dyn AnswerSource>) -> Self {
        Self {
            catalog,
            sessions: SessionRegistry::new(),
            answerer,
            source,
        }
    }

    /// Keep at most `max_sessions` sessions besides the default one.
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.sessions = SessionRegistry::with_capacity(max_sessions);
        self
    }

    /// Load recipes and build the configured answer source.
    pub fn from_config(config: &Config) -> Result<(Self, LoadReport)> {
        let (catalog, report) = Catalog::load(&config.recipes)?;
        let source = create_source(&config.answer)?;
        let kitchen = Self::new(catalog, Answerer::random(), source)
            .with_max_sessions(config.server.max_sessions);
        Ok((kitchen, report))
    }

    /// A kitchen over `catalog` with no generative source.
    pub fn offline(catalog: Catalog, answerer: Answerer) -> Self {
        Self::new(catalog, answerer, Box::new(DisabledSource))
    }

    pub fn recipe_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn list_recipe_names(&self) -> Vec<String> {
        self.catalog
            .snapshot()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn list_recipes(&self) -> Vec<RecipeSummary> {
        self.catalog.snapshot().summaries()
    }

    pub fn get_recipe(&self, name: &str) -> Result<RecipeRecord, KitchenError> {
        self.catalog.snapshot().resolve(name).cloned()
    }

    pub fn search(&self, keyword: &str) -> Vec<String> {
        self.catalog
            .snapshot()
            .search(keyword)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn create_session(&self) -> SessionId {
        self.sessions.create()
    }

    pub fn close_session(&self, id: &SessionId) -> Result<(), KitchenError> {
        self.sessions.close(id)
    }

    pub fn start_cooking(
        &self,
        session: Option<&SessionId>,
        name: &str,
    ) -> Result<CookingStart, KitchenError> {
        let index = self.catalog.snapshot();
        self.sessions
            .with_session(session, |s| s.start_cooking(&index, name))
    }

    pub fn advance_step(&self, session: Option<&SessionId>) -> Result<Advance, KitchenError> {
        let index = self.catalog.snapshot();
        self.sessions.with_session(session, |s| s.advance(&index))
    }

    /// Answer a question about `recipe_name`, or about the session's active
    /// recipe when no name is given.
    ///
    /// The generative source is consulted first when one is configured. If
    /// it fails or has nothing usable, the intent answerer responds.
    pub async fn ask(
        &self,
        question: &str,
        recipe_name: Option<&str>,
        session: Option<&SessionId>,
    ) -> Result<AskResponse, KitchenError> {
        if question.trim().is_empty() {
            return Err(KitchenError::EmptyQuestion);
        }

        let index = self.catalog.snapshot();
        let recipe = match recipe_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Some(index.resolve(name)?),
            None => {
                let state = self.sessions.snapshot(session)?;
                state.active_recipe(&index)
            }
        };
        let recipe_display = recipe.map(|r| r.display_name.clone());

        let context = recipe.map(recipe_context);
        match self.source.generate(question, context.as_deref()).await {
            Ok(Some(answer)) => {
                debug!(source = self.source.name(), "generative answer used");
                return Ok(AskResponse {
                    answer,
                    source: AnswerOrigin::Generative,
                    recipe: recipe_display,
                });
            }
            Ok(None) => {}
            Err(e) => warn!(
                source = self.source.name(),
                error = %e,
                "answer source failed, using intent answer"
            ),
        }

        let answer = self.answerer.answer(question, recipe)?;
        Ok(AskResponse {
            answer,
            source: AnswerOrigin::Intent,
            recipe: recipe_display,
        })
    }

    pub fn reload(&self) -> Result<ReloadSummary> {
        self.catalog.reload()
    }
}
