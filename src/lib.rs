//! # Guided Kitchen
//!
//! A local-first recipe index and guided cooking assistant.
//!
//! Recipes are JSON documents in a folder. They are loaded and normalized
//! once at startup into a name index, then served to a CLI and an HTTP API
//! that can list and search recipes, walk a cook through one recipe step by
//! step, and answer simple questions about it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌───────────┐
//! │ data/Recipes│──▶│  Loader +  │──▶│  Catalog  │
//! │   *.json    │   │ Normalizer │   │ NameIndex │
//! └─────────────┘   └────────────┘   └─────┬─────┘
//!                                          │
//!                                    ┌─────▼─────┐
//!                                    │  Kitchen  │◀── sessions, answerer,
//!                                    └─────┬─────┘    answer source
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │(kitchen) │       │  (axum)  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! The pure domain logic (normalization, index, sessions, intent answers)
//! lives in the `guided-kitchen-core` crate.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`loader`] | Recipe folder loading |
//! | [`catalog`] | Shared index with atomic reload |
//! | [`generate`] | Optional generative answer sources |
//! | [`kitchen`] | Facade over every operation |
//! | [`server`] | HTTP server |

pub mod catalog;
pub mod config;
pub mod generate;
pub mod kitchen;
pub mod loader;
pub mod server;
