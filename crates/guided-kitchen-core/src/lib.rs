//! # Guided Kitchen Core
//!
//! Shared, I/O-free logic for Guided Kitchen: recipe models, schema
//! normalization, the name index, cooking sessions, and the intent-based
//! question answerer.
//!
//! This crate contains no tokio, HTTP, or filesystem access. Everything
//! here runs to completion synchronously; the application crate owns
//! loading, transport, and the optional generative answer source.

pub mod answer;
pub mod error;
pub mod index;
pub mod models;
pub mod normalize;
pub mod session;

pub use error::{KitchenError, Result};
pub use index::NameIndex;
pub use models::RecipeRecord;
