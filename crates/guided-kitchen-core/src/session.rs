//! Guided cooking sessions.
//!
//! A [`Session`] holds at most one active recipe and a zero-based step
//! cursor. It is a small state machine:
//!
//! ```text
//!            start_cooking(name)            advance (cursor < len)
//!   Idle ─────────────────────────▶ Cooking ◀──────────────────┐
//!    ▲                                │  └─────────────────────┘
//!    │     advance (cursor == len)    │
//!    └──────── completion message ────┘
//! ```
//!
//! "Completed" is not retained: the call that reports completion also
//! clears the session. Advancing an idle session is a reported
//! [`KitchenError::NoActiveSession`], never a panic.
//!
//! The active recipe is held by `lookup_key`, not by value, so a session
//! always reads the recipe from whichever index it is handed.
//!
//! [`SessionRegistry`] multiplexes sessions by [`SessionId`]. All
//! read-modify-write access goes through one mutex so that a concurrent
//! `start_cooking` and `advance` on the same session cannot interleave.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{KitchenError, Result};
use crate::index::NameIndex;
use crate::models::RecipeRecord;

/// Result of starting a cooking session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CookingStart {
    pub recipe_name: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub total_steps: usize,
}

/// Result of advancing a session by one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Advance {
    /// The step that was just consumed. `step_number` is the new cursor
    /// value, which doubles as the 1-based number of the returned step.
    Step {
        text: String,
        step_number: usize,
        total_steps: usize,
    },
    /// All steps were consumed; the session is idle again.
    Completed { recipe_name: String, message: String },
}

/// Observable session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Cooking { recipe_key: String, step: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    active_recipe: Option<String>,
    step_cursor: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` the active recipe and rewind to the first step.
    ///
    /// An unresolvable name leaves the session untouched.
    pub fn start_cooking(&mut self, index: &NameIndex, name: &str) -> Result<CookingStart> {
        let recipe = index.resolve(name)?;
        self.active_recipe = Some(recipe.lookup_key.clone());
        self.step_cursor = 0;
        debug!(recipe = %recipe.display_name, steps = recipe.step_count(), "cooking started");

        Ok(CookingStart {
            recipe_name: recipe.display_name.clone(),
            ingredients: recipe.ingredients.clone(),
            steps: recipe.steps.clone(),
            total_steps: recipe.step_count(),
        })
    }

    /// Consume the step under the cursor, or finish the session once every
    /// step has been consumed.
    pub fn advance(&mut self, index: &NameIndex) -> Result<Advance> {
        let key = self
            .active_recipe
            .as_deref()
            .ok_or(KitchenError::NoActiveSession)?;

        let recipe = match index.get(key) {
            Some(recipe) => recipe,
            None => {
                // The recipe was dropped by a reload while this session was open.
                let missing = key.to_string();
                self.reset();
                return Err(KitchenError::NotFound(missing));
            }
        };

        if self.step_cursor < recipe.step_count() {
            let text = recipe.steps[self.step_cursor].clone();
            self.step_cursor += 1;
            debug!(recipe = %recipe.display_name, step = self.step_cursor, "step served");
            return Ok(Advance::Step {
                text,
                step_number: self.step_cursor,
                total_steps: recipe.step_count(),
            });
        }

        let recipe_name = recipe.display_name.clone();
        self.reset();
        debug!(recipe = %recipe_name, "cooking complete");
        Ok(Advance::Completed {
            message: format!("Cooking complete! Enjoy your delicious {}!", recipe_name),
            recipe_name,
        })
    }

    /// The active recipe as seen through `index`, if any.
    pub fn active_recipe<'a>(&self, index: &'a NameIndex) -> Option<&'a RecipeRecord> {
        self.active_recipe.as_deref().and_then(|key| index.get(key))
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active_recipe.as_deref()
    }

    pub fn step_cursor(&self) -> usize {
        self.step_cursor
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.active_recipe {
            Some(key) => SessionPhase::Cooking {
                recipe_key: key.clone(),
                step: self.step_cursor,
            },
            None => SessionPhase::Idle,
        }
    }

    pub fn reset(&mut self) {
        self.active_recipe = None;
        self.step_cursor = 0;
    }
}

/// Opaque handle for a session held by a [`SessionRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = KitchenError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(SessionId)
            .map_err(|_| KitchenError::UnknownSession(s.to_string()))
    }
}

/// Handle-addressed sessions kept when no limit is configured.
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

struct Slot {
    session: Session,
    last_used: u64,
}

struct Slots {
    sessions: HashMap<SessionId, Slot>,
    clock: u64,
}

impl Slots {
    fn touch(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.clock += 1;
        let now = self.clock;
        self.sessions.get_mut(id).map(|slot| {
            slot.last_used = now;
            &mut slot.session
        })
    }
}

/// Sessions addressed by handle, plus one default session that callers
/// without a handle share.
///
/// At most `max_sessions` handle sessions are kept. Creating one more evicts
/// the least recently used; the default session is never evicted.
pub struct SessionRegistry {
    default_id: SessionId,
    max_sessions: usize,
    slots: Mutex<Slots>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    /// A registry keeping at most `max_sessions` sessions besides the default
    /// one. A limit of zero is treated as one.
    pub fn with_capacity(max_sessions: usize) -> Self {
        let default_id = SessionId::new();
        let mut sessions = HashMap::new();
        sessions.insert(
            default_id,
            Slot {
                session: Session::new(),
                last_used: 0,
            },
        );
        Self {
            default_id,
            max_sessions: max_sessions.max(1),
            slots: Mutex::new(Slots { sessions, clock: 0 }),
        }
    }

    /// Handle of the shared session used when a caller supplies none.
    pub fn default_id(&self) -> SessionId {
        self.default_id
    }

    pub fn create(&self) -> SessionId {
        let id = SessionId::new();
        let mut slots = self.lock();

        while slots.sessions.len() > self.max_sessions {
            let oldest = slots
                .sessions
                .iter()
                .filter(|(key, _)| **key != self.default_id)
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| *key);
            match oldest {
                Some(key) => {
                    slots.sessions.remove(&key);
                    debug!(session = %key, "least recently used session evicted");
                }
                None => break,
            }
        }

        slots.clock += 1;
        let last_used = slots.clock;
        slots.sessions.insert(
            id,
            Slot {
                session: Session::new(),
                last_used,
            },
        );
        debug!(session = %id, "session created");
        id
    }

    /// Remove a session. Closing the default session only resets it.
    pub fn close(&self, id: &SessionId) -> Result<()> {
        let mut slots = self.lock();
        if *id == self.default_id {
            if let Some(slot) = slots.sessions.get_mut(id) {
                slot.session.reset();
            }
            return Ok(());
        }
        slots
            .sessions
            .remove(id)
            .map(|_| debug!(session = %id, "session closed"))
            .ok_or_else(|| KitchenError::UnknownSession(id.to_string()))
    }

    /// Run `f` against a session while holding the registry lock.
    ///
    /// `None` selects the default session.
    pub fn with_session<R>(
        &self,
        id: Option<&SessionId>,
        f: impl FnOnce(&mut Session) -> Result<R>,
    ) -> Result<R> {
        let id = id.copied().unwrap_or(self.default_id);
        let mut slots = self.lock();
        let session = slots
            .touch(&id)
            .ok_or_else(|| KitchenError::UnknownSession(id.to_string()))?;
        f(session)
    }

    /// A copy of the session state, for readers that must not hold the lock.
    pub fn snapshot(&self, id: Option<&SessionId>) -> Result<Session> {
        self.with_session(id, |session| Ok(session.clone()))
    }

    /// Number of sessions, the default one included.
    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().sessions.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
