/// Collaborator contracts: where sessions live and how ids get decorated.
///
/// The engines never call these. The session operations in `session.rs` take a
/// store explicitly so there is no ambient, global session state.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::EngineError;
use crate::types::{HolderId, ItemId};

/// Holder-keyed session storage.
///
/// `update` and `upsert` are read-modify-write and must be atomic per holder:
/// two verdicts racing on one session are serialized, and the loser sees the
/// already-advanced state (and usually an `InvalidComparison`). The closure
/// works on a copy that is only written back when it returns `Ok`.
pub trait SessionStore<S> {
    fn get(&self, holder: HolderId) -> Option<S>;

    fn replace(&self, holder: HolderId, session: S);

    /// Mutate an existing session; `NoActiveSession` if there is none.
    fn update<R, F>(&self, holder: HolderId, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut S) -> Result<R, EngineError>;

    /// Mutate the holder's session, creating it with `init` first if absent.
    fn upsert<R, I, F>(&self, holder: HolderId, init: I, f: F) -> Result<R, EngineError>
    where
        I: FnOnce() -> S,
        F: FnOnce(&mut S) -> Result<R, EngineError>;
}

/// Turns raw ids into whatever the client displays. Used only at the boundary.
pub trait Catalog {
    type Payload;

    /// Ids the catalog does not know are left out of the map.
    fn resolve(&self, ids: &[ItemId]) -> HashMap<ItemId, Self::Payload>;
}

/// Process-local store. One mutex guards every holder, which is what makes
/// `update` atomic.
#[derive(Debug)]
pub struct MemoryStore<S> {
    sessions: Mutex<HashMap<HolderId, S>>,
}

impl<S> MemoryStore<S> {
    pub fn new() -> Self {
        MemoryStore {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<HolderId, S>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<S> Default for MemoryStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Clone> SessionStore<S> for MemoryStore<S> {
    fn get(&self, holder: HolderId) -> Option<S> {
        self.lock().get(&holder).cloned()
    }

    fn replace(&self, holder: HolderId, session: S) {
        self.lock().insert(holder, session);
    }

    fn update<R, F>(&self, holder: HolderId, f: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut S) -> Result<R, EngineError>,
    {
        let mut sessions = self.lock();
        let mut working = sessions
            .get(&holder)
            .cloned()
            .ok_or(EngineError::NoActiveSession { holder })?;
        let out = f(&mut working)?;
        sessions.insert(holder, working);
        Ok(out)
    }

    fn upsert<R, I, F>(&self, holder: HolderId, init: I, f: F) -> Result<R, EngineError>
    where
        I: FnOnce() -> S,
        F: FnOnce(&mut S) -> Result<R, EngineError>,
    {
        let mut sessions = self.lock();
        let mut working = sessions.get(&holder).cloned().unwrap_or_else(init);
        let out = f(&mut working)?;
        sessions.insert(holder, working);
        Ok(out)
    }
}
