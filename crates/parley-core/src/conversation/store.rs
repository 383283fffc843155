//! Concurrency-safe registry of live sessions.
//!
//! Every operation is atomic and scoped to one call: callers receive clones,
//! and mutations run as closures while the entry is locked. Closures passed
//! to a store must not perform I/O or call back into the store.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::session::Session;

/// Storage for live sessions, at most one per user key.
pub trait SessionStore: Send + Sync {
    /// Snapshot of the session for `key`.
    fn get(&self, key: &str) -> Option<Session>;

    /// Return the existing session, or insert the one built by `factory`.
    ///
    /// The boolean is `true` when this call created the session. Concurrent
    /// callers for the same key all observe the same session.
    fn get_or_create<F>(&self, key: &str, factory: F) -> (Session, bool)
    where
        F: FnOnce() -> Session;

    /// Mutate the session for `key` in place. `None` when there is no session.
    fn update<R, F>(&self, key: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R;

    fn remove(&self, key: &str) -> Option<Session>;

    /// Remove the session only if `predicate` holds for it.
    fn remove_if<P>(&self, key: &str, predicate: P) -> Option<Session>
    where
        P: FnOnce(&Session) -> bool;

    /// Visit every session mutably.
    fn for_each_mut<V>(&self, visitor: V)
    where
        V: FnMut(&mut Session);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clones of every live session.
    fn snapshot(&self) -> Vec<Session>;
}

/// [`SessionStore`] backed by a sharded `DashMap`.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: &str) -> Option<Session> {
        self.sessions.get(key).map(|entry| entry.value().clone())
    }

    fn get_or_create<F>(&self, key: &str, factory: F) -> (Session, bool)
    where
        F: FnOnce() -> Session,
    {
        match self.sessions.entry(key.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let session = entry.insert(factory());
                (session.value().clone(), true)
            }
        }
    }

    fn update<R, F>(&self, key: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        self.sessions
            .get_mut(key)
            .map(|mut entry| f(entry.value_mut()))
    }

    fn remove(&self, key: &str) -> Option<Session> {
        self.sessions.remove(key).map(|(_, session)| session)
    }

    fn remove_if<P>(&self, key: &str, predicate: P) -> Option<Session>
    where
        P: FnOnce(&Session) -> bool,
    {
        self.sessions
            .remove_if(key, |_, session| predicate(session))
            .map(|(_, session)| session)
    }

    fn for_each_mut<V>(&self, mut visitor: V)
    where
        V: FnMut(&mut Session),
    {
        for mut entry in self.sessions.iter_mut() {
            visitor(entry.value_mut());
        }
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn snapshot(&self) -> Vec<Session> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
