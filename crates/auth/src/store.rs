//! Refresh-token bookkeeping: active sets and the self-expiring blacklist.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::{IdentityNamespace, SubjectId};

/// Key layout shared by every cache-backed store.
pub mod keys {
    use crate::{IdentityNamespace, SubjectId};

    /// Set of active refresh tokens for one subject.
    pub fn active_set(namespace: IdentityNamespace, subject: &SubjectId) -> String {
        format!("refresh_tokens:{}:{}", namespace.as_str(), subject.as_str())
    }

    /// Per-token liveness marker.
    pub fn liveness(token: &str) -> String {
        format!("refresh_token:{token}")
    }

    /// Blacklist entry.
    pub fn blacklist(token: &str) -> String {
        format!("blacklisted_refresh:{token}")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("token store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a conditional remove-and-blacklist.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Revocation {
    /// This call blacklisted the token.
    Revoked,
    /// Someone else got there first.
    AlreadyRevoked,
}

/// Shared TTL-aware store for refresh-token state.
///
/// Every operation must be linearizable per key. `revoke` is the one point of
/// no return for rotation and must be a single conditional operation: of any
/// number of concurrent callers for the same token, exactly one observes
/// [`Revocation::Revoked`].
pub trait TokenStore: Send + Sync {
    /// Add `token` to the subject's active set and (re)arm its liveness marker.
    /// Idempotent.
    fn record_active(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
        token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Currently active refresh tokens for the subject.
    fn list_active(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
    ) -> Result<HashSet<String>, StoreError>;

    /// Remove from the active set and blacklist for `ttl`, atomically.
    fn revoke(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
        token: &str,
        ttl: Duration,
    ) -> Result<Revocation, StoreError>;

    fn is_blacklisted(&self, token: &str) -> Result<bool, StoreError>;
}

impl<S> TokenStore for Arc<S>
where
    S: TokenStore + ?Sized,
{
    fn record_active(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
        token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        (**self).record_active(namespace, subject, token, ttl)
    }

    fn list_active(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
    ) -> Result<HashSet<String>, StoreError> {
        (**self).list_active(namespace, subject)
    }

    fn revoke(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
        token: &str,
        ttl: Duration,
    ) -> Result<Revocation, StoreError> {
        (**self).revoke(namespace, subject, token, ttl)
    }

    fn is_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        (**self).is_blacklisted(token)
    }
}

#[derive(Debug, Default)]
struct State {
    active: HashMap<(IdentityNamespace, SubjectId), HashSet<String>>,
    liveness: HashMap<String, Instant>,
    blacklist: HashMap<String, Instant>,
}

impl State {
    /// Drops lapsed blacklist and liveness entries, then every active-set
    /// member left without a liveness marker. Empty sets go too.
    fn purge_expired(&mut self, now: Instant) {
        self.blacklist.retain(|_, expires_at| *expires_at > now);
        self.liveness.retain(|_, expires_at| *expires_at > now);

        let liveness = &self.liveness;
        self.active.retain(|_, tokens| {
            tokens.retain(|t| liveness.contains_key(t));
            !tokens.is_empty()
        });
    }
}

/// In-memory token store for tests/dev.
///
/// A single mutex makes every operation linearizable. Expired entries are
/// dropped lazily on access.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    state: Mutex<State>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        state.purge_expired(Instant::now());
        Ok(state)
    }
}

impl TokenStore for InMemoryTokenStore {
    fn record_active(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
        token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state
            .active
            .entry((namespace, subject.clone()))
            .or_default()
            .insert(token.to_string());
        state.liveness.insert(token.to_string(), Instant::now() + ttl);
        Ok(())
    }

    fn list_active(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
    ) -> Result<HashSet<String>, StoreError> {
        // `lock` has already pruned members whose liveness lapsed.
        let state = self.lock()?;
        Ok(state
            .active
            .get(&(namespace, subject.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn revoke(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
        token: &str,
        ttl: Duration,
    ) -> Result<Revocation, StoreError> {
        let mut state = self.lock()?;
        if state.blacklist.contains_key(token) {
            return Ok(Revocation::AlreadyRevoked);
        }

        state.blacklist.insert(token.to_string(), Instant::now() + ttl);
        state.liveness.remove(token);
        let key = (namespace, subject.clone());
        let emptied = match state.active.get_mut(&key) {
            Some(set) => {
                set.remove(token);
                set.is_empty()
            }
            None => false,
        };
        if emptied {
            state.active.remove(&key);
        }
        Ok(Revocation::Revoked)
    }

    fn is_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.blacklist.contains_key(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    fn u1() -> SubjectId {
        SubjectId::new("u1").unwrap()
    }

    #[test]
    fn key_layout_matches_cache_contract() {
        assert_eq!(keys::active_set(IdentityNamespace::Admin, &u1()), "refresh_tokens:admin:u1");
        assert_eq!(keys::liveness("t"), "refresh_token:t");
        assert_eq!(keys::blacklist("t"), "blacklisted_refresh:t");
    }

    #[test]
    fn recording_is_idempotent() {
        let store = InMemoryTokenStore::new();
        store.record_active(IdentityNamespace::User, &u1(), "t1", WEEK).unwrap();
        store.record_active(IdentityNamespace::User, &u1(), "t1", WEEK).unwrap();

        let active = store.list_active(IdentityNamespace::User, &u1()).unwrap();
        assert_eq!(active, HashSet::from(["t1".to_string()]));
    }

    #[test]
    fn namespaces_never_mix() {
        let store = InMemoryTokenStore::new();
        store.record_active(IdentityNamespace::Admin, &u1(), "admin-t", WEEK).unwrap();
        store.record_active(IdentityNamespace::User, &u1(), "user-t", WEEK).unwrap();

        let admin = store.list_active(IdentityNamespace::Admin, &u1()).unwrap();
        let user = store.list_active(IdentityNamespace::User, &u1()).unwrap();
        assert_eq!(admin, HashSet::from(["admin-t".to_string()]));
        assert_eq!(user, HashSet::from(["user-t".to_string()]));
    }

    #[test]
    fn revoke_removes_and_blacklists_exactly_once() {
        let store = InMemoryTokenStore::new();
        store.record_active(IdentityNamespace::User, &u1(), "t1", WEEK).unwrap();

        assert_eq!(
            store.revoke(IdentityNamespace::User, &u1(), "t1", WEEK).unwrap(),
            Revocation::Revoked
        );
        assert!(store.is_blacklisted("t1").unwrap());
        assert!(store.list_active(IdentityNamespace::User, &u1()).unwrap().is_empty());

        assert_eq!(
            store.revoke(IdentityNamespace::User, &u1(), "t1", WEEK).unwrap(),
            Revocation::AlreadyRevoked
        );
    }

    #[test]
    fn entries_expire_with_their_ttl() {
        let store = InMemoryTokenStore::new();
        let short = Duration::from_millis(20);
        store.record_active(IdentityNamespace::User, &u1(), "live", short).unwrap();
        store.revoke(IdentityNamespace::User, &u1(), "dead", short).unwrap();
        assert!(store.is_blacklisted("dead").unwrap());

        std::thread::sleep(Duration::from_millis(50));

        assert!(!store.is_blacklisted("dead").unwrap());
        assert!(store.list_active(IdentityNamespace::User, &u1()).unwrap().is_empty());
    }

    #[test]
    fn abandoned_sessions_are_dropped_from_memory() {
        let store = InMemoryTokenStore::new();
        for i in 0..500 {
            let subject = SubjectId::new(format!("u{i}")).unwrap();
            store
                .record_active(IdentityNamespace::User, &subject, &format!("t{i}"), Duration::from_millis(1))
                .unwrap();
        }
        store.record_active(IdentityNamespace::User, &u1(), "kept", WEEK).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        // Any call triggers the sweep.
        store.is_blacklisted("unrelated").unwrap();

        let state = store.state.lock().unwrap();
        assert_eq!(state.liveness.len(), 1);
        assert_eq!(state.active.len(), 1);
        assert_eq!(
            state.active.get(&(IdentityNamespace::User, u1())),
            Some(&HashSet::from(["kept".to_string()]))
        );
    }
}
