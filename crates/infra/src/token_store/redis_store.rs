//! Redis-backed refresh-token store.
//!
//! ## Key layout
//!
//! - `refresh_tokens:{namespace}:{subject}`: SET of active refresh tokens
//! - `refresh_token:{token}`: liveness marker (value = subject id, EX = token TTL)
//! - `blacklisted_refresh:{token}`: blacklist sentinel (EX = remaining lifetime)
//!
//! `revoke` runs as a Lua script so the blacklist decision is one atomic server
//! step; every key it touches is declared in KEYS. `list_active` reads the set,
//! checks liveness markers in one pipeline and prunes lapsed members after;
//! pruning is idempotent, so it needs no atomicity. The three key families do
//! not share a hash slot, so the store targets a single Redis node (or a
//! primary with replicas), not Redis Cluster.
//!
//! Every connection carries connect/read/write timeouts; a slow or dead
//! Redis surfaces as `StoreError::Unavailable`, never as "not blacklisted".

use std::collections::HashSet;
use std::time::Duration;

use redis::{Commands, Script};
use tracing::{error, instrument};

use campus_auth::store::keys;
use campus_auth::{IdentityNamespace, Revocation, StoreError, SubjectId, TokenStore};

/// Set-if-absent on the blacklist decides the winner; only the winner touches
/// the active set.
const REVOKE_SCRIPT: &str = r"
if not redis.call('SET', KEYS[1], '1', 'NX', 'EX', ARGV[2]) then
  return 0
end
redis.call('SREM', KEYS[2], ARGV[1])
redis.call('DEL', KEYS[3])
return 1
";

#[derive(Debug, Clone)]
pub struct RedisTokenStore {
    client: redis::Client,
    timeout: Duration,
    revoke_script: Script,
}

impl RedisTokenStore {
    /// Create a store for `redis_url` (e.g. "redis://localhost:6379").
    ///
    /// No connection is made until the first operation.
    pub fn new(redis_url: impl AsRef<str>, timeout: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;

        Ok(Self {
            client,
            timeout,
            revoke_script: Script::new(REVOKE_SCRIPT),
        })
    }

    fn connection(&self) -> Result<redis::Connection, StoreError> {
        let conn = self
            .client
            .get_connection_with_timeout(self.timeout)
            .map_err(unavailable)?;
        conn.set_read_timeout(Some(self.timeout)).map_err(unavailable)?;
        conn.set_write_timeout(Some(self.timeout)).map_err(unavailable)?;
        Ok(conn)
    }
}

fn unavailable(e: redis::RedisError) -> StoreError {
    error!(error = %e, "redis token store call failed");
    StoreError::Unavailable(e.to_string())
}

/// Redis EX takes whole seconds and rejects zero. Partial seconds round up so
/// a key never expires before the requested TTL.
fn ttl_secs(ttl: Duration) -> u64 {
    let whole = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    whole.max(1)
}

/// Split set members by whether their liveness marker still exists.
fn split_live(members: Vec<String>, alive: &[bool]) -> (HashSet<String>, Vec<String>) {
    let mut live = HashSet::new();
    let mut lapsed = Vec::new();
    for (token, alive) in members.into_iter().zip(alive) {
        if *alive {
            live.insert(token);
        } else {
            lapsed.push(token);
        }
    }
    (live, lapsed)
}

impl TokenStore for RedisTokenStore {
    #[instrument(skip_all, fields(namespace = %namespace, subject_id = %subject))]
    fn record_active(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
        token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let set_key = keys::active_set(namespace, subject);
        let secs = ttl_secs(ttl);
        let mut conn = self.connection()?;

        redis::pipe()
            .atomic()
            .sadd(&set_key, token)
            .ignore()
            .set_ex(keys::liveness(token), subject.as_str(), secs)
            .ignore()
            .expire(&set_key, secs as i64)
            .ignore()
            .query::<()>(&mut conn)
            .map_err(unavailable)
    }

    fn list_active(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
    ) -> Result<HashSet<String>, StoreError> {
        let set_key = keys::active_set(namespace, subject);
        let mut conn = self.connection()?;

        let members: Vec<String> = conn.smembers(&set_key).map_err(unavailable)?;
        if members.is_empty() {
            return Ok(HashSet::new());
        }

        let mut pipe = redis::pipe();
        for token in &members {
            pipe.exists(keys::liveness(token));
        }
        let alive: Vec<bool> = pipe.query(&mut conn).map_err(unavailable)?;

        let (live, lapsed) = split_live(members, &alive);
        if !lapsed.is_empty() {
            conn.srem::<_, _, ()>(&set_key, &lapsed).map_err(unavailable)?;
        }
        Ok(live)
    }

    #[instrument(skip_all, fields(namespace = %namespace, subject_id = %subject))]
    fn revoke(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
        token: &str,
        ttl: Duration,
    ) -> Result<Revocation, StoreError> {
        let mut conn = self.connection()?;
        let won: i64 = self
            .revoke_script
            .key(keys::blacklist(token))
            .key(keys::active_set(namespace, subject))
            .key(keys::liveness(token))
            .arg(token)
            .arg(ttl_secs(ttl))
            .invoke(&mut conn)
            .map_err(unavailable)?;

        Ok(if won == 1 {
            Revocation::Revoked
        } else {
            Revocation::AlreadyRevoked
        })
    }

    fn is_blacklisted(&self, token: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        conn.exists(keys::blacklist(token)).map_err(unavailable)
    }
}
