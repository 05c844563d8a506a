//! In-memory session tokens.
//!
//! One session per user id; creating a new one supersedes the old.
//! Sessions never touch disk and die with the process. Expiry is lazy:
//! validity is computed at check time from the stored timestamp, and an
//! expired entry found during a check is dropped on the spot.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::crypto;

/// Default session lifetime when the caller does not supply one.
pub const DEFAULT_SESSION_TTL_MS: i64 = 8 * 60 * 60 * 1000; // 8 hours

#[derive(Debug, Clone)]
struct Session {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct SessionTable {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh opaque token for `user_id`, replacing any prior
    /// session. Create-or-replace is a single insert under the table
    /// lock.
    pub fn create(&self, user_id: &str, ttl_ms: Option<i64>) -> String {
        let token = crypto::generate_token();
        let ttl = Duration::milliseconds(ttl_ms.unwrap_or(DEFAULT_SESSION_TTL_MS));
        let session = Session {
            token: token.clone(),
            expires_at: Utc::now() + ttl,
        };
        self.sessions.lock().insert(user_id.to_string(), session);
        tracing::debug!(user_id, "session created");
        token
    }

    /// True iff a session exists for `user_id`, the token matches, and
    /// it has not expired.
    pub fn validate(&self, user_id: &str, token: &str) -> bool {
        let mut sessions = self.sessions.lock();
        let Some(session) = sessions.get(user_id) else {
            return false;
        };
        if Utc::now() >= session.expires_at {
            sessions.remove(user_id);
            return false;
        }
        crypto::constant_time_eq(session.token.as_bytes(), token.as_bytes())
    }

    /// Idempotent: removing a session that does not exist is a no-op.
    pub fn invalidate(&self, user_id: &str) {
        self.sessions.lock().remove(user_id);
    }

    /// Drop every expired entry; returns how many were removed. Lazy
    /// expiry keeps the table correct without this, but long-lived
    /// hosts can call it to bound memory.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }
}
