//! Serialized web session record

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Numeric account identifier owning a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session record as written to disk
///
/// The cache only looks at `expires_at` (absolute-expiry sweep) and
/// `account_id` (account logout). Everything else belongs to the session
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionVal {
    /// Account the session is logged in as
    pub account_id: AccountId,

    /// Server-side session identifier
    pub session_id: String,

    /// XSRF token bound to the session
    pub auth: String,

    /// External identity used to log in, if any
    pub external_id: Option<String>,

    /// Whether the cookie outlives the browser session
    pub persistent_cookie: bool,

    /// When the session layer should reissue the cookie
    pub refresh_cookie_at: DateTime<Utc>,

    /// Hard expiry, compared against the cache clock by `sweep`
    pub expires_at: DateTime<Utc>,

    /// When the session was created
    pub created_at: DateTime<Utc>,
}

impl SessionVal {
    /// Create a session for `account_id` that lives for `max_age` from `now`
    ///
    /// The cookie refresh point is set at half the lifetime.
    pub fn new(account_id: AccountId, now: DateTime<Utc>, max_age: Duration) -> Self {
        Self {
            account_id,
            session_id: Uuid::new_v4().simple().to_string(),
            auth: Uuid::new_v4().simple().to_string(),
            external_id: None,
            persistent_cookie: false,
            refresh_cookie_at: now + max_age / 2,
            expires_at: now + max_age,
            created_at: now,
        }
    }

    /// Check whether the session has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_new() {
        let now = Utc::now();
        let val = SessionVal::new(AccountId(1000), now, Duration::hours(12));

        assert_eq!(val.account_id, AccountId(1000));
        assert_eq!(val.expires_at, now + Duration::hours(12));
        assert_eq!(val.refresh_cookie_at, now + Duration::hours(6));
        assert!(val.external_id.is_none());
        assert_ne!(val.session_id, val.auth);
    }

    #[test]
    fn session_expiry_boundary() {
        let now = Utc::now();
        let val = SessionVal::new(AccountId(1), now, Duration::hours(1));

        assert!(!val.is_expired(now));
        assert!(val.is_expired(now + Duration::hours(1)));
        assert!(val.is_expired(now + Duration::hours(2)));
    }

    #[test]
    fn session_serialize() {
        let val = SessionVal::new(AccountId(42), Utc::now(), Duration::hours(1));

        let json = serde_json::to_string(&val).unwrap();
        assert!(json.contains("\"account_id\":42"));

        let parsed: SessionVal = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, val);
    }
}
