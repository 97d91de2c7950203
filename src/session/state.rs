//! Session state and the session document returned by the API.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::types::{Permissions, User};
use crate::{Error, Result};

/// An opaque session token issued by the server.
///
/// Cheap to clone. `Debug` does not print the token.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(Arc<str>);

impl SessionToken {
    pub(crate) fn new(token: impl AsRef<str>) -> Self {
        Self(Arc::from(token.as_ref()))
    }

    /// Returns the token as sent in `X-Token`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Session document, as returned by every `/v2/sessions` call.
#[derive(Debug, Deserialize)]
pub(crate) struct SessionDocument {
    pub token: String,
    #[serde(default)]
    pub expires: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub permissions: Permissions,
}

impl SessionDocument {
    pub fn parse(body: Value) -> Result<Self> {
        let document: SessionDocument = serde_json::from_value(body)
            .map_err(|e| Error::from(e).wrap(crate::ErrorKind::InvalidResponse, "Malformed session document"))?;
        if document.token.is_empty() {
            return Err(Error::invalid_response("Session document has an empty token"));
        }
        Ok(document)
    }
}

/// Parses an expiry timestamp as sent by the API.
///
/// The API sends `2024-05-01T10:00:00+0000`; RFC 3339 is accepted as well.
pub(crate) fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Validity {
    Valid,
    Expired,
}

/// The active session.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub token: SessionToken,
    pub expires: Option<DateTime<Utc>>,
    pub user: Option<User>,
    pub permissions: Permissions,
    pub validity: Validity,
}

impl Session {
    pub fn from_document(document: SessionDocument) -> Self {
        let expires = document.expires.as_deref().and_then(parse_expires);
        Self {
            token: SessionToken::new(&document.token),
            expires,
            user: document.user,
            permissions: document.permissions,
            validity: Validity::Valid,
        }
    }

    /// Returns `true` if the token may still be used at `now`.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.validity == Validity::Valid && self.expires.is_none_or(|expires| expires > now)
    }
}

pub(crate) type Waiter = oneshot::Sender<Result<SessionToken>>;

/// Lifecycle of the session owned by the manager.
pub(crate) enum State {
    /// No session has been created, or the last attempt failed.
    Absent,
    /// A creation call is in flight. Waiters are resolved in join order.
    Establishing(Vec<Waiter>),
    /// A session exists. It may have expired since.
    Active(Session),
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Absent => f.write_str("Absent"),
            State::Establishing(waiters) => write!(f, "Establishing({} waiting)", waiters.len()),
            State::Active(session) => f.debug_tuple("Active").field(session).finish(),
        }
    }
}
