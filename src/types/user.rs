//! Users and permissions attached to a session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Permissions granted to a session, grouped by the role that granted them.
///
/// The API sends permissions as `{ "group:user": ["api.users.1234.read", ...] }`.
///
/// An action is allowed if any group contains it exactly, or contains a
/// pattern whose dot-separated segments match it. A `*` segment matches any
/// single segment, and a trailing `*` matches everything after it.
///
/// ```rust
/// use eta::Permissions;
///
/// let permissions = Permissions::from_groups([
///     ("group:user", vec!["api.users.1234.read", "api.shoppinglists.*"]),
/// ]);
///
/// assert!(permissions.allows("api.users.1234.read"));
/// assert!(permissions.allows("api.shoppinglists.99.write"));
/// assert!(!permissions.allows("api.users.1234.write"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions {
    groups: BTreeMap<String, Vec<String>>,
}

impl Permissions {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a permission set from `(group, actions)` pairs.
    pub fn from_groups<G, A, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (G, Vec<A>)>,
        G: Into<String>,
        A: Into<String>,
    {
        Self {
            groups: groups
                .into_iter()
                .map(|(group, actions)| (group.into(), actions.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// Returns `true` if any group grants `action`.
    pub fn allows(&self, action: &str) -> bool {
        self.groups
            .values()
            .flatten()
            .any(|granted| pattern_matches(granted, action))
    }

    /// Returns the names of the granting groups.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Returns `true` if no permissions are granted.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }
}

fn pattern_matches(pattern: &str, action: &str) -> bool {
    if pattern == action {
        return true;
    }

    let mut pattern_segments = pattern.split('.').peekable();
    let mut action_segments = action.split('.');

    while let Some(expected) = pattern_segments.next() {
        let last = pattern_segments.peek().is_none();
        match action_segments.next() {
            Some(_) if expected == "*" && last => return true,
            Some(_) if expected == "*" => continue,
            Some(actual) if actual == expected => continue,
            _ => return false,
        }
    }

    action_segments.next().is_none()
}

/// A user attached to a session.
///
/// Callers always receive copies. Changing a returned `User` has no effect on
/// the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: String,

    /// Login email.
    pub email: String,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Gender, as reported by the user.
    #[serde(default)]
    pub gender: Option<String>,

    /// Birth year, as reported by the user.
    #[serde(default)]
    pub birth_year: Option<u16>,

    /// ETA resource name, e.g. `ern:user:1234`.
    #[serde(default)]
    pub ern: Option<String>,

    /// Permissions at the time the user was attached.
    #[serde(default)]
    pub permissions: Permissions,
}
