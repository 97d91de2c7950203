//! Session notifications.

/// A change observable by subscribers of
/// [`Client::subscribe`](crate::Client::subscribe).
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionEvent {
    /// The attached user changed.
    ///
    /// Fired after a successful attach or detach, and when an expired
    /// session drops its user. `user_id` is the new user, or `None` when
    /// the session became anonymous.
    UserChanged {
        /// Identifier of the newly attached user.
        user_id: Option<String>,
    },
}

impl SessionEvent {
    /// Returns the notification name.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::UserChanged { .. } => "session_user_id_changed",
        }
    }
}
