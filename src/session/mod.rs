//! Session lifecycle.
//!
//! A session is created lazily on first use with `POST /v2/sessions` and
//! identified by an opaque token. Users are attached and detached with
//! `PUT /v2/sessions` without replacing the token. When the token expires or
//! the server rejects it, the session moves to `Expired` and the next request
//! creates a new one.

mod events;
mod manager;
mod state;

pub use events::SessionEvent;
pub use state::SessionToken;

pub(crate) use manager::SessionManager;

/// Path of the session endpoint.
pub(crate) const SESSIONS_PATH: &str = "/v2/sessions";
