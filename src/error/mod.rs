//! Error types for the ETA SDK.
//!
//! Every fallible operation returns [`Error`], categorized by [`ErrorKind`].
//!
//! ## Key Invariant
//!
//! A missing permission is not an error. `allows_permission()` returns
//! `false`; only the API itself answers `Forbidden` for a refused request.
//!
//! ```rust,ignore
//! if client.allows_permission("api.users.1234.read") {
//!     let user = client.api("/v2/users/1234", Method::Get, Params::new()).await?;
//! }
//! ```

#[allow(clippy::module_inception)]
mod error;
mod kind;

pub use error::Error;
pub use kind::ErrorKind;

/// A specialized `Result` type for ETA SDK operations.
pub type Result<T> = std::result::Result<T, Error>;
