//! Authentication types for the ETA SDK.
//!
//! An application authenticates with an API key and secret:
//!
//! - The key is sent once, when the session is created.
//! - The secret never leaves the process. It signs every request made
//!   with the session token.
//!
//! ## Example
//!
//! ```rust,ignore
//! use eta::{Client, Credentials};
//!
//! let client = Client::builder()
//!     .credentials(Credentials::new("api-key", "api-secret"))
//!     .build()?;
//! ```

mod credentials;
pub(crate) mod signature;

pub use credentials::{ApiSecret, Credentials};
