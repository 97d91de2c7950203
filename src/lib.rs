//! # ETA Rust SDK
//!
//! Rust SDK for the eTilbudsavis (ETA) commerce API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eta::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), eta::Error> {
//!     // Create client
//!     let client = Client::builder()
//!         .credentials(("your-api-key", "your-api-secret"))
//!         .build()?;
//!
//!     // Requests near a location carry it automatically
//!     client.set_location(55.6761, 12.5683, 5_000.0, true);
//!
//!     // Cached response first (if any), then the live one
//!     let mut responses = client.api_cached("/v2/catalogs", Method::Get, Params::new());
//!     while let Some(response) = responses.next_response().await {
//!         let response = response?;
//!         println!("from cache: {}", response.from_cache);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Key Concepts
//!
//! - **Lazy Session**: The first request creates the session; requests made
//!   meanwhile wait and are sent in submission order
//! - **One or Two Deliveries**: A [`ResponseStream`] yields a cached response
//!   before the live one when the cache has an entry
//! - **Denial ≠ Error**: `allows_permission()` returns `false`, not `Err`
//! - **Attach/Detach**: Users are attached to the session, not the other way
//!   round; detaching keeps the session token
//!
//! ## Features
//!
//! - `rest` (default): Enable REST transport via reqwest
//! - `rustls` (default): Use rustls for TLS
//! - `native-tls`: Use native TLS (OpenSSL on Linux, Secure Transport on macOS)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod session;
pub mod types;

// Transport layer
pub mod transport;

#[cfg(feature = "rest")]
mod user_agent;

// Prelude for convenient imports
pub mod prelude;

// Re-export main types at crate root for convenience
pub use client::{Client, ClientBuilder, SharedClient};
pub use dispatch::ResponseStream;
pub use error::{Error, ErrorKind, Result};
pub use geo::{GeoSnapshot, GeolocationContext, Location, PREFERRED_DISTANCES, clamp_distance};
pub use session::{SessionEvent, SessionToken};
pub use types::{ApiRequest, ApiResponse, Method, Params, Permissions, User};

// Re-export auth types
pub use auth::{ApiSecret, Credentials};

// Re-export cache and config types
pub use cache::{InMemoryCache, RequestSignature, ResponseCache};
pub use config::CacheConfig;

// Re-export transport types
pub use transport::{MockTransport, RawResponse, SignedRequest, TransportClient};
#[cfg(feature = "rest")]
pub use transport::RestTransport;

