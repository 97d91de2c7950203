//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types for easy importing:
//!
//! ```rust
//! use eta::prelude::*;
//! ```
//!
//! This provides access to:
//! - Core client types
//! - Error types
//! - Request and response types
//! - Session and geolocation types

pub use crate::{
    auth::Credentials,
    client::{Client, ClientBuilder, SharedClient},
    config::CacheConfig,
    dispatch::ResponseStream,
    error::{Error, ErrorKind, Result},
    geo::Location,
    session::SessionEvent,
    types::{ApiRequest, ApiResponse, Method, Params, Permissions, User},
};
