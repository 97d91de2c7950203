//! Core types for the ETA SDK.
//!
//! This module contains the values that cross the public API:
//! - [`ApiRequest`], [`Method`] and [`Params`]: what to send
//! - [`ApiResponse`]: what comes back
//! - [`User`] and [`Permissions`]: who is attached to the session

mod request;
mod response;
mod user;

pub use request::{ApiRequest, Method, Params};
pub use response::ApiResponse;
pub use user::{Permissions, User};
