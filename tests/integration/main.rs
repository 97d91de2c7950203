//! Integration tests for the ETA Rust SDK.
//!
//! These tests drive a real [`eta::Client`] over HTTP against a local
//! [`wiremock`] server that plays the ETA API.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test integration
//!
//! # With SDK logs
//! RUST_LOG=eta=debug cargo test --test integration -- --nocapture
//! ```

mod common;
mod dispatch_tests;
mod geo_tests;
mod session_tests;
