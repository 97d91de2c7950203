//! Transport layer for ETA API communication.
//!
//! This module provides the transport boundary and its implementations:
//!
//! - REST transport (via reqwest) - default, talks to the real API
//! - Mock transport - for testing without network
//!
//! A transport makes a single attempt per request and returns the response
//! as received. Interpreting status codes, signing and caching happen above
//! it, in the dispatcher.
//!
//! ## Feature Flags
//!
//! - `rest` (default): Enable the REST transport
//!
//! ## Custom transports
//!
//! Anything implementing [`TransportClient`] can be handed to
//! [`ClientBuilder::transport`](crate::ClientBuilder::transport).

pub(crate) mod traits;

#[cfg(feature = "rest")]
pub(crate) mod rest;

pub(crate) mod mock;

pub use traits::{
    RawResponse, ResponseHeaders, SignedRequest, TransportClient, is_session_error_code,
};

pub use mock::{MockTransport, session_document};

#[cfg(feature = "rest")]
pub use rest::{RestTransport, RestTransportBuilder};
