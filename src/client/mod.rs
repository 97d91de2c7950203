//! Client types for talking to the ETA API.
//!
//! - [`Client`]: Owns the session, the geolocation and the request pipeline
//! - [`SharedClient`]: A configure-before-use slot for a client
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eta::prelude::*;
//!
//! # async fn example() -> eta::Result<()> {
//! let client = Client::builder()
//!     .credentials(("api_key", "api_secret"))
//!     .build()?;
//!
//! client.set_location(55.6761, 12.5683, 5_000.0, true);
//!
//! let catalogs = client
//!     .api("/v2/catalogs", Method::Get, Params::new())
//!     .live()
//!     .await?;
//! println!("{}", catalogs.payload);
//! # Ok(())
//! # }
//! ```

mod builder;
mod inner;
mod shared;

pub use builder::{ClientBuilder, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HasCredentials, NoCredentials};
pub use shared::SharedClient;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::auth::Credentials;
use crate::dispatch::ResponseStream;
use crate::geo::{GeoSnapshot, GeolocationContext, Location};
use crate::session::SessionEvent;
use crate::types::{ApiRequest, Method, Params, User};
use crate::Result;

/// The ETA SDK client.
///
/// This is the main entry point for the SDK. Create a client using
/// [`Client::builder()`] or [`Client::new()`], then issue requests with
/// [`api`](Client::api) or [`request`](Client::request).
///
/// A session is created lazily on the first request. Requests issued while
/// it is being created wait for it and are sent in submission order.
///
/// ## Thread Safety
///
/// `Client` is `Clone` and thread-safe. Clones share the session, the
/// geolocation and the cache.
///
/// ## Example
///
/// ```rust,no_run
/// use eta::{Client, Credentials};
///
/// # async fn example() -> eta::Result<()> {
/// let client = Client::new(Credentials::new("api_key", "api_secret"))?;
/// client.connect_with_user("anne@example.com", "hunter2").await?;
///
/// if client.allows_permission("api.shoppinglists.write") {
///     // ...
/// }
///
/// // Clone for use across tasks
/// let client2 = client.clone();
/// tokio::spawn(async move {
///     let _ = client2.api_cached("/v2/offers", eta::Method::Get, eta::Params::new());
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<inner::ClientInner>,
}

impl Client {
    /// Creates a new client builder.
    ///
    /// The builder uses the typestate pattern to ensure credentials are
    /// provided at compile time.
    pub fn builder() -> ClientBuilder<NoCredentials> {
        ClientBuilder::new()
    }

    /// Creates a client for the production API.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`](crate::ErrorKind::Configuration) error if
    /// the API key or secret is empty.
    pub fn new(credentials: impl Into<Credentials>) -> Result<Self> {
        Self::builder().credentials(credentials).build()
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// Creates the session now instead of on the first request.
    pub async fn connect(&self) -> Result<()> {
        self.inner.session.ensure_session().await.map(|_| ())
    }

    /// Creates the session and attaches a user.
    pub async fn connect_with_user(&self, email: &str, password: &str) -> Result<User> {
        self.connect().await?;
        self.attach_user(email, password).await
    }

    /// Authenticates a user and attaches them to the session.
    ///
    /// # Errors
    ///
    /// Returns an [`Authentication`](crate::ErrorKind::Authentication) error
    /// if the credentials are rejected. The session stays usable.
    pub async fn attach_user(&self, email: &str, password: &str) -> Result<User> {
        self.inner.session.attach_user(email, password).await
    }

    /// Detaches the user. The session itself is kept.
    pub async fn detach_user(&self) -> Result<()> {
        self.inner.session.detach_user().await
    }

    /// Returns `true` if the attached user may perform `action`.
    ///
    /// Returns `false` when no user is attached.
    pub fn allows_permission(&self, action: &str) -> bool {
        self.inner.session.allows_permission(action)
    }

    /// Returns a copy of the attached user.
    pub fn attached_user(&self) -> Option<User> {
        self.inner.session.attached_user()
    }

    /// Returns the identifier of the attached user.
    pub fn attached_user_id(&self) -> Option<String> {
        self.inner.session.attached_user_id()
    }

    /// Returns `true` if a valid session exists.
    pub fn is_connected(&self) -> bool {
        self.inner.session.is_connected()
    }

    /// Subscribes to session events, such as user changes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.session.subscribe()
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Sends a request.
    ///
    /// Must be called within a Tokio runtime. See [`ResponseStream`] for the
    /// delivery contract.
    pub fn request(&self, request: ApiRequest) -> ResponseStream {
        self.inner.dispatcher.dispatch(request)
    }

    /// Sends a request without using the cache. Exactly one delivery.
    pub fn api(&self, path: impl Into<String>, method: Method, params: Params) -> ResponseStream {
        self.request(ApiRequest::new(path, method, params))
    }

    /// Sends a request, delivering a cached response first if one exists.
    pub fn api_cached(
        &self,
        path: impl Into<String>,
        method: Method,
        params: Params,
    ) -> ResponseStream {
        self.request(ApiRequest {
            use_cache: true,
            ..ApiRequest::new(path, method, params)
        })
    }

    // ------------------------------------------------------------------------
    // Geolocation
    // ------------------------------------------------------------------------

    /// Sets location, distance and sensor flag at once.
    ///
    /// The distance is clamped to the nearest of
    /// [`preferred_distances`](Client::preferred_distances).
    pub fn set_location(&self, latitude: f64, longitude: f64, distance: f64, is_from_sensor: bool) {
        self.inner.geo.set_location(latitude, longitude, distance, is_from_sensor);
    }

    /// Replaces only the location.
    pub fn set_coordinates(&self, location: Option<Location>) {
        self.inner.geo.set_coordinates(location);
    }

    /// Replaces only the distance.
    pub fn set_distance(&self, distance: Option<f64>) {
        self.inner.geo.set_distance(distance);
    }

    /// Marks whether the location came from a device sensor.
    pub fn set_location_from_sensor(&self, is_from_sensor: bool) {
        self.inner.geo.set_location_from_sensor(is_from_sensor);
    }

    /// Clears the location. No geolocation is sent until a new one is set.
    pub fn clear_location(&self) {
        self.inner.geo.clear_location();
    }

    /// Returns the current geolocation.
    pub fn geolocation(&self) -> Arc<GeoSnapshot> {
        self.inner.geo.snapshot()
    }

    /// Returns the allowed distances in meters, ascending.
    pub fn preferred_distances(&self) -> &'static [u32] {
        GeolocationContext::preferred_distances()
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Returns the base URL of the client.
    pub fn base_url(&self) -> &str {
        self.inner.base_url.as_str()
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &str {
        &self.inner.api_key
    }

    /// Creates a client from the inner implementation.
    pub(crate) fn from_inner(inner: inner::ClientInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("api_key", &self.inner.api_key)
            .finish_non_exhaustive()
    }
}
