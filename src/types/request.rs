//! API request description.

use std::fmt;

use serde_json::{Map, Value};

/// Request parameters, as a JSON object.
///
/// GET and DELETE requests send them as a query string, POST and PUT as a
/// JSON body.
pub type Params = Map<String, Value>;

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// Read a resource or list.
    #[default]
    Get,
    /// Create a resource.
    Post,
    /// Update a resource.
    Put,
    /// Delete a resource.
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Returns `true` for methods that change server state.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Method::Get)
    }

    /// Returns `true` if parameters travel in the query string.
    pub fn uses_query(&self) -> bool {
        matches!(self, Method::Get | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to the ETA API.
///
/// ## Example
///
/// ```rust
/// use eta::{ApiRequest, Method};
/// use serde_json::json;
///
/// let request = ApiRequest::builder()
///     .path("/v2/catalogs")
///     .method(Method::Get)
///     .params(json!({ "limit": 24 }).as_object().cloned().unwrap_or_default())
///     .use_cache(true)
///     .build();
///
/// assert_eq!(request.path, "/v2/catalogs");
/// assert!(request.use_cache);
/// ```
#[derive(Debug, Clone, PartialEq, bon::Builder)]
pub struct ApiRequest {
    /// Endpoint path relative to the base URL, e.g. `/v2/catalogs`.
    #[builder(into)]
    pub path: String,

    /// HTTP method.
    #[builder(default)]
    pub method: Method,

    /// Caller parameters. Geolocation is merged in at dispatch time.
    #[builder(default)]
    pub params: Params,

    /// Deliver a cached response first, if one exists.
    #[builder(default = false)]
    pub use_cache: bool,
}

impl ApiRequest {
    /// Creates a request without cache use.
    pub fn new(path: impl Into<String>, method: Method, params: Params) -> Self {
        Self {
            path: path.into(),
            method,
            params,
            use_cache: false,
        }
    }
}
