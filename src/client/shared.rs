//! Configure-before-use client slot.

use std::sync::OnceLock;

use crate::{Client, Error, Result};

/// A slot that holds one [`Client`] once it has been configured.
///
/// For applications that want one client reachable from many places without
/// passing it around. The slot is owned by the caller, typically as a
/// `static`, and must be initialized before use; there is no hidden default.
///
/// ```rust
/// use eta::{Client, SharedClient};
///
/// static ETA: SharedClient = SharedClient::new();
///
/// // Using the slot before configuring it fails.
/// assert!(ETA.get().is_err());
///
/// ETA.initialize(Client::new(("api_key", "api_secret"))?)?;
/// assert_eq!(ETA.get()?.api_key(), "api_key");
/// # Ok::<(), eta::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct SharedClient {
    slot: OnceLock<Client>,
}

impl SharedClient {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Stores the client.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`](crate::ErrorKind::Configuration) error if
    /// the slot was already initialized. The stored client is kept.
    pub fn initialize(&self, client: Client) -> Result<()> {
        self.slot
            .set(client)
            .map_err(|_| Error::configuration("shared client is already initialized"))
    }

    /// Returns the client.
    ///
    /// # Errors
    ///
    /// Returns a [`Configuration`](crate::ErrorKind::Configuration) error if
    /// [`initialize`](SharedClient::initialize) has not been called.
    pub fn get(&self) -> Result<&Client> {
        self.slot.get().ok_or_else(|| {
            Error::configuration("shared client used before initialize() was called")
        })
    }

    /// Returns `true` once a client has been stored.
    pub fn is_initialized(&self) -> bool {
        self.slot.get().is_some()
    }
}
