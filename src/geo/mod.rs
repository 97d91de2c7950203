//! Geolocation context applied to every outbound request.
//!
//! The context holds the last known location, a search radius, and whether
//! the location came from a device sensor. Nothing is sent by default.
//! Once a location is set, every request carries:
//!
//! | Parameter  | Value                                         |
//! |------------|-----------------------------------------------|
//! | `r_lat`    | latitude                                      |
//! | `r_lng`    | longitude                                     |
//! | `r_sensor` | `true` if the location came from a sensor     |
//! | `r_radius` | clamped distance in meters (only if set)      |
//!
//! The radius is never sent without a location.
//!
//! ## Distance clamping
//!
//! Distances are snapped to the nearest value of [`PREFERRED_DISTANCES`].
//! A distance exactly halfway between two preferred values goes to the
//! smaller one. Distances outside the list go to the nearest end.
//!
//! ```rust
//! use eta::geo::clamp_distance;
//!
//! assert_eq!(clamp_distance(1_400.0), 1_000);
//! assert_eq!(clamp_distance(1_500.0), 1_000); // tie -> smaller
//! assert_eq!(clamp_distance(1_600.0), 2_000);
//! assert_eq!(clamp_distance(1_000_000.0), 350_000);
//! ```

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Params;

/// Search radii (in meters) that the API prefers, in ascending order.
pub const PREFERRED_DISTANCES: [u32; 9] = [
    1_000, 2_000, 5_000, 10_000, 20_000, 50_000, 100_000, 200_000, 350_000,
];

/// Snaps a distance (meters) to the nearest preferred distance.
///
/// Ties resolve to the smaller distance. `NaN` resolves to the smallest.
pub fn clamp_distance(distance: f64) -> u32 {
    let mut best = PREFERRED_DISTANCES[0];
    let mut best_delta = (f64::from(best) - distance).abs();

    for &candidate in &PREFERRED_DISTANCES[1..] {
        let delta = (f64::from(candidate) - distance).abs();
        // strict: an equal delta keeps the earlier (smaller) candidate
        if delta < best_delta {
            best = candidate;
            best_delta = delta;
        }
    }

    best
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Location {
    /// Creates a location.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// An immutable view of the geolocation context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoSnapshot {
    location: Option<Location>,
    distance: Option<u32>,
    is_from_sensor: bool,
}

impl GeoSnapshot {
    /// Returns the location, if any.
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Returns the clamped distance in meters, if any.
    ///
    /// A distance may be stored without a location; it is still not sent.
    pub fn distance(&self) -> Option<u32> {
        self.distance
    }

    /// Returns `true` if the location came from a device sensor.
    pub fn is_from_sensor(&self) -> bool {
        self.is_from_sensor
    }

    /// Writes the geolocation parameters into `params`.
    ///
    /// Existing `r_*` keys are overwritten so that every request carries the
    /// same geolocation. Without a location nothing is written and any
    /// `r_radius` is removed, since a radius means nothing without a center.
    pub(crate) fn apply_to(&self, params: &mut Params) {
        let Some(location) = self.location else {
            params.remove("r_radius");
            return;
        };

        params.insert("r_lat".into(), Value::from(location.latitude));
        params.insert("r_lng".into(), Value::from(location.longitude));
        params.insert("r_sensor".into(), Value::from(self.is_from_sensor));
        if let Some(distance) = self.distance {
            params.insert("r_radius".into(), Value::from(distance));
        }
    }
}

/// Shared, atomically replaced geolocation state.
///
/// Writers build a new [`GeoSnapshot`] and swap it in whole, so a reader
/// never sees a location from one update paired with a distance from another.
#[derive(Debug, Default)]
pub struct GeolocationContext {
    current: RwLock<Arc<GeoSnapshot>>,
}

impl GeolocationContext {
    /// Creates an empty context. No geolocation is sent until a location is set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the preferred distances in ascending order.
    pub fn preferred_distances() -> &'static [u32] {
        &PREFERRED_DISTANCES
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<GeoSnapshot> {
        Arc::clone(&self.current.read())
    }

    /// Sets location, distance and sensor flag in one update.
    ///
    /// The distance is clamped to the nearest preferred distance.
    pub fn set_location(&self, latitude: f64, longitude: f64, distance: f64, is_from_sensor: bool) {
        let next = GeoSnapshot {
            location: Some(Location::new(latitude, longitude)),
            distance: Some(clamp_distance(distance)),
            is_from_sensor,
        };
        tracing::debug!(
            latitude,
            longitude,
            distance = next.distance,
            is_from_sensor,
            "geolocation updated"
        );
        *self.current.write() = Arc::new(next);
    }

    /// Replaces only the location. `None` stops all geolocation parameters.
    pub fn set_coordinates(&self, location: Option<Location>) {
        self.update(|snapshot| snapshot.location = location);
    }

    /// Replaces only the distance, clamping it. `None` stops sending a radius.
    pub fn set_distance(&self, distance: Option<f64>) {
        self.update(|snapshot| snapshot.distance = distance.map(clamp_distance));
    }

    /// Marks whether the location came from a device sensor.
    pub fn set_location_from_sensor(&self, is_from_sensor: bool) {
        self.update(|snapshot| snapshot.is_from_sensor = is_from_sensor);
    }

    /// Clears the location. The distance is kept but no longer sent.
    pub fn clear_location(&self) {
        self.set_coordinates(None);
    }

    fn update(&self, change: impl FnOnce(&mut GeoSnapshot)) {
        let mut guard = self.current.write();
        let mut next = GeoSnapshot::clone(&guard);
        change(&mut next);
        *guard = Arc::new(next);
    }
}
