//! Scheduled connection type.
//!
//! A `Connection` is one directed trip segment between two adjacent stops.
//! Names are stored as `Arc<str>` so routes can be cloned cheaply while the
//! searches extend them state by state.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;

use super::TransitTime;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance in kilometres using the haversine formula.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::Coordinates;
    ///
    /// let a = Coordinates::new(51.0, 17.0);
    /// let b = Coordinates::new(52.0, 17.0);
    /// // One degree of latitude is roughly 111 km
    /// assert!((a.haversine_km(&b) - 111.19).abs() < 0.1);
    /// ```
    pub fn haversine_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();
        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// One scheduled trip segment.
///
/// Connections are immutable once built. The schedule is not validated here:
/// a connection whose departure is after its arrival can exist, and the
/// searches skip it (see [`Connection::is_usable`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub id: u32,
    pub company: Arc<str>,
    pub line: Arc<str>,
    pub departure: TransitTime,
    pub arrival: TransitTime,
    pub origin: Arc<str>,
    pub destination: Arc<str>,
    pub origin_coords: Coordinates,
    pub destination_coords: Coordinates,
}

impl Connection {
    /// Returns true if the connection departs no later than it arrives.
    pub fn is_usable(&self) -> bool {
        self.departure <= self.arrival
    }

    /// Returns true if this connection can be boarded by someone at its
    /// origin at `time`.
    pub fn boardable_at(&self, time: TransitTime) -> bool {
        self.is_usable() && self.departure >= time
    }

    /// Returns the in-vehicle time.
    pub fn duration(&self) -> Duration {
        self.arrival.signed_duration_since(self.departure)
    }

    /// Returns true if boarding `next` after this one changes line.
    pub fn is_transfer_to(&self, next: &Connection) -> bool {
        self.line != next.line
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}-{}",
            self.line, self.arrival, self.origin, self.destination
        )
    }
}
