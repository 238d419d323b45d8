use serde::{Deserialize, Serialize};

/// A WGS84 point. Named fields instead of a positional pair: the routing
/// provider speaks `[lon, lat]` while weather and display speak `(lat, lon)`,
/// and a named struct cannot be silently transposed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }
}

/// A synthetic point along a route at a fixed distance interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub position: Coordinate,
    /// Cumulative distance from the origin, km, rounded to 1 decimal.
    pub km: f64,
    /// Estimated elapsed time from the origin, hours, rounded to 2 decimals.
    pub eta_hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRouteRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default = "default_interval_km")]
    pub interval_km: f64,
    #[serde(default = "default_average_speed_kmh")]
    pub average_speed_kmh: f64,
}

pub fn default_interval_km() -> f64 {
    10.0
}

pub fn default_average_speed_kmh() -> f64 {
    60.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub id: i32,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    /// Extended polyline: the provider's path with every checkpoint
    /// interpolated as an additional vertex.
    pub path: Vec<Coordinate>,
    pub checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub temperature_c: f64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub name: String,
    pub position: Coordinate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
