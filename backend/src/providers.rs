//! External service clients: geocoding and driving directions
//! (OpenRouteService), current weather (OpenWeatherMap) and nearby points of
//! interest (Nominatim).
//!
//! The HTTP layer depends on the [`TripServices`] trait rather than on
//! concrete clients, so tests substitute a mock implementation and no
//! process-wide client singleton exists. The core performs no retries;
//! provider failures surface unchanged to the caller.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use shared::{Coordinate, NamedPoint, WeatherSummary};

pub const ORS_BASE_URL: &str = "https://api.openrouteservice.org";
pub const OWM_BASE_URL: &str = "https://api.openweathermap.org";
pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim requires an identifying user agent.
const USER_AGENT: &str = "waymark/0.1";

/// Categories looked up around the destination on the route detail view.
pub const DEFAULT_POI_CATEGORIES: [&str; 3] = ["tourism", "restaurant", "viewpoint"];

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("no match found for place '{0}'")]
    NotFound(String),
}

/// A driving route as returned by the routing provider.
#[derive(Debug, Clone)]
pub struct DrivenRoute {
    pub polyline: Vec<Coordinate>,
    pub distance_km: f64,
}

/// The external collaborators the planner consumes as black boxes.
///
/// Weather and points of interest are display-only; callers degrade on their
/// failures instead of failing the request.
pub trait TripServices: Send + Sync + 'static {
    fn geocode(
        &self,
        place: &str,
    ) -> impl Future<Output = Result<Coordinate, ProviderError>> + Send;

    fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<DrivenRoute, ProviderError>> + Send;

    fn weather(
        &self,
        at: Coordinate,
    ) -> impl Future<Output = Result<WeatherSummary, ProviderError>> + Send;

    fn points_of_interest(
        &self,
        at: Coordinate,
        category: &str,
    ) -> impl Future<Output = Result<Vec<NamedPoint>, ProviderError>> + Send;
}

#[derive(Debug, Clone)]
pub struct TripServicesConfig {
    pub ors_api_key: String,
    pub owm_api_key: String,
    pub ors_base_url: String,
    pub owm_base_url: String,
    pub nominatim_base_url: String,
    pub timeout_secs: u64,
}

impl TripServicesConfig {
    pub fn new(ors_api_key: String, owm_api_key: String) -> Self {
        Self {
            ors_api_key,
            owm_api_key,
            ors_base_url: ORS_BASE_URL.to_string(),
            owm_base_url: OWM_BASE_URL.to_string(),
            nominatim_base_url: NOMINATIM_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Production implementation over a single pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTripServices {
    config: TripServicesConfig,
    client: reqwest::Client,
}

impl HttpTripServices {
    pub fn new(config: TripServicesConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { config, client })
    }
}

impl TripServices for HttpTripServices {
    async fn geocode(&self, place: &str) -> Result<Coordinate, ProviderError> {
        let url = format!("{}/geocode/search", self.config.ors_base_url);
        let response = self
            .client
            .get(url)
            .query(&[("api_key", self.config.ors_api_key.as_str()), ("text", place)])
            .send()
            .await?;
        let body: GeocodeResponse = decode(response).await?;

        body.features
            .into_iter()
            .next()
            .map(|feature| feature.geometry.coordinate())
            .ok_or_else(|| ProviderError::NotFound(place.to_string()))
    }

    async fn directions(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<DrivenRoute, ProviderError> {
        let url = format!(
            "{}/v2/directions/driving-car/geojson",
            self.config.ors_base_url
        );
        // The provider's wire order is [lon, lat].
        let body = serde_json::json!({
            "coordinates": [[origin.lon, origin.lat], [destination.lon, destination.lat]],
        });
        let response = self
            .client
            .post(url)
            .header("Authorization", &self.config.ors_api_key)
            .json(&body)
            .send()
            .await?;
        let body: DirectionsResponse = decode(response).await?;

        let feature = body
            .features
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Api {
                status: 200,
                message: "directions response contained no route".to_string(),
            })?;

        Ok(feature.into_driven_route())
    }

    async fn weather(&self, at: Coordinate) -> Result<WeatherSummary, ProviderError> {
        let url = format!("{}/data/2.5/weather", self.config.owm_base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
                ("appid", self.config.owm_api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;
        let body: WeatherResponse = decode(response).await?;

        Ok(body.into_summary())
    }

    async fn points_of_interest(
        &self,
        at: Coordinate,
        category: &str,
    ) -> Result<Vec<NamedPoint>, ProviderError> {
        let url = format!("{}/search", self.config.nominatim_base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("format", "json".to_string()),
                ("q", category.to_string()),
                ("lat", at.lat.to_string()),
                ("lon", at.lon.to_string()),
            ])
            .send()
            .await?;
        let places: Vec<NominatimPlace> = decode(response).await?;

        Ok(to_named_points(places))
    }
}

/// Check the status before deserializing so provider error bodies become
/// readable `Api` errors instead of decode failures.
async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    geometry: PointGeometry,
}

#[derive(Debug, Deserialize)]
struct PointGeometry {
    /// Wire order is [lon, lat].
    coordinates: [f64; 2],
}

impl PointGeometry {
    fn coordinate(&self) -> Coordinate {
        Coordinate {
            lon: self.coordinates[0],
            lat: self.coordinates[1],
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    features: Vec<DirectionsFeature>,
}

#[derive(Debug, Deserialize)]
struct DirectionsFeature {
    geometry: LineGeometry,
    properties: DirectionsProperties,
}

impl DirectionsFeature {
    fn into_driven_route(self) -> DrivenRoute {
        let polyline = self
            .geometry
            .coordinates
            .iter()
            .map(|pair| Coordinate {
                lon: pair[0],
                lat: pair[1],
            })
            .collect();
        let distance_m: f64 = self.properties.segments.iter().map(|s| s.distance).sum();

        DrivenRoute {
            polyline,
            distance_km: distance_m / 1000.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    /// Wire order is [lon, lat].
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct DirectionsProperties {
    segments: Vec<DirectionsSegment>,
}

#[derive(Debug, Deserialize)]
struct DirectionsSegment {
    /// Metres.
    distance: f64,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: WeatherMain,
    weather: Vec<WeatherCondition>,
}

impl WeatherResponse {
    fn into_summary(self) -> WeatherSummary {
        let condition = self.weather.into_iter().next().unwrap_or_default();
        WeatherSummary {
            temperature_c: self.main.temp,
            description: condition.description,
            icon: condition.icon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherMain {
    temp: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WeatherCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    #[serde(default)]
    display_name: Option<String>,
    /// Nominatim serializes coordinates as strings.
    lat: String,
    lon: String,
}

fn to_named_points(places: Vec<NominatimPlace>) -> Vec<NamedPoint> {
    places
        .into_iter()
        .filter_map(|place| {
            let lat = place.lat.parse().ok()?;
            let lon = place.lon.parse().ok()?;
            Some(NamedPoint {
                name: place.display_name.unwrap_or_else(|| "unnamed".to_string()),
                position: Coordinate { lat, lon },
            })
        })
        .collect()
}
