// Handlers for saved routes API endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::RouteRecord;
use crate::gpx_export::encode_route_as_gpx;
use crate::providers::{TripServices, DEFAULT_POI_CATEGORIES};
use crate::{plan_error_response, AppState};
use shared::{ApiError, Checkpoint, Coordinate, NamedPoint, WeatherSummary};

/// Everything the detail view needs for one saved route. Weather and points
/// of interest are display-only and degrade on provider failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct RouteDetail {
    pub id: i32,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub created_at: DateTime<Utc>,
    pub path: Vec<Coordinate>,
    pub checkpoints: Vec<Checkpoint>,
    pub gpx_base64: String,
    pub destination_weather: Option<WeatherSummary>,
    pub destination_pois: BTreeMap<String, Vec<NamedPoint>>,
}

/// GET /api/routes - List all saved routes
pub async fn list_routes<S: TripServices>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<RouteRecord>>, (StatusCode, Json<ApiError>)> {
    state
        .db
        .list_routes()
        .await
        .map(Json)
        .map_err(|e| plan_error_response(e.into()))
}

/// GET /api/routes/:id - Route detail with weather and POIs at the destination
pub async fn get_route<S: TripServices>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<Json<RouteDetail>, (StatusCode, Json<ApiError>)> {
    build_route_detail(&state, id)
        .await
        .map(Json)
        .map_err(plan_error_response)
}

/// DELETE /api/routes/:id - Delete a route and its checkpoints
pub async fn delete_route<S: TripServices>(
    State(state): State<AppState<S>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    state
        .db
        .delete_route(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|e| plan_error_response(e.into()))
}

async fn build_route_detail<S: TripServices>(
    state: &AppState<S>,
    id: i32,
) -> Result<RouteDetail, crate::error::PlanError> {
    let record = state.db.get_route(id).await?;
    let checkpoints = state.db.checkpoints_for(id).await?;
    let path = crate::database::Database::path_of(&record)?;
    let gpx_base64 = encode_route_as_gpx(&path, &checkpoints)?;

    // Segmentation guarantees at least 2 vertices, but a stored path is
    // caller data; degrade rather than index blindly.
    let destination = path.last().copied();

    let destination_weather = match destination {
        Some(at) => match state.services.weather(at).await {
            Ok(summary) => Some(summary),
            Err(err) => {
                tracing::warn!("weather lookup failed for route {id}: {err}");
                None
            }
        },
        None => None,
    };

    let mut destination_pois = BTreeMap::new();
    if let Some(at) = destination {
        for category in DEFAULT_POI_CATEGORIES {
            let points = match state.services.points_of_interest(at, category).await {
                Ok(points) => points,
                Err(err) => {
                    tracing::warn!("POI lookup '{category}' failed for route {id}: {err}");
                    Vec::new()
                }
            };
            destination_pois.insert(category.to_string(), points);
        }
    }

    Ok(RouteDetail {
        id: record.id,
        origin: record.origin,
        destination: record.destination,
        distance_km: record.distance_km,
        created_at: record.created_at,
        path,
        checkpoints,
        gpx_base64,
        destination_weather,
        destination_pois,
    })
}
