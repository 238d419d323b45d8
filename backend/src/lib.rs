pub mod database;
pub mod error;
pub mod eta;
pub mod gpx_export;
pub mod providers;
pub mod routes_handlers;
pub mod segmenter;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::database::{Database, DatabaseError};
use crate::error::{InvalidInput, PlanError};
use crate::eta::assemble;
use crate::providers::{ProviderError, TripServices};
use crate::segmenter::segment;
use shared::{ApiError, PlanRouteRequest, PlannedRoute};

pub struct AppState<S> {
    pub db: Arc<Database>,
    pub services: Arc<S>,
}

// Manual impl: `S` itself is behind an Arc and need not be Clone.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            services: Arc::clone(&self.services),
        }
    }
}

pub fn create_router<S: TripServices>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/routes/plan", post(plan_route::<S>))
        .route("/api/routes", get(routes_handlers::list_routes::<S>))
        .route(
            "/api/routes/:id",
            get(routes_handlers::get_route::<S>).delete(routes_handlers::delete_route::<S>),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /api/routes/plan - Geocode, route, segment into checkpoints, save
async fn plan_route<S: TripServices>(
    State(state): State<AppState<S>>,
    Json(req): Json<PlanRouteRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    plan(&state, req).await.map(Json).map_err(plan_error_response)
}

async fn plan<S: TripServices>(
    state: &AppState<S>,
    req: PlanRouteRequest,
) -> Result<PlannedRoute, PlanError> {
    // Parameter errors are the caller's to fix; check them before spending
    // provider calls.
    if !(req.interval_km > 0.0) || !req.interval_km.is_finite() {
        return Err(InvalidInput::InvalidInterval(req.interval_km).into());
    }
    if !(req.average_speed_kmh > 0.0) || !req.average_speed_kmh.is_finite() {
        return Err(InvalidInput::InvalidSpeed(req.average_speed_kmh).into());
    }

    let origin = state.services.geocode(&req.origin).await?;
    let destination = state.services.geocode(&req.destination).await?;
    let driven = state.services.directions(origin, destination).await?;

    let segmentation = segment(&driven.polyline, req.interval_km)?;
    let checkpoints = assemble(&segmentation.checkpoints, req.average_speed_kmh)?;

    let record = state
        .db
        .save_route(
            &req.origin,
            &req.destination,
            driven.distance_km,
            &segmentation.polyline,
            &checkpoints,
        )
        .await?;

    tracing::info!(
        "planned route {} ({} -> {}): {:.1} km, {} checkpoints",
        record.id,
        req.origin,
        req.destination,
        driven.distance_km,
        checkpoints.len()
    );

    Ok(PlannedRoute {
        id: record.id,
        origin: req.origin,
        destination: req.destination,
        distance_km: driven.distance_km,
        path: segmentation.polyline,
        checkpoints,
    })
}

pub(crate) fn plan_error_response(err: PlanError) -> (StatusCode, Json<ApiError>) {
    let status = match &err {
        PlanError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PlanError::Provider(ProviderError::NotFound(_)) => StatusCode::NOT_FOUND,
        PlanError::Provider(_) => StatusCode::BAD_GATEWAY,
        PlanError::Database(DatabaseError::NotFound(_)) => StatusCode::NOT_FOUND,
        PlanError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
        PlanError::Gpx(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}
