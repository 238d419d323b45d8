// Module database - PostgreSQL connection pool and operations
// Routes own their checkpoints for the lifetime of the route; deleting a
// route cascades to its checkpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Checkpoint, Coordinate};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Route not found: {0}")]
    NotFound(i32),

    #[error("Invalid route data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Saved route (DB representation). The extended polyline is stored as JSON
/// so the stored geometry matches the checkpoint kilometre markers exactly.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RouteRecord {
    pub id: i32,
    pub origin: String,
    pub destination: String,
    pub distance_km: f64,
    pub created_at: DateTime<Utc>,
    pub path: sqlx::types::JsonValue,
}

#[derive(Debug, Clone, FromRow)]
struct CheckpointRow {
    lat: f64,
    lon: f64,
    km: f64,
    eta_hours: f64,
}

impl From<CheckpointRow> for Checkpoint {
    fn from(row: CheckpointRow) -> Self {
        Checkpoint {
            position: Coordinate {
                lat: row.lat,
                lon: row.lon,
            },
            km: row.km,
            eta_hours: row.eta_hours,
        }
    }
}

/// Database connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a connection pool from `DATABASE_URL`.
    pub async fn new() -> Result<Self, DatabaseError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            DatabaseError::Config("DATABASE_URL environment variable not set".to_string())
        })?;
        Self::connect(&database_url).await
    }

    /// Create a connection pool for an explicit connection string.
    pub async fn connect(database_url: &str) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool created");

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        // SQLx query() cannot handle multiple statements, so use raw SQL.
        let mut conn = self.pool.acquire().await?;

        let migration_sql = include_str!("../migrations/20250812_create_routes.sql");

        sqlx::raw_sql(migration_sql).execute(&mut *conn).await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// Save a route together with all of its checkpoints.
    ///
    /// Route and checkpoints are written in one transaction: a failed insert
    /// leaves no partial route behind.
    pub async fn save_route(
        &self,
        origin: &str,
        destination: &str,
        distance_km: f64,
        path: &[Coordinate],
        checkpoints: &[Checkpoint],
    ) -> Result<RouteRecord, DatabaseError> {
        let path_json =
            serde_json::to_value(path).map_err(|e| DatabaseError::InvalidData(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let route = sqlx::query_as::<_, RouteRecord>(
            r#"
            INSERT INTO routes (origin, destination, distance_km, path)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(origin)
        .bind(destination)
        .bind(distance_km)
        .bind(path_json)
        .fetch_one(&mut *tx)
        .await?;

        for checkpoint in checkpoints {
            sqlx::query(
                r#"
                INSERT INTO checkpoints (route_id, lat, lon, km, eta_hours)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(route.id)
            .bind(checkpoint.position.lat)
            .bind(checkpoint.position.lon)
            .bind(checkpoint.km)
            .bind(checkpoint.eta_hours)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Route saved: {} -> {} (ID: {}, {} checkpoints)",
            route.origin,
            route.destination,
            route.id,
            checkpoints.len()
        );
        Ok(route)
    }

    /// Get all saved routes, newest first.
    pub async fn list_routes(&self) -> Result<Vec<RouteRecord>, DatabaseError> {
        let routes =
            sqlx::query_as::<_, RouteRecord>("SELECT * FROM routes ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        tracing::debug!("Retrieved {} routes", routes.len());
        Ok(routes)
    }

    /// Get a specific route by ID
    pub async fn get_route(&self, id: i32) -> Result<RouteRecord, DatabaseError> {
        let route = sqlx::query_as::<_, RouteRecord>("SELECT * FROM routes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NotFound(id))?;

        Ok(route)
    }

    /// Get a route's checkpoints in ascending kilometre order.
    pub async fn checkpoints_for(&self, route_id: i32) -> Result<Vec<Checkpoint>, DatabaseError> {
        let rows = sqlx::query_as::<_, CheckpointRow>(
            "SELECT lat, lon, km, eta_hours FROM checkpoints WHERE route_id = $1 ORDER BY km",
        )
        .bind(route_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Checkpoint::from).collect())
    }

    /// Delete a route by ID; checkpoints go with it.
    pub async fn delete_route(&self, id: i32) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM routes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(id));
        }

        tracing::info!("Route deleted: ID {}", id);
        Ok(())
    }

    /// Decode the stored extended polyline.
    pub fn path_of(record: &RouteRecord) -> Result<Vec<Coordinate>, DatabaseError> {
        serde_json::from_value(record.path.clone())
            .map_err(|e| DatabaseError::InvalidData(format!("Failed to deserialize path: {}", e)))
    }
}
