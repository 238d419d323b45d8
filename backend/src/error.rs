use thiserror::Error;

use crate::database::DatabaseError;
use crate::providers::ProviderError;

/// Bad caller-supplied parameters. Always recoverable by correcting the
/// request, never retried automatically.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidInput {
    #[error("polyline needs at least 2 points, got {0}")]
    PolylineTooShort(usize),
    #[error("checkpoint interval must be a positive number of kilometres, got {0}")]
    InvalidInterval(f64),
    #[error("average speed must be a positive number of km/h, got {0}")]
    InvalidSpeed(f64),
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}
