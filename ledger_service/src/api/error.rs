use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::error::LedgerError;

// Error unificado de la API; envuelve la taxonomía de dominio.
#[derive(Debug)]
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.0 {
            LedgerError::InsufficientBalance(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.to_string())
            }
            LedgerError::SourceWalletNotFound(_)
            | LedgerError::DestinationWalletNotFound(_)
            | LedgerError::WalletNotFound(_)
            | LedgerError::AssetTypeNotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            LedgerError::InvalidAmount(_)
            | LedgerError::SameWallet(_)
            | LedgerError::IdempotencyKeyRequired => (StatusCode::BAD_REQUEST, self.0.to_string()),
            LedgerError::RequestAlreadyProcessing(_)
            | LedgerError::ConcurrentModificationSource(_)
            | LedgerError::ConcurrentModificationDestination(_) => {
                (StatusCode::CONFLICT, self.0.to_string())
            }
            LedgerError::LockUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, self.0.to_string())
            }
            LedgerError::RepositoryError(ref e) => {
                tracing::error!("Database Repository Error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            LedgerError::LockStoreError(ref e) | LedgerError::IdempotencyStoreError(ref e) => {
                tracing::error!("Key/Value Store Error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": error_message,
        }));

        (status, body).into_response()
    }
}
