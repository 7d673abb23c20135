use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::Error;
use crate::server::AppState;

/// Extractor that requires the system to be in admin (read-write) mode.
///
/// Place it first among a handler's arguments so a read-only system rejects
/// the request before any other work happens.
pub struct RequireWritable;

#[derive(Debug)]
pub enum GateError {
    ReadOnly,
    NotConfigured,
    InternalError,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GateError::ReadOnly => (StatusCode::FORBIDDEN, "Sistema en modo lectura"),
            GateError::NotConfigured => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Permisos no configurados")
            }
            GateError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error al validar permisos")
            }
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}

impl FromRequestParts<Arc<AppState>> for RequireWritable {
    type Rejection = GateError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let role = state
            .gate
            .current_role(state.store.as_ref())
            .map_err(|e| match e {
                Error::PermissionsNotConfigured => {
                    tracing::error!("permisos table has no row; writes are disabled");
                    GateError::NotConfigured
                }
                e => {
                    tracing::error!(error = %e, "Failed to read permission role");
                    GateError::InternalError
                }
            })?;

        if !role.is_admin() {
            tracing::warn!(%role, "Write rejected in read-only mode");
            return Err(GateError::ReadOnly);
        }

        Ok(RequireWritable)
    }
}
