use std::sync::Arc;

use axum::{Json, extract::State};

use crate::server::AppState;
use crate::server::dto::PermisosResponse;
use crate::server::response::{ApiError, StoreResultExt};

/// Reports the current role straight from the database, bypassing the
/// gate's cache.
pub async fn get_permisos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PermisosResponse>, ApiError> {
    let role = state
        .store
        .get_role()
        .api_err("Error al obtener permisos")?
        .ok_or_else(|| ApiError::not_found("Permiso no configurado"))?;

    Ok(Json(PermisosResponse { role }))
}
