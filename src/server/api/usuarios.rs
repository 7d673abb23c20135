use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
};

use crate::auth::RequireWritable;
use crate::error::Error;
use crate::server::AppState;
use crate::server::client::ClientIp;
use crate::server::dto::UsuarioRequest;
use crate::server::limit::THROTTLED_MESSAGE;
use crate::server::response::{ApiError, OkResponse, StoreResultExt};
use crate::server::validation::validate_usuario_name;
use crate::types::Usuario;

const DUPLICATE_NAME_MESSAGE: &str = "Ese nombre ya existe";

fn throttle_write(state: &AppState, ip: IpAddr) -> Result<(), ApiError> {
    state.limiter.check_write(ip).map_err(|wait| {
        tracing::warn!(client = %ip, "Write throttled");
        ApiError::too_many_requests(THROTTLED_MESSAGE, wait)
    })
}

fn request_name(payload: Result<Json<UsuarioRequest>, JsonRejection>) -> Result<String, ApiError> {
    let Json(req) = payload.map_err(|e| {
        tracing::warn!(error = %e, "Rejected usuario body");
        ApiError::bad_request("Cuerpo de la solicitud inválido")
    })?;
    validate_usuario_name(req.name.as_deref())
}

fn usuario_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Identificador inválido"))
}

pub async fn list_usuarios(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Usuario>>, ApiError> {
    let usuarios = state
        .store
        .list_usuarios()
        .api_err("Error al obtener usuarios")?;

    Ok(Json(usuarios))
}

pub async fn create_usuario(
    _writable: RequireWritable,
    ClientIp(ip): ClientIp,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UsuarioRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    throttle_write(&state, ip)?;
    let name = request_name(payload)?;

    let id = match state.store.create_usuario(&name) {
        Ok(id) => id,
        Err(Error::AlreadyExists) => return Err(ApiError::bad_request(DUPLICATE_NAME_MESSAGE)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create usuario");
            return Err(ApiError::internal("Error al crear usuario"));
        }
    };

    tracing::info!(id, client = %ip, "Created usuario");
    Ok(Json(OkResponse::new("Usuario creado")))
}

pub async fn update_usuario(
    _writable: RequireWritable,
    ClientIp(ip): ClientIp,
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UsuarioRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    throttle_write(&state, ip)?;
    let id = usuario_id(path)?;
    let name = request_name(payload)?;

    match state.store.update_usuario(id, &name) {
        Ok(true) => tracing::info!(id, client = %ip, "Updated usuario"),
        Ok(false) => tracing::debug!(id, "Update matched no usuario"),
        Err(Error::AlreadyExists) => return Err(ApiError::bad_request(DUPLICATE_NAME_MESSAGE)),
        Err(e) => {
            tracing::error!(error = %e, id, "Failed to update usuario");
            return Err(ApiError::internal("Error al actualizar usuario"));
        }
    }

    Ok(Json(OkResponse::new("Usuario actualizado")))
}

pub async fn delete_usuario(
    _writable: RequireWritable,
    ClientIp(ip): ClientIp,
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    throttle_write(&state, ip)?;
    let id = usuario_id(path)?;

    let deleted = state
        .store
        .delete_usuario(id)
        .api_err("Error al eliminar usuario")?;

    if deleted {
        tracing::info!(id, client = %ip, "Deleted usuario");
    } else {
        tracing::debug!(id, "Delete matched no usuario");
    }

    Ok(Json(OkResponse::new("Usuario eliminado")))
}
