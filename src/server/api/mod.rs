mod permisos;
mod usuarios;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};

use crate::server::AppState;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Usuarios
        .route(
            "/usuarios",
            get(usuarios::list_usuarios).post(usuarios::create_usuario),
        )
        .route(
            "/usuarios/{id}",
            put(usuarios::update_usuario).delete(usuarios::delete_usuario),
        )
        // Permission flag
        .route("/permisos", get(permisos::get_permisos))
}
