use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Body of `POST /api/usuarios` and `PUT /api/usuarios/{id}`.
///
/// `name` stays optional so a missing field is reported by the name
/// validator like any other bad name.
#[derive(Debug, Default, Deserialize)]
pub struct UsuarioRequest {
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PermisosResponse {
    pub role: Role,
}
