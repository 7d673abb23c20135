use serde::{Deserialize, Serialize};

/// A row of the `usuarios` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usuario {
    pub id: i64,
    pub name: String,
}
