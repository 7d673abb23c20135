mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Usuario operations
    fn list_usuarios(&self) -> Result<Vec<Usuario>>;
    /// Inserts a usuario and returns its assigned id.
    /// Fails with `Error::AlreadyExists` if the name is taken.
    fn create_usuario(&self, name: &str) -> Result<i64>;
    /// Renames a usuario. Returns false if no row has this id.
    /// Fails with `Error::AlreadyExists` if another row already has the name.
    fn update_usuario(&self, id: i64, name: &str) -> Result<bool>;
    fn delete_usuario(&self, id: i64) -> Result<bool>;

    // Permission row operations
    fn get_role(&self) -> Result<Option<Role>>;
    fn set_role(&self, role: &Role) -> Result<()>;
}
