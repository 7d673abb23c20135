use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Maps a unique-index violation on `usuarios.nombre` to `Error::AlreadyExists`.
fn map_name_conflict(err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::AlreadyExists
        }
        e => Error::from(e),
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Usuario operations

    fn list_usuarios(&self) -> Result<Vec<Usuario>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT pk_idusuario, nombre FROM usuarios ORDER BY pk_idusuario")?;

        let rows = stmt.query_map([], |row| {
            Ok(Usuario {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn create_usuario(&self, name: &str) -> Result<i64> {
        let conn = self.conn();
        conn.execute("INSERT INTO usuarios (nombre) VALUES (?1)", params![name])
            .map_err(map_name_conflict)?;
        Ok(conn.last_insert_rowid())
    }

    fn update_usuario(&self, id: i64, name: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute(
                "UPDATE usuarios SET nombre = ?1 WHERE pk_idusuario = ?2",
                params![name, id],
            )
            .map_err(map_name_conflict)?;
        Ok(rows > 0)
    }

    fn delete_usuario(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM usuarios WHERE pk_idusuario = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Permission row operations

    fn get_role(&self) -> Result<Option<Role>> {
        let conn = self.conn();
        conn.query_row("SELECT rol FROM permisos LIMIT 1", [], |row| {
            row.get::<_, String>(0)
        })
        .optional()
        .map(|rol| rol.map(Role::from))
        .map_err(Error::from)
    }

    fn set_role(&self, role: &Role) -> Result<()> {
        self.conn().execute(
            "INSERT INTO permisos (id, rol) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET rol = excluded.rol",
            params![role.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn name_of(store: &SqliteStore, id: i64) -> Option<String> {
        store
            .list_usuarios()
            .unwrap()
            .into_iter()
            .find(|u| u.id == id)
            .map(|u| u.name)
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"usuarios".to_string()));
        assert!(tables.contains(&"permisos".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_temp, store) = test_store();
        store.create_usuario("Juan Perez").unwrap();

        store.initialize().unwrap();

        assert_eq!(store.list_usuarios().unwrap().len(), 1);
    }

    #[test]
    fn test_usuario_crud() {
        let (_temp, store) = test_store();

        let id = store.create_usuario("Juan Perez").unwrap();
        assert_eq!(name_of(&store, id).as_deref(), Some("Juan Perez"));

        assert!(store.update_usuario(id, "Juan Pérez").unwrap());
        assert_eq!(name_of(&store, id).as_deref(), Some("Juan Pérez"));

        assert!(store.delete_usuario(id).unwrap());
        assert!(name_of(&store, id).is_none());
    }

    #[test]
    fn test_list_usuarios_ordered_by_id() {
        let (_temp, store) = test_store();

        let first = store.create_usuario("Zoe").unwrap();
        let second = store.create_usuario("Ana").unwrap();

        let usuarios = store.list_usuarios().unwrap();
        assert_eq!(
            usuarios,
            vec![
                Usuario {
                    id: first,
                    name: "Zoe".to_string()
                },
                Usuario {
                    id: second,
                    name: "Ana".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_create_duplicate_name_fails() {
        let (_temp, store) = test_store();

        store.create_usuario("Maria").unwrap();
        let result = store.create_usuario("Maria");

        assert!(matches!(result, Err(Error::AlreadyExists)));
        assert_eq!(store.list_usuarios().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_check_ignores_ascii_case() {
        let (_temp, store) = test_store();

        store.create_usuario("Maria").unwrap();
        assert!(matches!(
            store.create_usuario("MARIA"),
            Err(Error::AlreadyExists)
        ));
    }

    #[test]
    fn test_update_to_other_rows_name_fails() {
        let (_temp, store) = test_store();

        store.create_usuario("Maria").unwrap();
        let id = store.create_usuario("Lucia").unwrap();

        let result = store.update_usuario(id, "Maria");
        assert!(matches!(result, Err(Error::AlreadyExists)));
        assert_eq!(name_of(&store, id).as_deref(), Some("Lucia"));
    }

    #[test]
    fn test_update_to_own_name_succeeds() {
        let (_temp, store) = test_store();

        let id = store.create_usuario("Maria").unwrap();
        assert!(store.update_usuario(id, "Maria").unwrap());
    }

    #[test]
    fn test_update_and_delete_missing_row() {
        let (_temp, store) = test_store();

        assert!(!store.update_usuario(42, "Nadie").unwrap());
        assert!(!store.delete_usuario(42).unwrap());
    }

    #[test]
    fn test_role_roundtrip() {
        let (_temp, store) = test_store();

        assert!(store.get_role().unwrap().is_none());

        store.set_role(&Role::viewer()).unwrap();
        assert_eq!(store.get_role().unwrap(), Some(Role::viewer()));

        store.set_role(&Role::admin()).unwrap();
        assert_eq!(store.get_role().unwrap(), Some(Role::admin()));

        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM permisos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
