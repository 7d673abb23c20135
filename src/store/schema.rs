pub const SCHEMA: &str = r#"
-- Display names managed through the panel
CREATE TABLE IF NOT EXISTS usuarios (
    pk_idusuario INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL COLLATE NOCASE
);

-- Single-row global switch; rol = 'admin' makes the API writable.
-- The CHECK keeps it to one row.
CREATE TABLE IF NOT EXISTS permisos (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    rol TEXT NOT NULL
);

-- Duplicate names are rejected by the database, not by a prior read
CREATE UNIQUE INDEX IF NOT EXISTS idx_usuarios_nombre ON usuarios(nombre);
"#;
