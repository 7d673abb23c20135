//! # usuarios-panel
//!
//! A small admin API for a single `usuarios` table, usable both as a
//! standalone binary and as a library. Writes are only allowed while the one
//! row in `permisos` has role `admin`; every request is subject to per-client
//! rate limiting and writes to a minimum spacing per client.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use usuarios_panel::config::ServerConfig;
//! use usuarios_panel::server::{AppState, create_router};
//! use usuarios_panel::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(&config.db_path).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config));
//! let app = create_router(state).into_make_service_with_connect_info::<SocketAddr>();
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `usuarios-panel` binary.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
