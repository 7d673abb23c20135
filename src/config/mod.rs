mod server;

pub use server::{LimitConfig, ServerConfig};
