mod api;
pub mod client;
pub mod dto;
pub mod limit;
pub mod response;
mod router;
pub mod validation;

pub use api::api_router;
pub use router::{AppState, create_router};
