mod gate;
mod middleware;

pub use gate::PermissionGate;
pub use middleware::{GateError, RequireWritable};
