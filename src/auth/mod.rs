//! Authentication: JWT issuing, verification, and route guards

pub mod middleware;
pub mod service;

pub use middleware::{jwt_auth_middleware, require_operator};
pub use service::{AuthService, Claims, Role};
