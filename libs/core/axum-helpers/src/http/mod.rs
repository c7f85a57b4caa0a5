//! CORS and security header middleware applied by [`create_router`](crate::create_router).

pub mod cors;
pub mod security;

pub use cors::{cors_from_env, create_cors_layer};
pub use security::security_headers;
