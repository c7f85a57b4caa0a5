//! # Axum Helpers
//!
//! Shared HTTP plumbing for the API binaries.
//!
//! - **[`auth`]**: caller credential extraction and verification (API keys, session tokens)
//! - **[`server`]**: router assembly, health endpoint, graceful shutdown
//! - **[`http`]**: CORS and security header middleware
//! - **[`errors`]**: structured error responses with error codes
//! - **[`extractors`]**: UUID path and validated JSON extractors
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::app_info;
//!
//! let router = create_router::<ApiDoc>(api_routes).await?
//!     .merge(health_router(app_info!()));
//! create_production_app(router, &server_config, async {}).await?;
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{
    AuthConfig, AuthError, AuthMethod, Authenticator, Caller, CallerCredential,
    CredentialVerifier,
};
pub use errors::{AppError, ErrorCode, ErrorResponse};
pub use extractors::{UuidPath, ValidatedJson};
pub use http::{create_cors_layer, security_headers};
pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_production_app, create_router, health_router,
    run_health_checks, shutdown_signal,
};
