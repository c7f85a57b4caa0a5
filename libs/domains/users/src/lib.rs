//! Users Domain
//!
//! Church members as seen by the notification pipeline: identity, active flag,
//! and at most one registered device push token with its platform tag.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints (create, activate, push-token registration)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business rules (unique email, token ownership)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Trait + MongoDB implementation
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, enums
//! └─────────────┘
//! ```
//!
//! ```rust,ignore
//! use domain_users::{handlers, MongoUserRepository, UserService};
//!
//! let repository = MongoUserRepository::new(db.clone());
//! repository.create_indexes().await?;
//! let router = handlers::router(UserService::new(repository));
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongo;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use models::{
    CreateUser, DevicePlatform, RegisterPushToken, User, UserFilter, UserResponse,
};
pub use mongo::{MongoUserRepository, USERS_COLLECTION, UserDocument};
pub use repository::UserRepository;
pub use service::UserService;
