//! MongoDB connectivity shared by the domain crates and the API binary.
//!
//! - [`mongodb::connect_from_config_with_retry`] opens a verified client at startup.
//! - [`mongodb::check_health`] backs the readiness probe.
//! - [`mongodb::bson_ext`] converts `uuid`/`chrono` values to their BSON
//!   counterparts so documents store native binary UUIDs and dates.
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::mongodb::{self, MongoConfig};
//!
//! let config = MongoConfig::from_env()?;
//! let client = mongodb::connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(&config.database);
//! ```

pub mod common;
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
