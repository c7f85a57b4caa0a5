//! Shared application state, built once in `main` and handed to each router.

use axum_helpers::Authenticator;
use domain_notifications::PushProvider;
use mongodb::{Client, Database};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// Shares the connection pool across clones
    pub mongo_client: Client,
    pub db: Database,
    pub authenticator: Arc<Authenticator>,
    pub push_provider: Arc<dyn PushProvider>,
}
