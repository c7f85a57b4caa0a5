use axum::Router;
use axum_helpers::CredentialVerifier;
use domain_notifications::{
    MongoAudienceDirectory, MongoNotificationRepository, NotificationService, handlers,
};
use mongodb::Database;
use std::sync::Arc;

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    let verifier: Arc<dyn CredentialVerifier> = state.authenticator.clone();
    let service = NotificationService::with_dispatch_timeout(
        MongoAudienceDirectory::new(state.db.clone()),
        MongoNotificationRepository::new(state.db.clone()),
        Arc::clone(&state.push_provider),
        verifier,
        state.config.dispatch_timeout,
    );
    handlers::router(service)
}

pub async fn init_indexes(db: &Database) -> eyre::Result<()> {
    MongoNotificationRepository::new(db.clone())
        .create_indexes()
        .await?;
    Ok(())
}
