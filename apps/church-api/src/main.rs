use axum_helpers::{Authenticator, server::{create_production_app, health_router}};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::providers::provider_from_env;
use eyre::WrapErr;
use std::sync::Arc;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(database = %config.mongodb.database, "connecting to MongoDB");
    let mongo_client = database::mongodb::connect_from_config_with_retry(&config.mongodb, None)
        .await
        .wrap_err("connecting to MongoDB")?;
    let db = mongo_client.database(&config.mongodb.database);

    let push_provider = provider_from_env().wrap_err("configuring the push provider")?;
    info!(provider = push_provider.name(), "push provider ready");

    let state = AppState {
        authenticator: Arc::new(Authenticator::from_config(&config.auth)),
        config,
        mongo_client,
        db,
        push_provider,
    };

    api::init_indexes(&state).await.wrap_err("creating indexes")?;

    let api_routes = api::routes(&state);
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;
    let app = router.merge(health_router(state.config.app));

    info!(
        app = state.config.app.name,
        version = state.config.app.version,
        "starting church API"
    );

    let mongo_client = state.mongo_client.clone();
    create_production_app(app, &state.config.server, async move {
        info!("closing MongoDB connections");
        mongo_client.shutdown().await;
    })
    .await
    .wrap_err("server error")?;

    info!("church API shutdown complete");
    Ok(())
}
