//! API routes, nested under `/api` by `axum_helpers::create_router`.

pub mod health;
pub mod notifications;
pub mod users;

use axum::Router;

use crate::state::AppState;

pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/users", users::router(state))
        .nest("/notifications", notifications::router(state))
        .merge(health::router(state.clone()))
}

/// Create collection indexes; safe to run on every start.
pub async fn init_indexes(state: &AppState) -> eyre::Result<()> {
    users::init_indexes(&state.db).await?;
    notifications::init_indexes(&state.db).await?;
    Ok(())
}
