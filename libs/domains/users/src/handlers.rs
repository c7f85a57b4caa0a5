use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_helpers::{
    UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{CreateUser, DevicePlatform, RegisterPushToken, UserFilter, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        activate_user,
        deactivate_user,
        register_push_token,
        clear_push_token,
    ),
    components(
        schemas(UserResponse, CreateUser, RegisterPushToken, DevicePlatform, UserFilter),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "Church members and their device registrations")
    )
)]
pub struct ApiDoc;

pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user))
        .route("/{id}/activate", post(activate_user))
        .route("/{id}/deactivate", post(deactivate_user))
        .route(
            "/{id}/push-token",
            put(register_push_token).delete(clear_push_token),
        )
        .with_state(shared_service)
}

/// List users
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(UserFilter),
    responses(
        (status = 200, description = "Users, newest first", body = Vec<UserResponse>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Query(filter): Query<UserFilter>,
) -> UserResult<Json<Vec<UserResponse>>> {
    Ok(Json(service.list_users(filter).await?))
}

/// Create a user
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.get_user(id).await?))
}

/// Mark a user active (eligible for broadcasts)
#[utoipa::path(
    post,
    path = "/{id}/activate",
    tag = "Users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User activated", body = UserResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn activate_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.set_active(id, true).await?))
}

/// Mark a user inactive (excluded from broadcasts)
#[utoipa::path(
    post,
    path = "/{id}/deactivate",
    tag = "Users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated", body = UserResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn deactivate_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.set_active(id, false).await?))
}

/// Register the user's device push token
#[utoipa::path(
    put,
    path = "/{id}/push-token",
    tag = "Users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    request_body = RegisterPushToken,
    responses(
        (status = 200, description = "Token registered", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn register_push_token<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<RegisterPushToken>,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.register_push_token(id, input).await?))
}

/// Remove the user's device push token
#[utoipa::path(
    delete,
    path = "/{id}/push-token",
    tag = "Users",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Token cleared", body = UserResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn clear_push_token<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.clear_push_token(id).await?))
}
