use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Router, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use toko_core::{AppError, Collection};

use crate::auth::{login_rate_limit, require_auth};
use crate::dto::{
    AccountListResponse, AccountResponse, ChangePasswordRequest, CreateAccountRequest,
    CreateAccountResponse, HealthResponse, IdResponse, ListAccountsQuery, LoginRequest,
    LoginResponse, UpdateAccountRequest,
};
use crate::error::{ApiError, route_not_found};
use crate::extract::{AccountId, ValidJson};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/authentication/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let api = auth_routes
        .merge(account_routes(&state, Collection::Users))
        .merge(account_routes(&state, Collection::Toko));

    let public = Router::new()
        .route("/status", get(status))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let app = if state.api_prefix.is_empty() {
        public.merge(api)
    } else {
        public.nest(&state.api_prefix, api)
    };

    app.fallback(route_not_found).with_state(state)
}

/// CRUD routes for one collection, all behind bearer auth.
fn account_routes(state: &Arc<AppState>, collection: Collection) -> Router<Arc<AppState>> {
    let base = format!("/{}", collection.as_str());

    Router::new()
        .route(&base, get(list_accounts).post(create_account))
        .route(&format!("{base}/create"), post(create_account))
        .route(
            &format!("{base}/{{id}}"),
            get(get_account).put(update_account).delete(delete_account),
        )
        .route(&format!("{base}/{{id}}/change-password"), post(change_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .route_layer(Extension(collection))
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/authentication/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid body", body = crate::dto::ErrorResponse),
        (status = 403, description = "Wrong credentials or too many attempts", body = crate::dto::ErrorResponse),
    ),
    tag = "authentication"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .accounts(Collection::Users)
        .authenticate(&body.email, &body.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    let token = state.jwt.issue(&account)?;
    tracing::info!(user_id = %account.id, "Login succeeded");

    Ok(axum::Json(LoginResponse {
        email: account.email,
        name: account.name,
        user_id: account.id,
        token,
    }))
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/{collection}",
    params(
        ("collection" = String, Path, description = "`users` or `toko`"),
        ListAccountsQuery,
    ),
    responses(
        (status = 200, description = "One page of accounts", body = AccountListResponse),
        (status = 400, description = "Invalid query parameters", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    query: Result<Query<ListAccountsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| AppError::InvalidQueryParameters(e.body_text()))?;

    let page = state.accounts(collection).list(&query.into()).await?;

    Ok(axum::Json(AccountListResponse::from(page)))
}

#[utoipa::path(
    post,
    path = "/api/{collection}/create",
    params(("collection" = String, Path, description = "`users` or `toko`")),
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Account created", body = CreateAccountResponse),
        (status = 400, description = "Invalid body", body = crate::dto::ErrorResponse),
        (status = 403, description = "Password confirmation mismatched", body = crate::dto::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    ValidJson(body): ValidJson<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts(collection).create(body.into()).await?;

    Ok(axum::Json(CreateAccountResponse {
        name: account.name,
        email: account.email,
    }))
}

#[utoipa::path(
    get,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "`users` or `toko`"),
        ("id" = uuid::Uuid, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Account details", body = AccountResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    AccountId(id): AccountId,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts(collection).get(id).await?;

    Ok(axum::Json(AccountResponse::from(account)))
}

#[utoipa::path(
    put,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "`users` or `toko`"),
        ("id" = uuid::Uuid, Path, description = "Account ID"),
    ),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = IdResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    AccountId(id): AccountId,
    ValidJson(body): ValidJson<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .accounts(collection)
        .update(id, &body.name, &body.email)
        .await?;

    Ok(axum::Json(IdResponse { id }))
}

#[utoipa::path(
    delete,
    path = "/api/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "`users` or `toko`"),
        ("id" = uuid::Uuid, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Account deleted", body = IdResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    AccountId(id): AccountId,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts(collection).delete(id).await?;

    Ok(axum::Json(IdResponse { id }))
}

#[utoipa::path(
    post,
    path = "/api/{collection}/{id}/change-password",
    params(
        ("collection" = String, Path, description = "`users` or `toko`"),
        ("id" = uuid::Uuid, Path, description = "Account ID"),
    ),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = IdResponse),
        (status = 403, description = "Mismatched confirmation or wrong old password", body = crate::dto::ErrorResponse),
        (status = 404, description = "Not found", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    AccountId(id): AccountId,
    ValidJson(body): ValidJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .accounts(collection)
        .change_password(id, body.into())
        .await?;

    Ok(axum::Json(IdResponse { id }))
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Liveness probe; answers `GET` and `HEAD` with an empty 200.
pub async fn status() -> StatusCode {
    StatusCode::OK
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            axum::Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(HealthResponse {
                    status: "unhealthy",
                    database: "error",
                }),
            )
        }
    }
}
