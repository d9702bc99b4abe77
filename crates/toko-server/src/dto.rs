use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use toko_core::accounts::{ChangePassword, CreateAccount};
use toko_core::{Account, PageResult, RawListParams};

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub email: String,
    pub name: String,
    pub user_id: Uuid,
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 32, message = "password must be 6 to 32 characters"))]
    pub password: String,
    #[validate(length(min = 6, max = 32, message = "password_confirm must be 6 to 32 characters"))]
    pub password_confirm: String,
}

impl From<CreateAccountRequest> for CreateAccount {
    fn from(body: CreateAccountRequest) -> Self {
        Self {
            name: body.name,
            email: body.email,
            password: body.password,
            password_confirm: body.password_confirm,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CreateAccountResponse {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "password_old is required"))]
    pub password_old: String,
    #[validate(length(min = 6, max = 32, message = "password_new must be 6 to 32 characters"))]
    pub password_new: String,
    #[validate(length(min = 6, max = 32, message = "password_confirm must be 6 to 32 characters"))]
    pub password_confirm: String,
}

impl From<ChangePasswordRequest> for ChangePassword {
    fn from(body: ChangePasswordRequest) -> Self {
        Self {
            password_old: body.password_old,
            password_new: body.password_new,
            password_confirm: body.password_confirm,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct IdResponse {
    pub id: Uuid,
}

/// An account as returned to clients. The password hash is never exposed.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Query string of list endpoints. Values stay raw strings so malformed
/// numbers surface as `INVALID_QUERY_PARAMETERS` instead of extractor errors.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAccountsQuery {
    /// 1-based page index (default 1).
    pub page_number: Option<String>,
    /// Records per page (default 10).
    pub page_size: Option<String>,
    /// Case-insensitive substring matched against name and email.
    pub search: Option<String>,
    /// `field:direction`, e.g. `name:desc`.
    pub sort: Option<String>,
}

impl From<ListAccountsQuery> for RawListParams {
    fn from(query: ListAccountsQuery) -> Self {
        Self {
            page_number: query.page_number,
            page_size: query.page_size,
            search: query.search,
            sort: query.sort,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AccountListResponse {
    pub page_number: u64,
    pub page_size: u64,
    pub count: u64,
    pub total_pages: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub data: Vec<AccountResponse>,
}

impl From<PageResult<Account>> for AccountListResponse {
    fn from(page: PageResult<Account>) -> Self {
        let page = page.map(AccountResponse::from);
        Self {
            page_number: page.page_number,
            page_size: page.page_size,
            count: page.total_count,
            total_pages: page.total_pages,
            has_previous_page: page.has_previous_page,
            has_next_page: page.has_next_page,
            data: page.items,
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Stable machine-readable code, e.g. `NOT_FOUND`.
    pub error: String,
    pub description: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<String>>,
}
