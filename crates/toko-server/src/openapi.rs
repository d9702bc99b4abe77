use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Toko API",
        version = "0.1.0",
        description = "Account management for users and toko, with paginated search and rate-limited login."
    ),
    paths(
        crate::routes::login,
        crate::routes::list_accounts,
        crate::routes::create_account,
        crate::routes::get_account,
        crate::routes::update_account,
        crate::routes::delete_account,
        crate::routes::change_password,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::LoginRequest,
        crate::dto::LoginResponse,
        crate::dto::CreateAccountRequest,
        crate::dto::CreateAccountResponse,
        crate::dto::UpdateAccountRequest,
        crate::dto::ChangePasswordRequest,
        crate::dto::IdResponse,
        crate::dto::AccountResponse,
        crate::dto::AccountListResponse,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "authentication", description = "Login and token issuance"),
        (name = "accounts", description = "User and toko account management"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the JWT bearer security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Token returned by POST /api/authentication/login.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
