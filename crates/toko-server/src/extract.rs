//! Request extractors that report failures in the API error format.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use toko_core::AppError;

use crate::error::ApiError;

/// JSON body that has been deserialized and passed its `validator` rules.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::ValidationError(vec![rejection.body_text()]))?;

        value.validate().map_err(validation_errors)?;
        Ok(Self(value))
    }
}

/// Flatten `validator` output into `field: message` lines, sorted by field.
pub fn validation_errors(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let messages = fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: invalid value ({})", e.code),
            })
        })
        .collect();

    AppError::ValidationError(messages)
}

/// The `{id}` path segment of account routes.
pub struct AccountId(pub Uuid);

impl<S> FromRequestParts<S> for AccountId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::ValidationError(vec![rejection.body_text()]))?;

        parse_id(&raw).map(Self).map_err(ApiError::from)
    }
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::ValidationError(vec![format!("id: '{raw}' is not a valid id")]))
}
