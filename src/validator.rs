use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use infralearn_core::AppError;
use infralearn_models::validation::describe;

/// JSON body that has passed its `validator` rules. Every rejection is a 400
/// in the standard error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        value
            .validate()
            .map_err(|errors| AppError::bad_request(describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request("Missing 'Content-Type: application/json' header");
    }

    let message = rejection.body_text();

    if let Some(field) = missing_field(&message) {
        return AppError::bad_request(format!("{} is required", field));
    }

    if message.contains("invalid type") || message.contains("unknown variant") {
        return AppError::bad_request("Invalid field type in request");
    }

    AppError::bad_request("Invalid request body")
}

fn missing_field(message: &str) -> Option<String> {
    message
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
        .map(str::to_string)
}
