use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::users::error::CredentialError;

/// Request body accepted as JSON or as an urlencoded form.
///
/// Any body that can't be parsed into `T` (bad JSON, wrong field types,
/// missing content type) becomes a validation error instead of axum's
/// default 415/422 rejection.
pub struct Payload<T>(pub T);

fn invalid_body(reason: impl std::fmt::Display) -> ApiError {
    CredentialError::Validation(format!("invalid request body: {reason}")).into()
}

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| invalid_body(e.body_text()))?;
            return Ok(Self(value));
        }

        // JSON is the default, with or without a content type.
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| invalid_body(e.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(invalid_body)
    }
}
