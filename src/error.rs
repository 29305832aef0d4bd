use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::users::dto::MessageResponse;
use crate::users::error::{CredentialError, StoreError};

/// Error type returned by every HTTP handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("no such user, username = {0}")]
    NoSuchUser(String),

    #[error("password mismatch")]
    PasswordMismatch,

    #[error("No users found.")]
    NotFound,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Credential(CredentialError::Store(e))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Credential(CredentialError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Credential(CredentialError::Store(StoreError::UsernameTaken(_))) => {
                StatusCode::CONFLICT
            }
            Self::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoSuchUser(_) | Self::PasswordMismatch => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let message = match &self {
            Self::Credential(CredentialError::Store(StoreError::Unavailable(_))) => {
                "database unavailable".to_string()
            }
            Self::Credential(CredentialError::Store(StoreError::Lookup(_))) => {
                "There was a problem finding the users.".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses() {
        let validation: ApiError = CredentialError::Validation("username is required".into()).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

        let taken: ApiError = StoreError::UsernameTaken("alice".into()).into();
        assert_eq!(taken.status(), StatusCode::CONFLICT);

        let lookup: ApiError = StoreError::Lookup("xyz".into()).into();
        assert_eq!(lookup.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let hashing: ApiError = CredentialError::Hashing("boom".into()).into();
        assert_eq!(hashing.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(ApiError::NoSuchUser("bob".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::PasswordMismatch.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn messages_match_login_contract() {
        assert_eq!(
            ApiError::NoSuchUser("bob".into()).to_string(),
            "no such user, username = bob"
        );
        assert_eq!(ApiError::PasswordMismatch.to_string(), "password mismatch");
    }
}
