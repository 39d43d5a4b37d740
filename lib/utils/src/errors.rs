use std::fmt;
use std::fmt::Display;
use std::str::FromStr;

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NOT_AUTHENTICATED_MESSAGE: &str = "Please sign in to take part in the discussion.";
const NOT_AUTHORIZED_MESSAGE: &str = "Only moderators can do this.";
const BROKEN_THREAD_MESSAGE: &str = "Sorry, this discussion cannot be displayed right now.";
const BAD_REQUEST_MESSAGE: &str = "Please check what you wrote and try again.";
const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong on our side.";
const UNAVAILABLE_MESSAGE: &str = "We could not reach an external service, please try again later.";
const NOT_FOUND_MESSAGE: &str = "This page does not exist.";

/// Inconsistencies in stored discussion data that make a thread impossible to rebuild.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityError {
    #[error("comment {comment_id} belongs to post {comment_post_id} instead of post {post_id}")]
    ForeignComment {
        comment_id: i64,
        comment_post_id: i64,
        post_id: i64,
    },
    #[error("comment {comment_id} replies to comment {parent_id}, which is not part of post {post_id}")]
    ForeignParent {
        comment_id: i64,
        parent_id: i64,
        post_id: i64,
    },
    #[error("comment {comment_id} appears more than once")]
    DuplicateComment {
        comment_id: i64,
    },
    #[error("comment {comment_id} is part of a reply cycle")]
    CommentCycle {
        comment_id: i64,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    NotAuthenticated,
    InsufficientPrivileges,
    IntegrityError(IntegrityError),
    InvalidInput(String),
    ConfigurationError(String),
    TransportError(String),
    InternalServerError(String),
    NotFound,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated | AppError::InsufficientPrivileges => StatusCode::FORBIDDEN,
            AppError::IntegrityError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::TransportError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AppError::NotAuthenticated => String::from(NOT_AUTHENTICATED_MESSAGE),
            AppError::InsufficientPrivileges => String::from(NOT_AUTHORIZED_MESSAGE),
            AppError::IntegrityError(_) => String::from(BROKEN_THREAD_MESSAGE),
            AppError::InvalidInput(_) => String::from(BAD_REQUEST_MESSAGE),
            AppError::ConfigurationError(_) => String::from(INTERNAL_ERROR_MESSAGE),
            AppError::TransportError(_) => String::from(UNAVAILABLE_MESSAGE),
            AppError::InternalServerError(_) => String::from(INTERNAL_ERROR_MESSAGE),
            AppError::NotFound => String::from(NOT_FOUND_MESSAGE),
        }
    }

    pub fn error_detail(&self) -> String {
        match self {
            AppError::NotAuthenticated => String::from(NOT_AUTHENTICATED_MESSAGE),
            AppError::InsufficientPrivileges => String::from("Insufficient privileges"),
            AppError::IntegrityError(e) => e.to_string(),
            AppError::InvalidInput(e) => e.clone(),
            AppError::ConfigurationError(e) => e.clone(),
            AppError::TransportError(e) => e.clone(),
            AppError::InternalServerError(e) => e.clone(),
            AppError::NotFound => String::from(NOT_FOUND_MESSAGE),
        }
    }

    /// Constructs a new [`AppError::InternalServerError`] from some other type.
    pub fn new(msg: impl ToString) -> Self {
        Self::InternalServerError(msg.to_string())
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(self).unwrap_or_default())
    }
}

impl FromStr for AppError {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}

impl From<IntegrityError> for AppError {
    fn from(error: IntegrityError) -> Self {
        AppError::IntegrityError(error)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(errors.to_string())
    }
}

impl From<validator::ValidationError> for AppError {
    fn from(error: validator::ValidationError) -> Self {
        AppError::InvalidInput(error.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(error: std::env::VarError) -> Self {
        AppError::ConfigurationError(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        AppError::InvalidInput(error.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::TransportError(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::InternalServerError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use http::StatusCode;
    use crate::errors::{AppError, IntegrityError, BAD_REQUEST_MESSAGE, BROKEN_THREAD_MESSAGE, INTERNAL_ERROR_MESSAGE, NOT_AUTHENTICATED_MESSAGE, NOT_AUTHORIZED_MESSAGE, NOT_FOUND_MESSAGE, UNAVAILABLE_MESSAGE};

    fn cycle_error() -> IntegrityError {
        IntegrityError::CommentCycle { comment_id: 3 }
    }

    #[test]
    fn test_app_error_status_code() {
        let test_string = String::from("test");
        assert_eq!(AppError::NotAuthenticated.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::InsufficientPrivileges.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::IntegrityError(cycle_error()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::InvalidInput(test_string.clone()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::ConfigurationError(test_string.clone()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::TransportError(test_string.clone()).status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::InternalServerError(test_string.clone()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_app_error_user_message() {
        let test_string = String::from("test");
        assert_eq!(AppError::NotAuthenticated.user_message(), String::from(NOT_AUTHENTICATED_MESSAGE));
        assert_eq!(AppError::InsufficientPrivileges.user_message(), String::from(NOT_AUTHORIZED_MESSAGE));
        assert_eq!(AppError::IntegrityError(cycle_error()).user_message(), String::from(BROKEN_THREAD_MESSAGE));
        assert_eq!(AppError::InvalidInput(test_string.clone()).user_message(), String::from(BAD_REQUEST_MESSAGE));
        assert_eq!(AppError::ConfigurationError(test_string.clone()).user_message(), String::from(INTERNAL_ERROR_MESSAGE));
        assert_eq!(AppError::TransportError(test_string.clone()).user_message(), String::from(UNAVAILABLE_MESSAGE));
        assert_eq!(AppError::InternalServerError(test_string.clone()).user_message(), String::from(INTERNAL_ERROR_MESSAGE));
        assert_eq!(AppError::NotFound.user_message(), String::from(NOT_FOUND_MESSAGE));
    }

    #[test]
    fn test_app_error_detail() {
        assert_eq!(
            AppError::IntegrityError(cycle_error()).error_detail(),
            String::from("comment 3 is part of a reply cycle")
        );
        assert_eq!(
            AppError::IntegrityError(IntegrityError::ForeignParent { comment_id: 4, parent_id: 9, post_id: 1 }).error_detail(),
            String::from("comment 4 replies to comment 9, which is not part of post 1")
        );
        assert_eq!(AppError::InvalidInput(String::from("bad")).error_detail(), String::from("bad"));
    }

    #[test]
    fn test_app_error_new() {
        let test_str = "test";
        assert_eq!(AppError::new(test_str), AppError::InternalServerError(String::from(test_str)));
    }

    #[test]
    fn test_app_error_display_and_from_string() {
        let test_string = String::from("test");
        let app_error_vec = vec![
            AppError::NotAuthenticated,
            AppError::InsufficientPrivileges,
            AppError::IntegrityError(cycle_error()),
            AppError::IntegrityError(IntegrityError::DuplicateComment { comment_id: 2 }),
            AppError::InvalidInput(test_string.clone()),
            AppError::ConfigurationError(test_string.clone()),
            AppError::TransportError(test_string.clone()),
            AppError::InternalServerError(test_string.clone()),
            AppError::NotFound,
        ];
        for app_error in app_error_vec {
            assert_eq!(
                AppError::from_str(app_error.to_string().as_str()).expect("AppError should be convert to string and back"),
                app_error
            );
        }
        assert!(AppError::from_str("invalid").is_err());
    }

    #[test]
    fn test_app_error_from_integrity_error() {
        assert_eq!(AppError::from(cycle_error()), AppError::IntegrityError(cycle_error()));
    }

    #[test]
    fn test_app_error_from_env_var_error() {
        let env_var_error = std::env::var("AGORA_NOT_EXISTING_VARIABLE");
        assert!(env_var_error.is_err());
        let env_var_error = env_var_error.unwrap_err();
        assert_eq!(AppError::from(env_var_error.clone()), AppError::ConfigurationError(env_var_error.to_string()));
    }

    #[test]
    fn test_app_error_from_url_parse_error() {
        let error = url::ParseError::RelativeUrlWithoutBase;
        assert_eq!(AppError::from(error), AppError::InvalidInput(error.to_string()));
    }

    #[test]
    fn test_app_error_from_validation_error() {
        let error = validator::ValidationError::new("too_long");
        assert_eq!(AppError::from(error.clone()), AppError::InvalidInput(error.to_string()));
    }
}
