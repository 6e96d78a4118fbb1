//!
//! # Custom Error Handling
//!
//! This module defines the application-wide error type `AppError`.
//! Route handlers recover from the user-correctable variants themselves
//! (`Validation`, `InvalidCredentials`, `Forbidden`) by re-rendering a form or
//! flashing a notice; everything else propagates through `?` and is turned into
//! a status page by the `ResponseError` implementation below.
//!
//! `From` implementations cover `sqlx::Error`, `validator::ValidationErrors`,
//! `bcrypt::BcryptError` and the session errors from `actix-session`.

use actix_session::{SessionGetError, SessionInsertError};
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::forms::FormErrors;

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// Field-scoped input errors (HTTP 422). The offending form is re-rendered.
    Validation(FormErrors),
    /// Email/password pair did not match a stored account (HTTP 401).
    InvalidCredentials,
    /// A login-required route was hit without a valid session.
    /// Answered with a redirect to the login page carrying `next`.
    Unauthenticated { next: String },
    /// The actor does not own the entity it tried to mutate (HTTP 403).
    Forbidden(String),
    /// Represents a situation where a requested resource was not found (HTTP 404).
    NotFound(String),
    /// Represents a client-side error due to a malformed request (HTTP 400).
    BadRequest(String),
    /// Represents an error originating from database operations (HTTP 500).
    Database(String),
    /// Represents any other unexpected server-side error (HTTP 500).
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "Validation Error: {}", errors),
            AppError::InvalidCredentials => write!(f, "Invalid email or password"),
            AppError::Unauthenticated { next } => write!(f, "Login required for {}", next),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Database(msg) => write!(f, "Database Error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Builds the `/login?next=...` location used for the login-required redirect.
pub fn login_location(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("/login?{}", query)
}

fn error_page(status: StatusCode, template: &str, message: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "template": template,
        "current_user": null,
        "flashes": [],
        "context": { "error": message }
    }))
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthenticated { .. } => StatusCode::SEE_OTHER,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(errors) => HttpResponse::UnprocessableEntity().json(json!({
                "error": "Validation failed",
                "errors": errors
            })),
            AppError::InvalidCredentials => HttpResponse::Unauthorized().json(json!({
                "error": self.to_string()
            })),
            AppError::Unauthenticated { next } => HttpResponse::SeeOther()
                .insert_header((header::LOCATION, login_location(next)))
                .finish(),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "error": msg
            })),
            AppError::NotFound(msg) => error_page(StatusCode::NOT_FOUND, "404", msg),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            // Storage and internal faults never leak their detail to the client.
            AppError::Database(msg) | AppError::Internal(msg) => {
                log::error!("{}", msg);
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500",
                    "An unexpected error has occurred",
                )
            }
        }
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` maps to `NotFound`; everything else is a storage fault.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::Database(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into field-scoped `AppError::Validation`.
impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> AppError {
        AppError::Validation(FormErrors::from(errors))
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::Internal`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::Internal(format!("Password hashing failed: {}", error))
    }
}

impl From<SessionGetError> for AppError {
    fn from(error: SessionGetError) -> AppError {
        AppError::Internal(format!("Failed to read session: {}", error))
    }
}

impl From<SessionInsertError> for AppError {
    fn from(error: SessionInsertError) -> AppError {
        AppError::Internal(format!("Failed to write session: {}", error))
    }
}
