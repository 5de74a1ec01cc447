use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// The generic message shown for any error that is not public.
pub const GENERIC_MESSAGE: &str =
    "Something went wrong. Please try again, and contact us if the problem persists.";

/// The application's error type.
///
/// Variants fall in three groups: public domain errors whose message may be
/// shown to the end user, private domain errors that must never be shown
/// verbatim, and infrastructure errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// A multipart error.
    #[error("Multipart error: {0}")]
    Multipart(String),

    /// A password hashing error.
    #[error("Hashing error: {0}")]
    Hashing(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// The requested record does not exist.
    #[error("resource was not found")]
    NotFound,

    /// The current user does not own the resource.
    #[error("you do not have permission to access this resource")]
    Forbidden,

    /// The submitted CSRF token did not match.
    #[error("your session has expired, please reload the page and try again")]
    CsrfMismatch,

    /// An id of zero or below was passed to a store.
    #[error("ID is invalid")]
    InvalidId,

    /// The password did not match the stored hash.
    #[error("password is invalid")]
    InvalidPassword,

    #[error("email address is required")]
    RequiredEmail,

    #[error("email address is invalid")]
    InvalidEmail,

    #[error("email address is already taken")]
    EmailTaken,

    #[error("password is required")]
    RequiredPassword,

    #[error("password length must be at least 8 characters")]
    ShortPassword,

    #[error("remember token length must be at least 32 bytes")]
    ShortRemember,

    #[error("remember token is required")]
    RequiredRemember,

    /// A token could not be decoded.
    #[error("token is malformed")]
    MalformedToken,

    #[error("title is required")]
    RequiredTitle,

    #[error("user ID is required")]
    RequiredUserId,

    #[error("filename is invalid")]
    InvalidFilename,

    #[error("only image files can be uploaded")]
    NotAnImage,
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether the message of this error may be shown to the end user.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            AppError::NotFound
                | AppError::Forbidden
                | AppError::CsrfMismatch
                | AppError::InvalidPassword
                | AppError::RequiredEmail
                | AppError::InvalidEmail
                | AppError::EmailTaken
                | AppError::RequiredPassword
                | AppError::ShortPassword
                | AppError::RequiredTitle
                | AppError::InvalidFilename
                | AppError::NotAnImage
        )
    }

    /// The user-facing message for public errors, with the first word
    /// capitalised. `None` for private and infrastructure errors.
    pub fn public_message(&self) -> Option<String> {
        if !self.is_public() {
            return None;
        }
        let message = self.to_string();
        let mut chars = message.chars();
        chars
            .next()
            .map(|first| first.to_uppercase().chain(chars).collect())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden | AppError::CsrfMismatch => StatusCode::FORBIDDEN,
            AppError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            e if e.is_public() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::NotFound => tracing::debug!("Resource not found"),
            AppError::Forbidden | AppError::CsrfMismatch => {
                tracing::warn!("Authorization failed: {}", self)
            }
            AppError::Multipart(msg) => tracing::warn!("Multipart error: {}", msg),
            e if e.is_public() => tracing::debug!("Validation error: {}", e),
            e => tracing::error!("{}", e),
        }

        let message = self
            .public_message()
            .unwrap_or_else(|| GENERIC_MESSAGE.to_string());

        (status, Html(format!("<p>{message}</p>"))).into_response()
    }
}
