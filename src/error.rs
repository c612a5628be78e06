//! Error types for graphy.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.

use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Token acquisition errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to create HTTP client: {0}")]
    ClientSetup(String),

    #[error("Token request failed: {0}")]
    TokenRequestFailed(String),

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),
}

/// Microsoft Graph API errors.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Graph API request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse API response: {0}")]
    ParseFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Bad request (400): {0}")]
    BadRequest(String),

    #[error("Unauthorized (401): Token may be expired")]
    Unauthorized,

    #[error("Forbidden (403): Insufficient permissions")]
    Forbidden,

    #[error("Not found (404)")]
    NotFound,

    #[error("Rate limited (429): Too many requests")]
    RateLimited,
}

/// Errors reshaping responses into tables.
#[derive(Error, Debug, PartialEq)]
pub enum TableError {
    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Expected a JSON object with a \"value\" array")]
    NotACollection,
}

impl AppError {
    /// Returns a user-friendly message for display on the terminal.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Auth(AuthError::TokenRequestFailed(_)) => {
                "Could not acquire an access token. Check client id, tenant and secret."
            }
            Self::Auth(AuthError::InvalidTokenResponse(_)) => {
                "Azure AD returned an unexpected token response."
            }
            Self::Api(ApiError::Unauthorized) => "Access token rejected. Acquire a new token.",
            Self::Api(ApiError::Forbidden) => {
                "Insufficient permissions. Grant the app the required Graph application roles."
            }
            Self::Api(ApiError::NotFound) => "The requested user or resource does not exist.",
            Self::Api(ApiError::RateLimited) => "Too many requests. Please wait a moment.",
            Self::Api(ApiError::BadRequest(_)) => "Graph rejected the request body.",
            Self::Table(TableError::MissingColumn(_)) => "The response lacks the requested column.",
            Self::Api(ApiError::RequestFailed(_)) => {
                "Graph request failed. Check your connection and try again."
            }
            _ => "An error occurred. Please try again.",
        }
    }

    /// Returns true if a fresh token could resolve this error.
    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::TokenRequestFailed(_)) | Self::Api(ApiError::Unauthorized)
        )
    }
}
