//! Azure AD authentication module.
//!
//! Provides the OAuth2 client credentials flow and an in-memory token cache.

pub mod client_credentials;
pub mod token_cache;

pub use client_credentials::{BearerToken, ClientCredentialsClient};
pub use token_cache::{format_duration, time_until_expiry, TokenCache};
