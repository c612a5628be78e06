//! graphy - a thin Microsoft Graph client for user and license administration.
//!
//! Acquire a token with [`auth::ClientCredentialsClient`], then call the
//! user and license endpoints on [`graph::GraphClient`]. Collection results
//! can be flattened into a [`table::Table`] and reduced to key/value maps.

#![deny(clippy::all)]

pub mod auth;
pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod table;
pub mod util;

pub use auth::{BearerToken, ClientCredentialsClient};
pub use config::Config;
pub use error::{ApiError, AppError, AuthError, TableError};
pub use graph::{build_license_dict, GraphClient};
pub use table::{get_mail_upn_dict, get_ms_id_dict, Table};
