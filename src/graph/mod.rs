//! Microsoft Graph API integration.
//!
//! This module provides:
//! - A client with shared status handling and `@odata.nextLink` pagination
//! - User endpoints (table, listing, update, creation, manager)
//! - License endpoints (assignment, subscribed SKUs)

pub mod client;
pub mod licenses;
pub mod models;
pub mod users;

pub use client::GraphClient;
pub use licenses::build_license_dict;
