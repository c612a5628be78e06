//! Command-line surface of the `graphy` binary.

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser, Debug)]
#[command(
    name = "graphy",
    version,
    about = "Query and update Microsoft 365 users and licenses via Microsoft Graph"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Acquire an access token and report how long it stays valid
    Token,
    /// Table of all users with their managers
    Users {
        #[arg(long, help = "Keep the manager.@odata.type column")]
        keep_odata_type: bool,
    },
    /// Raw user listing, optionally narrowed by an OData query
    ListUsers {
        #[arg(long, help = "OData query, e.g. \"$filter=department eq 'Finance'\"")]
        query: Option<String>,
    },
    /// Map of employeeId to directory object id
    UserIds,
    /// Map of mail address to user principal name
    MailUpns,
    /// Update properties of a user
    PatchUser {
        upn: String,
        #[arg(
            long = "set",
            value_name = "KEY=VALUE",
            required = true,
            value_parser = parse_property
        )]
        properties: Vec<(String, Value)>,
    },
    /// Create a user with a generated initial password
    CreateUser {
        upn: String,
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_property)]
        properties: Vec<(String, Value)>,
    },
    /// Set a user's manager
    SetManager { upn: String, manager_id: String },
    /// Assign a license SKU to a user
    AssignLicense { upn: String, sku_id: String },
    /// Map of SKU part number to SKU id
    Skus,
    /// Full subscribed SKU report
    LicenseReport,
}

/// Parse `key=value`. The value is read as JSON when it parses, else as a string.
pub fn parse_property(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing property name in `{}`", raw));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub fn into_properties(pairs: Vec<(String, Value)>) -> Map<String, Value> {
    pairs.into_iter().collect()
}
