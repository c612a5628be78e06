//! graphy - Microsoft Graph user and license administration from the terminal.

#![deny(clippy::all)]

mod cli;

use std::collections::BTreeMap;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing::{error, info};

use cli::{into_properties, Cli, Commands};
use graphy::auth::{format_duration, time_until_expiry};
use graphy::util::print_json;
use graphy::{
    build_license_dict, get_mail_upn_dict, get_ms_id_dict, AppError, ClientCredentialsClient,
    Config, GraphClient,
};

fn main() -> ExitCode {
    // Load .env file (if present) before anything else
    if let Err(e) = dotenvy::dotenv() {
        // .env file is optional - only warn if it exists but can't be read
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            eprintln!("\nPlease set the following environment variables:");
            eprintln!("  AZURE_CLIENT_ID=<your-app-registration-client-id>");
            eprintln!("  AZURE_TENANT_ID=<your-tenant-id>");
            eprintln!("  AZURE_CLIENT_SECRET=<your-client-secret>");
            return ExitCode::FAILURE;
        }
    };

    graphy::logging::init_logging(&config.logging.level);
    info!("Starting graphy v{}", env!("CARGO_PKG_VERSION"));

    // Calls are sequential; a single-threaded runtime is enough
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{}", e.user_message());
            if e.requires_reauth() {
                eprintln!("Verify the client secret and that admin consent was granted.");
            }
            ExitCode::FAILURE
        }
    }
}

/// Acquire a token and dispatch the selected command.
async fn run(cli: Cli, config: Config) -> Result<(), AppError> {
    let auth = ClientCredentialsClient::new(&config)?;
    let graph = GraphClient::new(&config)?;

    let token = auth.get_access_token().await?;

    match cli.command {
        Commands::Token => {
            let remaining = time_until_expiry(token.expires_at())
                .map(format_duration)
                .unwrap_or_else(|| "expired".to_string());
            if cli.json {
                print_json(&json!({
                    "expires_at": token.expires_at().to_rfc3339(),
                    "expires_in": remaining,
                }))?;
            } else {
                println!("Access token acquired, valid for {}", remaining);
            }
        }
        Commands::Users { keep_odata_type } => {
            let mut table = graph.get_user_table(&token).await?;
            if !keep_odata_type {
                table.drop_column("manager.@odata.type");
            }
            if cli.json {
                print_json(table.rows())?;
            } else {
                println!("{}", table);
            }
        }
        Commands::ListUsers { query } => {
            let users = graph.get_users(&token, query.as_deref()).await?;
            print_json(&users)?;
        }
        Commands::UserIds => {
            let table = graph.get_user_table(&token).await?;
            print_map(&get_ms_id_dict(&table)?, cli.json)?;
        }
        Commands::MailUpns => {
            let table = graph.get_user_table(&token).await?;
            print_map(&get_mail_upn_dict(&table)?, cli.json)?;
        }
        Commands::PatchUser { upn, properties } => {
            graph
                .patch_user(&token, &upn, &into_properties(properties))
                .await?;
            println!("Updated {}", upn);
        }
        Commands::CreateUser { upn, properties } => {
            let created = graph
                .create_user(&token, &upn, into_properties(properties))
                .await?;
            match created {
                Some(user) if cli.json => print_json(&user)?,
                Some(user) => println!(
                    "Created {} ({})",
                    upn,
                    user.get("id").and_then(|id| id.as_str()).unwrap_or("unknown id")
                ),
                None => println!("Created {}", upn),
            }
        }
        Commands::SetManager { upn, manager_id } => {
            graph.set_manager(&token, &upn, &manager_id).await?;
            println!("Manager of {} set to {}", upn, manager_id);
        }
        Commands::AssignLicense { upn, sku_id } => {
            let updated = graph.assign_license(&token, &upn, &sku_id).await?;
            match updated {
                Some(user) if cli.json => print_json(&user)?,
                _ => println!("Assigned license {} to {}", sku_id, upn),
            }
        }
        Commands::Skus => {
            let data = graph.get_subscribed_sku_ids(&token).await?;
            print_map(&build_license_dict(&data)?, cli.json)?;
        }
        Commands::LicenseReport => {
            let report = graph.get_license_report(&token).await?;
            if cli.json {
                print_json(report.rows())?;
            } else {
                println!("{}", report);
            }
        }
    }

    Ok(())
}

fn print_map(map: &BTreeMap<String, String>, as_json: bool) -> Result<(), AppError> {
    if as_json {
        print_json(map)?;
    } else {
        let width = map.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        for (key, value) in map {
            println!("{:width$}  {}", key, value, width = width);
        }
    }
    Ok(())
}
