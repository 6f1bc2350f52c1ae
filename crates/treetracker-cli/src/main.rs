//! TreeTracker CLI: sign in and capture geotagged tree photos.
//!
//! Reads KEYCLOAK_BASE_URL, KEYCLOAK_REALM, KEYCLOAK_CLIENT_ID and
//! REGISTRATION_API_URL for the identity commands. Tokens are kept in
//! TREETRACKER_TOKEN_FILE (default `~/.treetracker/tokens.json`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use treetracker_capture::GateMessage;
use treetracker_cli::{capture_file, open_gate, LocationOutcome, TokenPaths};
use treetracker_core::{CaptureConfig, RegistrationForm};
use treetracker_identity::IdentityClient;
use treetracker_infra::{init_telemetry, shutdown_telemetry, LoggingUploadSink};

#[derive(Parser)]
#[command(name = "treetracker", about = "TreeTracker capture CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with username and password
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Keep the session across restarts
        #[arg(long)]
        remember: bool,
    },
    /// Create an account, then sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// Keep the session across restarts
        #[arg(long)]
        remember: bool,
    },
    /// Capture a tree photo with its location and print the upload payload.
    /// Without any location flag the device is treated as having no GPS.
    Capture {
        /// Path to the image
        file: PathBuf,
        /// Latitude of the fix
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude of the fix
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Simulate a denied location permission
        #[arg(long, conflicts_with_all = ["lat", "unavailable", "timeout"])]
        deny: bool,
        /// Simulate a sensor that cannot produce a fix
        #[arg(long, conflicts_with_all = ["lat", "timeout"])]
        unavailable: bool,
        /// Simulate a location request that times out
        #[arg(long, conflicts_with = "lat")]
        timeout: bool,
    },
    /// Sign out and forget stored tokens
    Logout,
    /// Show whether a valid session exists
    Status,
}

#[derive(Serialize)]
struct StatusOutput {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in: Option<i64>,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = CaptureConfig::from_env().context("Invalid configuration")?;
    init_telemetry(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
    let paths = TokenPaths::from_env();

    let result = run(cli.command, &config, &paths).await;
    shutdown_telemetry().await;
    result
}

async fn run(command: Commands, config: &CaptureConfig, paths: &TokenPaths) -> anyhow::Result<()> {
    match command {
        Commands::Login {
            username,
            password,
            remember,
        } => {
            let client = IdentityClient::from_config(&config.identity)?;
            let mut gate = open_gate(
                config,
                paths,
                LocationOutcome::Unsupported,
                Arc::new(LoggingUploadSink),
            )
            .await;
            gate.login(&client, &username, &password, remember).await?;
            println!("Signed in as {}", username);
        }
        Commands::Register {
            email,
            first_name,
            last_name,
            password,
            confirm_password,
            remember,
        } => {
            let client = IdentityClient::from_config(&config.identity)?;
            let form = RegistrationForm {
                email,
                password,
                confirm_password,
                first_name,
                last_name,
            };
            client.register_user(&form).await?;

            let mut gate = open_gate(
                config,
                paths,
                LocationOutcome::Unsupported,
                Arc::new(LoggingUploadSink),
            )
            .await;
            gate.login(&client, &form.email, &form.password, remember)
                .await?;
            println!("Registered and signed in as {}", form.email);
        }
        Commands::Capture {
            file,
            lat,
            lng,
            deny,
            unavailable,
            timeout,
        } => {
            let outcome = LocationOutcome::from_flags(lat, lng, deny, unavailable, timeout)?;
            let record = capture_file(config, paths, &file, outcome).await?;
            print_json(&record)?;
        }
        Commands::Logout => {
            let mut gate = open_gate(
                config,
                paths,
                LocationOutcome::Unsupported,
                Arc::new(LoggingUploadSink),
            )
            .await;
            gate.handle(GateMessage::Logout)?;
            println!("Signed out");
        }
        Commands::Status => {
            let gate = open_gate(
                config,
                paths,
                LocationOutcome::Unsupported,
                Arc::new(LoggingUploadSink),
            )
            .await;
            print_json(&StatusOutput {
                authenticated: gate.is_authenticated(),
                expires_in: gate.context().tokens().map(|t| t.expires_in),
            })?;
        }
    }

    Ok(())
}
