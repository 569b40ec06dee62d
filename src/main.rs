//! fsgate - Signed-URL upload and download gateway.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fsgate::{
    auth::UrlSigner,
    config::{CheckConfig, Cli, Command, ServeConfig, SignConfig, SignOutputFormat},
    server::{create_router, RouterConfig},
    storage::FileStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(config) => run_serve(config).await,
        Command::Sign(config) => run_sign(config),
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("fsgate v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Storage root: {}", config.root.display());
    if config.secret_is_weak() {
        warn!("  Secret: shorter than 64 characters - vulnerable to brute force");
    } else {
        info!("  Secret: configured");
    }

    let store = FileStore::new(&config.root);
    if let Err(e) = store.prepare().await {
        error!("Failed to prepare staging directory: {}", e);
        return ExitCode::FAILURE;
    }
    match store.sweep_staging().await {
        Ok(0) => {}
        Ok(removed) => info!("  Removed {} stale staged upload(s)", removed),
        Err(e) => warn!("  Could not clean staging directory: {}", e),
    }

    let router_config =
        RouterConfig::new(&config.root, config.secret.clone()).with_tracing(!config.no_tracing);
    let router = create_router(router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "fsgate=debug,tower_http=debug"
    } else {
        "fsgate=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Sign Command
// =============================================================================

#[derive(Serialize)]
struct SignOutput<'a> {
    method: &'a str,
    path: &'a str,
    signature: &'a str,
    expires: u64,
    ttl: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

fn run_sign(config: SignConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let signer = UrlSigner::new(config.secret.as_str());
    let (signature, expires) =
        signer.sign_with_ttl(config.method, &config.path, Duration::from_secs(config.ttl));

    let url = config
        .base_url
        .as_deref()
        .map(|base| signer.signed_url_at(base, config.method, &config.path, expires));

    match config.format {
        SignOutputFormat::Signature => println!("{}", signature),
        SignOutputFormat::Json => {
            let output = SignOutput {
                method: config.method.as_str(),
                path: &config.path,
                signature: &signature,
                expires,
                ttl: config.ttl,
                url,
            };
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        SignOutputFormat::Url => match url {
            Some(url) => println!("{}", url),
            None => {
                println!(
                    "{}",
                    signer.signed_url_at("", config.method, &config.path, expires)
                );
                eprintln!();
                eprintln!("Tip: Use --base-url to generate a complete URL");
            }
        },
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("fsgate Storage Check");
    println!("════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ Root: {}", e);
        return ExitCode::FAILURE;
    }
    println!("✓ Root: {}", config.root.display());

    let store = FileStore::new(&config.root);
    print!("Probing staged write... ");
    match store.check_writable().await {
        Ok(()) => println!("✓ success"),
        Err(e) => {
            println!("✗ failed");
            println!();
            println!("Error: {}", e);
            println!();
            println!("Please check:");
            println!("  - The process can create '{}'", store.staging_dir().display());
            println!("  - The filesystem is not mounted read-only");
            return ExitCode::FAILURE;
        }
    }

    println!();
    println!("════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
