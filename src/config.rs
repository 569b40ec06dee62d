//! Configuration management for fsgate.
//!
//! This module provides the CLI with subcommands:
//! - `serve` - Start the gateway
//! - `sign` - Generate a signed URL for a path
//! - `check` - Validate a storage root without starting the server
//!
//! # Environment Variables
//!
//! Options of the `serve` command can also be set via environment variables:
//!
//! - `FSGATE_HOST` - Server bind address (default: 0.0.0.0)
//! - `FSGATE_PORT` - Server port (required)
//! - `FSGATE_ROOT` - Absolute path of the storage root (required)
//! - `FSGATE_SECRET` - Shared secret for signed URLs (required)
//!
//! # Example
//!
//! ```bash
//! # Start the gateway
//! fsgate serve --root /srv/files --port 3000 --secret "$(openssl rand -hex 32)"
//!
//! # Issue an upload URL valid for 5 minutes
//! fsgate sign --secret "$FSGATE_SECRET" --method put --path /reports/jan.txt \
//!     --ttl 300 --base-url http://localhost:3000 --format url
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::auth::{is_safe, SignedMethod, MAX_SIGNATURE_TTL};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default TTL for generated signatures in seconds.
pub const DEFAULT_SIGN_TTL: u64 = 60;

/// Secrets shorter than this are accepted but logged as weak.
pub const RECOMMENDED_SECRET_LEN: usize = 64;

// =============================================================================
// CLI Structure
// =============================================================================

/// fsgate - Signed-URL upload and download gateway for a single directory.
#[derive(Parser, Debug)]
#[command(name = "fsgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the gateway
    Serve(ServeConfig),

    /// Generate a signed URL for a method and path
    Sign(SignConfig),

    /// Validate a storage root and check it is writable
    Check(CheckConfig),
}

// =============================================================================
// Serve Command
// =============================================================================

/// Configuration for the serve command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "FSGATE_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, env = "FSGATE_PORT")]
    pub port: u16,

    /// Absolute path of the directory files are stored under.
    #[arg(long, env = "FSGATE_ROOT")]
    pub root: PathBuf,

    /// Shared secret used to verify signed URLs.
    ///
    /// At least 64 characters are recommended.
    #[arg(long, env = "FSGATE_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_root(&self.root)?;

        if self.secret.is_empty() {
            return Err("Secret is required. Set --secret or FSGATE_SECRET".to_string());
        }

        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Whether the secret is shorter than the recommended length.
    pub fn secret_is_weak(&self) -> bool {
        self.secret.chars().count() < RECOMMENDED_SECRET_LEN
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// Sign Command
// =============================================================================

/// Output format for the sign command.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignOutputFormat {
    /// Output the complete URL (default)
    #[default]
    Url,
    /// Output only the signature
    Signature,
    /// Output as JSON with signature, expiry and URL
    Json,
}

/// Configuration for the sign command.
#[derive(Args, Debug, Clone)]
pub struct SignConfig {
    /// Shared secret (must match the server's secret).
    #[arg(short, long, env = "FSGATE_SECRET", hide_env_values = true)]
    pub secret: String,

    /// HTTP method to authorize (get or put).
    #[arg(short, long)]
    pub method: SignedMethod,

    /// Path to sign (e.g. "/reports/2024/jan.txt").
    #[arg(short, long)]
    pub path: String,

    /// Time-to-live in seconds (at most 86400).
    #[arg(short, long, default_value_t = DEFAULT_SIGN_TTL)]
    pub ttl: u64,

    /// Base URL to prepend (e.g. "http://localhost:3000").
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = SignOutputFormat::Url)]
    pub format: SignOutputFormat,
}

impl SignConfig {
    /// Validate the sign configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.is_empty() {
            return Err("Secret is required. Set --secret or FSGATE_SECRET".to_string());
        }

        if !is_safe(&self.path) {
            return Err(format!(
                "Path '{}' would be rejected by the server (use /-separated [A-Za-z0-9._-] segments)",
                self.path
            ));
        }

        let max_ttl = MAX_SIGNATURE_TTL.as_secs();
        if self.ttl == 0 || self.ttl > max_ttl {
            return Err(format!("ttl must be between 1 and {} seconds", max_ttl));
        }

        Ok(())
    }
}

// =============================================================================
// Check Command
// =============================================================================

/// Configuration for the check command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Absolute path of the storage root to check.
    #[arg(long, env = "FSGATE_ROOT")]
    pub root: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_root(&self.root)
    }
}

fn validate_root(root: &std::path::Path) -> Result<(), String> {
    if !root.is_absolute() {
        return Err(format!(
            "Storage root '{}' must be an absolute path",
            root.display()
        ));
    }
    if !root.is_dir() {
        return Err(format!(
            "Storage root '{}' does not exist or is not a directory",
            root.display()
        ));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
