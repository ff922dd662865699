//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The configuration file path defaults to `config.yaml` but can
//! be specified via the `-f` flag or the `ALMACEN_CONFIG` environment
//! variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources
//! override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ALMACEN_`
//!
//! For nested config values, use double underscores in environment
//! variables. For example, `ALMACEN_AUTH__PASSWORD__MIN_LENGTH=12` sets the
//! `auth.password.min_length` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! ALMACEN_PORT=9090
//!
//! # Point the record store somewhere else
//! ALMACEN_STORE__PATH=/var/lib/almacen/almacen.db
//!
//! # Required for issuing session tokens
//! ALMACEN_SECRET_KEY="change-me"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ALMACEN_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment
/// variables. All fields have sensible defaults defined in the `Default`
/// implementation, except `secret_key`, which must be provided.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Record store configuration
    pub store: StoreConfig,
    /// Secret key for JWT signing (required)
    pub secret_key: Option<String>,
    /// Username for the initial admin user (created on first startup)
    pub admin_username: String,
    /// Password for the initial admin user. When set, the admin password is
    /// reset to this value on every startup. When unset, a freshly created
    /// admin gets an unguessable placeholder and must be reset explicitly.
    pub admin_password: Option<String>,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            store: StoreConfig::default(),
            secret_key: None,
            admin_username: "admin".to_string(),
            admin_password: None,
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the backing database file. Parent directories are created on
    /// first start.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/almacen.db"),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub session: SessionConfig,
    pub password: PasswordConfig,
}

/// Session cookie and token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Name of the session cookie
    pub cookie_name: String,
    /// Session token lifetime (e.g. "2h", "30m")
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    /// Mark session cookies `Secure`. Enable when serving over HTTPS.
    pub secure_cookies: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_token".to_string(),
            jwt_expiry: Duration::from_secs(2 * 60 * 60),
            secure_cookies: false,
        }
    }
}

/// Password policy for registration and resets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

/// CORS configuration. An empty origin list leaves CORS off entirely.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; "*" allows any origin
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from the YAML file and environment overrides.
    pub fn load(args: &Args) -> anyhow::Result<Self> {
        // ALMACEN_CONFIG belongs to Args, not Config
        let figment = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("ALMACEN_").ignore(&["config"]).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate settings that have no usable default.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.secret_key.as_deref() {
            None | Some("") => anyhow::bail!("secret_key is required (set it in config.yaml or via ALMACEN_SECRET_KEY)"),
            Some(_) => {}
        }
        if self.auth.password.min_length > self.auth.password.max_length {
            anyhow::bail!("auth.password.min_length must not exceed max_length");
        }
        Ok(())
    }

    /// Socket address string to bind the server to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
