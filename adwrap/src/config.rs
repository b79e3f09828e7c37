//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ADWRAP_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ADWRAP_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ADWRAP_BILLING__CADENCE_MONTHS=1` sets the `billing.cadence_months` field.
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Database**: `database.path` - SQLite database file location
//! - **Auth**: `auth.user_header` - trusted header carrying the authenticated user id
//! - **Billing**: `billing.*` - platform fee, verification cadence and grace period
//! - **Payment**: `payment.*` - payment processor selection (dummy by default)
//! - **Retry**: `retry.*` - bounded backoff policy for idempotent processor calls

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ADWRAP_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Identity boundary configuration
    pub auth: AuthConfig,
    /// Billing cadence and fee configuration
    pub billing: BillingConfig,
    /// Payment processor configuration
    pub payment: PaymentConfig,
    /// Retry policy for idempotent calls to external services
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3100,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            billing: BillingConfig::default(),
            payment: PaymentConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (created on first startup)
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "adwrap.db".to_string(),
        }
    }
}

/// Identity boundary configuration.
///
/// The upstream identity provider authenticates credentials and forwards the
/// authenticated user id in a trusted header; this service performs no
/// credential checks itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Header carrying the authenticated user id (set by the identity proxy)
    pub user_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-adwrap-user".to_string(),
        }
    }
}

/// Billing cadence and fee configuration.
///
/// The verification cadence and its grace period are deliberately policy, not
/// constants: deployments differ on how much slack drivers get before a
/// cycle's driver payment is suspended.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    /// Fixed monthly platform fee charged to advertisers, in dollars
    pub platform_fee: Decimal,
    /// Verification cycle length in calendar months
    pub cadence_months: u32,
    /// Grace period after a cycle closes before it counts as overdue
    #[serde(with = "humantime_serde")]
    pub grace: Duration,
    /// Optional interval for the background ledger run; disabled when unset
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub auto_run_interval: Option<Duration>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            platform_fee: Decimal::new(1000, 2), // $10.00
            cadence_months: 1,
            grace: Duration::from_secs(3 * 24 * 60 * 60),
            auto_run_interval: None,
        }
    }
}

/// Payment processor configuration.
///
/// Adding a new processor means adding a variant here and a match arm in
/// [`crate::payment_processors::create_processor`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum PaymentConfig {
    /// Settles every intent instantly; for development and tests
    Dummy(DummyProcessorConfig),
}

impl Default for PaymentConfig {
    fn default() -> Self {
        PaymentConfig::Dummy(DummyProcessorConfig::default())
    }
}

/// Dummy processor settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DummyProcessorConfig {
    /// When true, every settlement comes back failed (for exercising retries)
    pub always_fail: bool,
}

/// Bounded retry policy for idempotent external calls.
///
/// Non-idempotent operations (creating a payment intent) are never auto-retried
/// to avoid double-charging; this policy only applies to settlement-status
/// re-checks and similar idempotent reads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum number of attempts before giving up
    pub max_attempts: u32,
    /// Backoff before the first retry
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,
    /// Upper bound on the backoff between attempts
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Load configuration from the YAML file named in `args`, with `ADWRAP_`
    /// environment variables taking precedence.
    pub fn load(args: &Args) -> crate::errors::Result<Self> {
        let config: Config = Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("ADWRAP_").split("__"))
            .extract()
            .map_err(|e| Error::Validation {
                message: format!("Invalid configuration: {e}"),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would misbehave at runtime.
    pub fn validate(&self) -> crate::errors::Result<()> {
        if self.billing.cadence_months == 0 {
            return Err(Error::Validation {
                message: "billing.cadence_months must be at least 1".to_string(),
            });
        }
        if self.billing.platform_fee < Decimal::ZERO {
            return Err(Error::Validation {
                message: "billing.platform_fee must not be negative".to_string(),
            });
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Validation {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
