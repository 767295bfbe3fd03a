//! Environment-driven configuration.
//!
//! Everything is read through a lookup function so tests can supply a map
//! instead of touching the process environment.

use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::report::{Routes, DEFAULT_REGISTER_PATH};
use crate::session::Credentials;

pub const ENV_API_URL: &str = "SYSPROF_API_URL";
pub const ENV_EMAIL: &str = "SYSPROF_EMAIL";
pub const ENV_PASSWORD: &str = "SYSPROF_PASSWORD";
pub const ENV_TARGET: &str = "SYSPROF_TARGET";
pub const ENV_TIMEOUT_SECS: &str = "SYSPROF_TIMEOUT_SECS";
pub const ENV_CPU_INTERVAL_MS: &str = "SYSPROF_CPU_INTERVAL_MS";
pub const ENV_REGISTER_PATH: &str = "SYSPROF_REGISTER_PATH";
/// Prefix for per-field path overrides, e.g. `SYSPROF_ROUTE_CPU_DATA=/v2/cpu`.
pub const ENV_ROUTE_PREFIX: &str = "SYSPROF_ROUTE_";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CPU_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub credentials: Credentials,
    /// Overrides the hostname as report target.
    pub target: Option<String>,
    pub timeout: Duration,
    pub cpu_interval: Duration,
    pub register_path: String,
    pub routes: Routes,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |k: &'static str| value(&lookup, k).ok_or(ConfigError::Missing(k));

        let api_url = parse_api_url(&require(ENV_API_URL)?)?;
        let credentials = Credentials {
            email: require(ENV_EMAIL)?,
            password: lookup(ENV_PASSWORD)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(ENV_PASSWORD))?,
        };
        let Settings {
            target,
            timeout,
            cpu_interval,
            register_path,
            routes,
        } = Settings::from_lookup(&lookup)?;

        Ok(Self {
            api_url,
            credentials,
            target,
            timeout,
            cpu_interval,
            register_path,
            routes,
        })
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> String {
        self.api_url.as_str().trim_end_matches('/').to_string()
    }
}

/// The optional part of the configuration, every value defaulted. A dry run
/// needs only this; a normal run reads it as part of [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: Option<String>,
    pub timeout: Duration,
    pub cpu_interval: Duration,
    pub register_path: String,
    pub routes: Routes,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| value(&lookup, k);

        let timeout = Duration::from_secs(parse_u64(
            ENV_TIMEOUT_SECS,
            get(ENV_TIMEOUT_SECS),
            DEFAULT_TIMEOUT_SECS,
        )?);
        if timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: ENV_TIMEOUT_SECS.into(),
                reason: "must be greater than zero".into(),
            });
        }
        let cpu_interval = Duration::from_millis(parse_u64(
            ENV_CPU_INTERVAL_MS,
            get(ENV_CPU_INTERVAL_MS),
            DEFAULT_CPU_INTERVAL_MS,
        )?);

        let register_path = get(ENV_REGISTER_PATH).unwrap_or_else(|| DEFAULT_REGISTER_PATH.into());
        let mut routes = Routes::default();
        let fields: Vec<String> = routes.fields().map(str::to_string).collect();
        for field in fields {
            if let Some(path) = get(&route_var(&field)) {
                routes.set(field, path);
            }
        }

        Ok(Self {
            target: get(ENV_TARGET),
            timeout,
            cpu_interval,
            register_path,
            routes,
        })
    }
}

// blank values count as unset
fn value<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Environment variable overriding the path of `field`.
pub fn route_var(field: &str) -> String {
    format!("{ENV_ROUTE_PREFIX}{}", field.to_ascii_uppercase())
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: ENV_API_URL.into(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

fn parse_u64(var: &str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
            var: var.into(),
            reason: format!("'{v}' is not a non-negative integer"),
        }),
    }
}
