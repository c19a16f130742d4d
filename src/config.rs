use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub discord_api_url: String,
    pub discord_cdn_url: String,

    // Access
    pub authorized_users: Vec<String>,

    // Output
    pub output_dir: PathBuf,
    pub package_zip: bool,

    // HTTP
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Discord
            discord_token: required_env("DISCORD_TOKEN")?,
            discord_api_url: env_or_default("DISCORD_API_URL", "https://discord.com/api/v10"),
            discord_cdn_url: env_or_default("DISCORD_CDN_URL", "https://cdn.discordapp.com"),

            // Access
            authorized_users: parse_list(&env_or_default("AUTHORIZED_USERS", "")),

            // Output
            output_dir: PathBuf::from(env_or_default("ARCHIVE_OUTPUT_DIR", "./archives")),
            package_zip: parse_env_bool("PACKAGE_ZIP", true)?,

            // HTTP
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 60)?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord_token.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "DISCORD_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        for (name, value) in [
            ("DISCORD_API_URL", &self.discord_api_url),
            ("DISCORD_CDN_URL", &self.discord_cdn_url),
        ] {
            if url::Url::parse(value).is_err() {
                return Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: format!("not a valid URL: '{value}'"),
                });
            }
        }
        Ok(())
    }

    /// Whether `user_id` may request archives.
    #[must_use]
    pub fn is_authorized(&self, user_id: &str) -> bool {
        self.authorized_users.iter().any(|id| id == user_id)
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::ParseBool {
                name: name.to_string(),
                value: val,
            }),
        },
        _ => Ok(default),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
