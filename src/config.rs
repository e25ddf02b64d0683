use std::env;

use chrono::format::{Item, StrftimeItems};

use crate::services::timestamp::DEFAULT_DATETIME_FORMATS;

/// Format used when rendering timestamps in views.
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Timestamps
    pub datetime_formats: Vec<String>,
    pub datetime_format: String,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set,
    /// or `ConfigError::Invalid` if a timestamp format cannot be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let datetime_formats = input_formats(env::var("DATETIME_FORMATS").ok().as_deref())?;

        let datetime_format =
            env::var("DATETIME_FORMAT").unwrap_or_else(|_| DEFAULT_DATETIME_FORMAT.to_string());
        validate_format("DATETIME_FORMAT", &datetime_format)?;

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,

            // Timestamps
            datetime_formats,
            datetime_format,

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }
}

/// Split a `;`-separated list of strftime formats, keeping declared order.
#[must_use]
pub fn parse_formats(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Input formats from a raw `DATETIME_FORMATS` value, or the defaults when unset.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` if the list is empty or any entry is not a
/// valid strftime format.
pub fn input_formats(raw: Option<&str>) -> Result<Vec<String>, ConfigError> {
    let formats = match raw {
        Some(raw) => parse_formats(raw),
        None => DEFAULT_DATETIME_FORMATS.iter().map(ToString::to_string).collect(),
    };
    if formats.is_empty() {
        return Err(ConfigError::Invalid {
            name: "DATETIME_FORMATS",
            reason: "no formats given".to_string(),
        });
    }
    for format in &formats {
        validate_format("DATETIME_FORMATS", format)?;
    }
    Ok(formats)
}

/// Reject strftime strings chrono cannot render.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` naming the offending variable.
pub fn validate_format(name: &'static str, format: &str) -> Result<(), ConfigError> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("{format:?} is not a valid strftime format"),
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
