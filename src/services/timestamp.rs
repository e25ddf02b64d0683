//! Resolution of reading timestamps from text.
//!
//! Formats are tried in declared order and the first that parses wins, so an
//! ambiguous string always resolves the same way. Nothing here ever falls back
//! to the current time: a reading's timestamp is data, not a default.

use chrono::format::{self, Parsed, StrftimeItems};
use chrono::{DateTime, NaiveDateTime, TimeZone};

use crate::error::{AppError, AppResult};

/// Accepted input formats when none are configured, in match order.
pub const DEFAULT_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d",
];

/// A timestamp as supplied by a caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimestampInput {
    /// Already a point in time; passed through unchanged.
    At(NaiveDateTime),
    Text(String),
}

impl From<NaiveDateTime> for TimestampInput {
    fn from(at: NaiveDateTime) -> Self {
        Self::At(at)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimestampInput {
    fn from(at: DateTime<Tz>) -> Self {
        Self::At(at.naive_utc())
    }
}

impl From<&str> for TimestampInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Capability of turning caller input into a stored timestamp.
pub trait ResolveTimestamp {
    /// # Errors
    ///
    /// `MissingField("timestamp")` for absent or blank input,
    /// `TimestampResolution` when the text matches no accepted format.
    fn resolve(&self, input: Option<TimestampInput>) -> AppResult<NaiveDateTime>;
}

#[derive(Clone, Debug)]
pub struct TimestampResolver {
    formats: Vec<String>,
}

impl TimestampResolver {
    #[must_use]
    pub fn new<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            formats: formats.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    /// Parse `text` against the configured formats, first match wins.
    ///
    /// # Errors
    ///
    /// Returns `AppError::TimestampResolution` when no format matches.
    pub fn parse(&self, text: &str) -> AppResult<NaiveDateTime> {
        self.formats
            .iter()
            .find_map(|format| parse_with(text, format))
            .ok_or_else(|| AppError::TimestampResolution {
                input: text.to_string(),
            })
    }
}

impl Default for TimestampResolver {
    fn default() -> Self {
        Self::new(DEFAULT_DATETIME_FORMATS)
    }
}

impl ResolveTimestamp for TimestampResolver {
    fn resolve(&self, input: Option<TimestampInput>) -> AppResult<NaiveDateTime> {
        match input {
            Some(TimestampInput::At(at)) => Ok(at),
            Some(TimestampInput::Text(text)) => {
                let text = text.trim();
                if text.is_empty() {
                    return Err(AppError::MissingField("timestamp"));
                }
                let resolved = self.parse(text)?;
                tracing::trace!(input = text, %resolved, "Resolved timestamp");
                Ok(resolved)
            }
            None => Err(AppError::MissingField("timestamp")),
        }
    }
}

/// Parse with strptime defaults: a format without a time of day resolves to
/// midnight, an hour without minutes or seconds fills them with zero. Text
/// carrying an offset is stored as UTC, like structured zone-aware input.
fn parse_with(text: &str, format: &str) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, text, StrftimeItems::new(format)).ok()?;

    if parsed.timestamp().is_none() {
        if parsed.hour_mod_12().is_none() {
            parsed.set_hour(0).ok()?;
        }
        if parsed.minute().is_none() {
            parsed.set_minute(0).ok()?;
        }
    }

    match parsed.offset() {
        Some(_) => parsed.to_datetime().ok().map(|at| at.naive_utc()),
        None => parsed.to_naive_datetime_with_offset(0).ok(),
    }
}
