//! Clip offset parsing.
//!
//! Clip offsets and durations may be given as plain seconds (`5`, `2.5`)
//! or as clock strings (`MM:SS`, `HH:MM:SS`, optionally with `.mmm`).

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Offset parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),

    #[error("Invalid timestamp format '{0}'. Use SS, MM:SS or HH:MM:SS with optional .mmm")]
    InvalidFormat(String),
}

/// Parse an offset string to total seconds.
///
/// ```
/// use vedit_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("00:00:05").unwrap(), 5.0);
/// assert_eq!(parse_timestamp("01:30").unwrap(), 90.0);
/// assert_eq!(parse_timestamp("2.5").unwrap(), 2.5);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    const NAMES: [&str; 3] = ["hours", "minutes", "seconds"];
    let offset = 3 - parts.len();

    let mut total = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let name = NAMES[offset + i];
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(name, part.to_string()))?;
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        total = total * 60.0 + value;
    }

    Ok(total)
}

/// Serde helper accepting either a number of seconds or a clock string.
pub fn deserialize_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(f64),
        Clock(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(secs) if secs < 0.0 => Err(serde::de::Error::custom(TimestampError::Negative)),
        Raw::Seconds(secs) => Ok(secs),
        Raw::Clock(s) => parse_timestamp(&s).map_err(serde::de::Error::custom),
    }
}
