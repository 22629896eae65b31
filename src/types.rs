use serde::{Deserialize, Serialize};

/// Where a route looks for its bearer token.
///
/// - `Header`: `Authorization: Bearer <token>` (default).
/// - `Query`: the `bearer` query parameter, falling back to `token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BearerSource {
    Header,
    Query,
}

impl Default for BearerSource {
    fn default() -> Self {
        BearerSource::Header
    }
}

/// Output format of the process log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable `tracing-subscriber` default format.
    Text,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Json
    }
}

/// Rotation policy for the optional log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Minutely,
    Hourly,
    Daily,
}

impl Default for LogRotation {
    fn default() -> Self {
        LogRotation::Never
    }
}
