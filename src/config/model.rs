// src/config/model.rs

use serde::Deserialize;

use crate::types::{BearerSource, LogFormat, LogRotation};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [server]
/// host = "127.0.0.1"
/// port = 8080
///
/// [logging]
/// level = "info"
/// file = "logs/cmdgate.log"
/// rotation = "daily"
///
/// [[route]]
/// method = "POST"
/// path = "/deploy"
/// bearer_key = "secret"
///
/// [[route.command]]
/// command = "git"
/// args = ["pull", "--ff-only"]
/// cwd = "/srv/app"
/// ```
///
/// `[server]` and `[logging]` are optional and have reasonable defaults.
/// This is the unvalidated form; see [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub logging: LoggingSection,

    /// All routes from `[[route]]`, in file order.
    #[serde(default)]
    pub route: Vec<RouteConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`, so holders
/// can rely on the route invariants (non-empty chains, positive timeouts,
/// unique `(method, path)` pairs).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub logging: LoggingSection,
    pub route: Vec<RouteConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        server: ServerSection,
        logging: LoggingSection,
        route: Vec<RouteConfig>,
    ) -> Self {
        Self {
            server,
            logging,
            route,
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// Port 0 binds an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingSection {
    /// `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub format: LogFormat,

    /// Log file path. Logs go to stderr when unset.
    #[serde(default)]
    pub file: Option<String>,

    /// Only meaningful together with `file`.
    #[serde(default)]
    pub rotation: LogRotation,
}

/// `[[route]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Matched case-sensitively against the request method.
    pub method: String,

    /// Matched exactly against the request path.
    pub path: String,

    /// Shared secret. Absent or empty means the route is open.
    #[serde(default)]
    pub bearer_key: Option<String>,

    #[serde(default)]
    pub bearer_source: BearerSource,

    /// Deadline for the whole chain, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Attach `commandLogs` to the response body.
    #[serde(default)]
    pub include_logs: bool,

    /// The command chain, from `[[route.command]]`.
    #[serde(default)]
    pub command: Vec<CommandConfig>,
}

fn default_timeout_ms() -> u64 {
    60_000
}

/// `[[route.command]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// Executable name or path. Never run through a shell.
    pub command: String,

    #[serde(default)]
    pub args: Option<ArgValue>,

    /// Working directory; the gateway's own working directory when unset.
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Loosely-typed `args` value.
///
/// Accepts `args = "x"`, `args = 3`, `args = ["a", 1, ["b", true]]`, ...
/// See [`crate::config::normalize_args`] for how it becomes an argv.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<ArgValue>),
}
