#![allow(dead_code)]

use cmdgate::config::{
    ArgValue, CommandConfig, ConfigFile, LoggingSection, RawConfigFile, RouteConfig,
    ServerSection,
};
use cmdgate::types::BearerSource;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                server: ServerSection::default(),
                logging: LoggingSection::default(),
                route: Vec::new(),
            },
        }
    }

    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.config.route.push(route);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RouteConfig`.
pub struct RouteConfigBuilder {
    route: RouteConfig,
}

impl RouteConfigBuilder {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            route: RouteConfig {
                method: method.to_string(),
                path: path.to_string(),
                bearer_key: None,
                bearer_source: BearerSource::Header,
                timeout_ms: 5_000,
                include_logs: false,
                command: vec![],
            },
        }
    }

    /// Append a command with a flat argument list.
    pub fn command(mut self, command: &str, args: &[&str]) -> Self {
        let args = ArgValue::List(args.iter().map(|a| ArgValue::Text(a.to_string())).collect());
        self.route.command.push(CommandConfig {
            command: command.to_string(),
            args: Some(args),
            cwd: None,
        });
        self
    }

    /// Append a command with a raw `args` value.
    pub fn command_with(mut self, command: &str, args: Option<ArgValue>, cwd: Option<&str>) -> Self {
        self.route.command.push(CommandConfig {
            command: command.to_string(),
            args,
            cwd: cwd.map(str::to_string),
        });
        self
    }

    /// Append `sh -c <script>`.
    pub fn shell(self, script: &str) -> Self {
        self.command("sh", &["-c", script])
    }

    pub fn bearer_header(mut self, key: &str) -> Self {
        self.route.bearer_key = Some(key.to_string());
        self.route.bearer_source = BearerSource::Header;
        self
    }

    pub fn bearer_query(mut self, key: &str) -> Self {
        self.route.bearer_key = Some(key.to_string());
        self.route.bearer_source = BearerSource::Query;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.route.timeout_ms = ms;
        self
    }

    pub fn include_logs(mut self, val: bool) -> Self {
        self.route.include_logs = val;
        self
    }

    pub fn build(self) -> RouteConfig {
        self.route
    }
}
