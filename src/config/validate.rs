// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile, RouteConfig};
use crate::errors::{CmdgateError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CmdgateError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.server, raw.logging, raw.route))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_routes(cfg)?;
    for route in cfg.route.iter() {
        validate_route(route)?;
    }
    validate_unique_routes(cfg)?;
    Ok(())
}

fn ensure_has_routes(cfg: &RawConfigFile) -> Result<()> {
    if cfg.route.is_empty() {
        return Err(CmdgateError::ConfigError(
            "config must contain at least one [[route]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_route(route: &RouteConfig) -> Result<()> {
    if route.method.trim().is_empty() {
        return Err(CmdgateError::ConfigError(format!(
            "route '{}' has an empty method",
            route.path
        )));
    }

    if !route.path.starts_with('/') {
        return Err(CmdgateError::ConfigError(format!(
            "route {} '{}': path must start with '/'",
            route.method, route.path
        )));
    }

    if route.timeout_ms == 0 {
        return Err(CmdgateError::ConfigError(format!(
            "route {} {}: timeout_ms must be >= 1 (got 0)",
            route.method, route.path
        )));
    }

    if route.command.is_empty() {
        return Err(CmdgateError::ConfigError(format!(
            "route {} {} must define at least one [[route.command]]",
            route.method, route.path
        )));
    }

    for (idx, cmd) in route.command.iter().enumerate() {
        if cmd.command.trim().is_empty() {
            return Err(CmdgateError::ConfigError(format!(
                "route {} {}: command #{} has an empty `command`",
                route.method,
                route.path,
                idx + 1
            )));
        }
    }

    Ok(())
}

fn validate_unique_routes(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for route in cfg.route.iter() {
        if !seen.insert((route.method.as_str(), route.path.as_str())) {
            return Err(CmdgateError::DuplicateRoute {
                method: route.method.clone(),
                path: route.path.clone(),
            });
        }
    }
    Ok(())
}
