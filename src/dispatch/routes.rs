// src/dispatch/routes.rs

//! The immutable route table.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ConfigFile, RouteConfig};
use crate::errors::{CmdgateError, Result};
use crate::exec::CommandSpec;
use crate::types::BearerSource;

/// One `(method, path)` → command chain mapping.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: String,
    pub path: String,
    /// `None` means the route is open. Never `Some("")`.
    pub bearer_key: Option<String>,
    pub bearer_source: BearerSource,
    /// Never empty.
    pub commands: Arc<[CommandSpec]>,
    pub timeout: Duration,
    pub include_logs: bool,
}

impl Route {
    pub fn from_config(cfg: &RouteConfig, default_cwd: &std::path::Path) -> Self {
        let commands: Vec<CommandSpec> = cfg
            .command
            .iter()
            .map(|c| CommandSpec::from_config(c, default_cwd))
            .collect();

        Self {
            method: cfg.method.clone(),
            path: cfg.path.clone(),
            bearer_key: cfg.bearer_key.clone().filter(|k| !k.is_empty()),
            bearer_source: cfg.bearer_source,
            commands: commands.into(),
            timeout: Duration::from_millis(cfg.timeout_ms),
            include_logs: cfg.include_logs,
        }
    }

    /// `"METHOD /path"`, used in logs.
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn requires_auth(&self) -> bool {
        self.bearer_key.is_some()
    }
}

/// Ordered set of routes with unique `(method, path)` pairs.
///
/// Built once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Arc<Route>>,
    index: HashMap<(String, String), usize>,
}

impl RouteTable {
    /// Build a table, rejecting duplicate `(method, path)` pairs.
    pub fn new(routes: Vec<Route>) -> Result<Self> {
        let mut index = HashMap::with_capacity(routes.len());
        for (pos, route) in routes.iter().enumerate() {
            let key = (route.method.clone(), route.path.clone());
            if index.insert(key, pos).is_some() {
                return Err(CmdgateError::DuplicateRoute {
                    method: route.method.clone(),
                    path: route.path.clone(),
                });
            }
        }

        Ok(Self {
            routes: routes.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    /// Build the table from a validated config.
    ///
    /// Commands without a `cwd` run in the gateway's current directory.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let default_cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let routes = cfg
            .route
            .iter()
            .map(|r| Route::from_config(r, &default_cwd))
            .collect();
        Self::new(routes)
    }

    /// Exact, case-sensitive match on method and path.
    pub fn find(&self, method: &str, path: &str) -> Option<&Arc<Route>> {
        let pos = *self.index.get(&(method.to_string(), path.to_string()))?;
        self.routes.get(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Route>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
