// src/lib.rs

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod server;
pub mod sink;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::dispatch::{Dispatcher, RouteTable};
use crate::exec::{ChainExecutor, ProcessBackend};
use crate::sink::TracingSink;

/// High-level entry point used by `main.rs`.
///
/// `cfg` is already loaded and validated (logging needs it before this
/// runs). This wires together:
/// - the route table
/// - the chain executor with the real process backend
/// - the tracing-backed log sink
/// - the HTTP listener
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    let routes = RouteTable::from_config(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg, &routes);
        return Ok(());
    }

    let executor = ChainExecutor::new(Arc::new(ProcessBackend));
    let dispatcher = Arc::new(Dispatcher::new(routes, executor, Arc::new(TracingSink)));
    info!(routes = dispatcher.routes().len(), "route table loaded");

    let host = args.host.as_deref().unwrap_or(&cfg.server.host);
    let port = args.port.unwrap_or(cfg.server.port);
    let bind_addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {bind_addr}"))?;

    server::serve(
        listener,
        server::build_router(dispatcher),
        server::shutdown_signal(),
    )
    .await
}

/// Simple dry-run output: print server settings and every route.
fn print_dry_run(cfg: &ConfigFile, routes: &RouteTable) {
    println!("cmdgate dry-run");
    println!("  server = {}:{}", cfg.server.host, cfg.server.port);
    println!();

    println!("routes ({}):", routes.len());
    for route in routes.iter() {
        println!("  - {}", route.label());
        println!("      timeout_ms: {}", route.timeout.as_millis());
        if route.requires_auth() {
            println!("      bearer: {:?}", route.bearer_source);
        }
        if route.include_logs {
            println!("      include_logs: true");
        }
        for (idx, cmd) in route.commands.iter().enumerate() {
            println!(
                "      [{}] {} {:?} (cwd: {})",
                idx + 1,
                cmd.executable,
                cmd.arguments,
                cmd.working_directory.display()
            );
        }
    }

    debug!("dry-run complete (no listener)");
}
