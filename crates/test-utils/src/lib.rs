pub mod builders;
pub mod recording_sink;
pub mod scripted_backend;

use std::sync::{Arc, Once};

use tracing_subscriber::{fmt, EnvFilter};

use cmdgate::config::ConfigFile;
use cmdgate::dispatch::{Dispatcher, RouteTable};
use cmdgate::exec::{ChainExecutor, CommandBackend};

pub use recording_sink::RecordingSink;
pub use scripted_backend::{ScriptedBackend, Step};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Dispatcher over `cfg` with the given backend, logging into a fresh
/// [`RecordingSink`].
pub fn dispatcher_with(
    cfg: &ConfigFile,
    backend: Arc<dyn CommandBackend>,
) -> (Arc<Dispatcher>, RecordingSink) {
    let routes = RouteTable::from_config(cfg).expect("route table from valid config");
    let sink = RecordingSink::new();
    let dispatcher = Dispatcher::new(routes, ChainExecutor::new(backend), Arc::new(sink.clone()));
    (Arc::new(dispatcher), sink)
}
