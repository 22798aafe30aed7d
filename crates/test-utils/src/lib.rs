pub mod builders;
pub mod fakes;

use std::sync::Arc;
use std::sync::Once;

use hotreload::engine::Collaborators;
use hotreload::fs::FileSystem;
use hotreload::logging::LogSink;
use tracing_subscriber::{fmt, EnvFilter};

pub use fakes::{FakeReloader, FakeWatcher, StaticLocator};

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
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Collaborators wired to fakes. Clones of the fakes stay with the caller
/// for inspection.
pub fn fake_collaborators(
    fs: Arc<dyn FileSystem>,
    locator: &StaticLocator,
    watcher: &FakeWatcher,
    reloader: &FakeReloader,
) -> Collaborators {
    Collaborators {
        fs,
        locator: Box::new(locator.clone()),
        watcher: Box::new(watcher.clone()),
        reloader: Box::new(reloader.clone()),
        log: LogSink::default(),
    }
}
