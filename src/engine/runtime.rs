// src/engine/runtime.rs

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::watch::debounce::Debouncer;
use crate::watch::watcher::ChangeReceiver;

use super::WatchSetManager;

/// Drive `manager` from watcher notifications until `shutdown` resolves or
/// the notification channel closes.
///
/// Notifications are debounced per path with a trailing window; only the
/// last notification of a burst reaches `on_path_changed`. After the channel
/// closes, paths still inside their window are handled once it elapses.
///
/// Time is read from tokio's clock so the loop can be driven with a paused
/// runtime in tests.
pub async fn run_event_loop<F>(
    manager: &mut WatchSetManager,
    mut changes: ChangeReceiver,
    window: Duration,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    info!(window_ms = window.as_millis() as u64, "hotreload event loop started");

    let mut debouncer = Debouncer::new(window);
    let mut open = true;
    tokio::pin!(shutdown);

    loop {
        if !open && !debouncer.has_pending() {
            info!("change channel closed; exiting");
            break;
        }

        let deadline = debouncer
            .next_deadline()
            .map(Instant::from_std)
            .unwrap_or_else(|| Instant::now() + window);

        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested; exiting");
                break;
            }
            msg = changes.recv(), if open => match msg {
                Some(path) => {
                    debug!(?path, "change notification");
                    debouncer.record_at(path, Instant::now().into_std());
                }
                None => open = false,
            },
            _ = sleep_until(deadline), if debouncer.has_pending() => {
                for path in debouncer.take_ready_at(Instant::now().into_std()) {
                    let outcome = manager.on_path_changed(&path);
                    debug!(?path, ?outcome, "change handled");
                }
            }
        }
    }
}
