// Shutdown coordination module
// Provides a global flag so long-running loops stop taking new work on Ctrl+C

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tokio::sync::watch;

/// Global shutdown flag - set to true when the app is shutting down
static APP_SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Wakes async waiters when the flag flips
static SHUTDOWN_TX: OnceLock<watch::Sender<bool>> = OnceLock::new();

fn shutdown_tx() -> &'static watch::Sender<bool> {
    SHUTDOWN_TX.get_or_init(|| watch::channel(false).0)
}

/// Signal that the app is shutting down
pub fn signal_shutdown() {
    if !APP_SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        crate::info!("App shutdown signaled");
    }
    shutdown_tx().send_replace(true);
}

/// Check if the app is shutting down
/// Returns true after signal_shutdown() has been called
pub fn is_shutting_down() -> bool {
    APP_SHUTTING_DOWN.load(Ordering::SeqCst)
}

/// Resolve once signal_shutdown() has been called
pub async fn shutdown_requested() {
    let mut rx = shutdown_tx().subscribe();
    let _ = rx.wait_for(|shutting_down| *shutting_down).await;
}

/// Install a Ctrl+C handler that signals shutdown
///
/// A second Ctrl+C while already shutting down exits immediately.
pub fn install_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        if is_shutting_down() {
            crate::warn!("Second interrupt received, exiting now");
            std::process::exit(130);
        }
        signal_shutdown();
    })
}

#[cfg(test)]
fn reset_for_test() {
    APP_SHUTTING_DOWN.store(false, Ordering::SeqCst);
    shutdown_tx().send_replace(false);
}

#[cfg(test)]
#[path = "shutdown_test.rs"]
mod tests;
