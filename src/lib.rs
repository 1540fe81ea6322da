// Voice-triggered emergency alerts: listen for a spoken trigger phrase, attach
// the device location and text it to emergency contacts.

// Enable coverage attribute on nightly for explicit exclusions
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod alert;
mod app;
pub mod auth;
pub mod cancel;
pub mod config;
pub mod contacts;
pub mod dispatch;
pub mod events;
pub mod listener;
pub mod location;
pub mod pipeline;
pub mod session;
pub mod shutdown;
pub mod trigger;
pub mod util;

use std::process::ExitCode;
use std::time::Duration;

// Re-export log macros for use throughout the crate
pub use log::{debug, error, info, trace, warn};

pub use app::{AppError, Command};
pub use session::{SafetySession, SessionError, SessionServices};

/// How long to wait for blocking tasks (stdin reader) when exiting
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Install the process logger
///
/// `RUST_LOG` overrides the default level (debug in debug builds, info otherwise).
pub fn init_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

/// Application entry point - runs the console until stdin closes or Ctrl+C.
/// Note: This function cannot be unit tested as it reads process stdin.
#[cfg_attr(coverage_nightly, coverage(off))]
pub fn run() -> ExitCode {
    init_logging();
    info!("Starting comalert...");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(app::run_console());
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);

    match result {
        Ok(()) => {
            info!("comalert stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
