//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the regpulse tracing/logging system.
///
/// Reads `REGPULSE_LOG` for per-component log levels, e.g.
/// `REGPULSE_LOG=regpulse_analysis::clustering=debug,regpulse_core=warn`.
///
/// Falls back to `regpulse=info` if `REGPULSE_LOG` is unset or invalid.
/// Safe to call more than once.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("REGPULSE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("regpulse=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
