//! Conditional logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! Each calling module defines two consts before using the macros:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TARGET: &str = "pagepulse::ingest";
//!
//! use crate::{log_error, log_info, log_warn};
//!
//! log_info!("delivered {} to {}", kind, endpoint);
//! ```
//!
//! The target lets `RUST_LOG=pagepulse::ingest=debug` style filters select a
//! single subsystem even though the telemetry side-channel logs from
//! detached tasks.

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TARGET, $($arg)*);
        }
    };
}

/// Used for absorbed failures (storage, transport) that must never reach the
/// caller but should still show up in the log.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: LOG_TARGET, $($arg)*);
        }
    };
}
