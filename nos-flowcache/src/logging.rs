//! Logging support for nos-flowcache
//!
//! Thin wrappers over the `log` facade that compile away when the `log`
//! feature is disabled, so call sites need no `#[cfg]` of their own. The
//! arguments are still type-checked without the feature, which keeps
//! values that only feed a log line from being reported as unused.

/// Trace-level logging, used on the forwarding fast path
macro_rules! flow_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        log::trace!($($arg)*);
        #[cfg(not(feature = "log"))]
        let _ = core::format_args!($($arg)*);
    }};
}

/// Debug-level logging
macro_rules! flow_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        log::debug!($($arg)*);
        #[cfg(not(feature = "log"))]
        let _ = core::format_args!($($arg)*);
    }};
}

/// Info-level logging
macro_rules! flow_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        log::info!($($arg)*);
        #[cfg(not(feature = "log"))]
        let _ = core::format_args!($($arg)*);
    }};
}

/// Warn-level logging
macro_rules! flow_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        log::warn!($($arg)*);
        #[cfg(not(feature = "log"))]
        let _ = core::format_args!($($arg)*);
    }};
}
