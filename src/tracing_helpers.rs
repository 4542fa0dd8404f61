//! Zero-cost tracing helpers.
//!
//! With the `tracing` feature these macros forward to the `tracing` crate.
//! Without it (the default) they expand to nothing.
//!
//! # Usage
//!
//! ```bash
//! # No tracing overhead
//! cargo build --release
//!
//! # Tree structure changes (root splits, collapses, snapshots)
//! RUST_LOG=isobtree=debug cargo test --features tracing
//!
//! # Every copy-on-write, merge and rotation
//! RUST_LOG=isobtree::tree=trace cargo test --features tracing --test isolation_tests
//! ```
//!
//! Levels used by the crate:
//! - `debug`: once per tree-level event (`root split`, `root collapse`, `iso copy`)
//! - `trace`: once per node (`copy-on-write node`, `split child`, `merge children`,
//!   rotations, fast-path fallbacks)

#![allow(unused_macros, unused_imports)]

/// Trace-level logging. Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

/// Debug-level logging. Compiles to no-op without `tracing` feature.
#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
pub(crate) use trace_log;
