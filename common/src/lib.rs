//! Shared building blocks for `edgemap`.
//!
//! Holds the domain model every other crate speaks (device endpoints, MAC addresses,
//! correlated port records), the error taxonomy, the YAML configuration model and the
//! logging macros used across the workspace.

pub mod config;
pub mod error;
pub mod network;
pub mod records;

pub use tracing;
pub use tracing::{debug, error, info, trace, warn};

/// Logs a completed step. Rendered with its own marker by the terminal formatter.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        $crate::tracing::info!(target: "edgemap::success", $($arg)*)
    };
}
