//! # heft Utilities
//!
//! Shared utilities for heft: logging setup and discovery of the local Go
//! module cache from the environment.
//!
//! This crate provides the ambient pieces the command-line tool needs before
//! an analysis can start. The analysis itself lives in `heft-core`.

pub mod logging;
pub mod modcache;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogGuard, LogLevel, LoggingError};
pub use modcache::locate_module_cache;
pub use tracing::{debug, error, info, trace, warn};
