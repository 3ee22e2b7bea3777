//! # Error Types
//!
//! Fatal error handling for the size attribution pipeline.
//!
//! Variants raised while reading a binary carry its path, so a caller
//! analyzing many binaries can report the failure and move on to the next one.
//!
//! Only conditions that make a report impossible live here. Degraded inputs
//! (empty symbol tables, all-zero sizes, missing module-cache directories,
//! unreadable files during a size walk) are logged and recorded as
//! [`Advisory`](crate::types::Advisory) values instead.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for analysis operations
///
/// ## Error Categories
///
/// 1. **Input errors**: OpenBinary
/// 2. **Provenance errors**: MissingBuildInfo
/// 3. **Container errors**: UnrecognizedContainerFormat
/// 4. **Configuration errors**: InvalidConfig
/// 5. **I/O errors**: Io (work directory scans, etc.)
#[derive(Error, Debug)]
pub enum HeftError
{
    /// The binary could not be opened or read at all.
    #[error("Failed to open binary {}: {source}", path.display())]
    OpenBinary
    {
        /// Path that was requested
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// The binary carries no decodable build information
    ///
    /// This happens when:
    /// - The file was not produced by the Go toolchain
    /// - The build-info header is present but truncated or corrupt
    /// - The toolchain version string is empty
    ///
    /// Nothing downstream is possible without provenance, so this aborts the
    /// analysis.
    #[error("No Go build information in {}: {reason}", path.display())]
    MissingBuildInfo
    {
        /// Path of the inspected binary
        path: PathBuf,
        /// Why decoding failed
        reason: String,
    },

    /// None of the supported container formats (ELF, Mach-O, PE) accepted the file.
    #[error("Unrecognized container format: {} is not ELF, Mach-O or PE", path.display())]
    UnrecognizedContainerFormat
    {
        /// Path of the inspected binary
        path: PathBuf,
    },

    /// Analyzer configuration was rejected at construction time.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error outside of opening the analyzed binary
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, HeftError>`
///
/// ```rust
/// use heft_core::error::HeftResult;
/// fn foo() -> HeftResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type HeftResult<T> = std::result::Result<T, HeftError>;
