//! # heft-core
//!
//! Size attribution for binaries built by the Go toolchain.
//!
//! Given a compiled binary, this crate answers "which packages and modules
//! account for its size?". It:
//! - decodes the build info the linker embeds (main module, dependencies)
//! - reads the symbol table of an ELF, Mach-O or PE container
//! - maps symbol names back to packages
//! - reconciles per-package sizes, falling back to estimates and the module cache
//! - assembles a ranked report
//!
//! Package resolution is a naming heuristic. Unresolvable symbols are left out
//! rather than guessed, and estimated sizes are always tagged as such.
//!
//! See [`analyzer`] for the pipeline entry point.

pub mod analyzer;
pub mod buildinfo;
pub mod config;
pub mod container;
pub mod error;
pub mod prelude;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod types;
pub mod workdir;

pub use analyzer::Analyzer;
pub use config::AnalyzerConfig;
pub use error::{HeftError, HeftResult};
pub use report::Report;
pub use types::{ModuleEntry, SizeSource};
