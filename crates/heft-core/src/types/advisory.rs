//! Non-fatal conditions recorded while building a report.

use std::fmt;
use std::path::PathBuf;

use super::symbols::ContainerFormat;

/// A degraded condition the pipeline continued past.
///
/// Every advisory is also logged at `warn` level when it is raised.
#[derive(Debug, Clone, PartialEq)]
pub enum Advisory
{
    /// The container parsed but its symbol tables were empty.
    EmptySymbolTable(ContainerFormat),
    /// Symbols were present but none resolved to a package.
    NoResolvedSymbols
    {
        total: usize,
    },
    /// Symbol sizes were all zero; sizes are a proportional estimate.
    EstimatedSizes
    {
        code_fraction: f64,
    },
    /// No module cache root is configured, so module sizes stay unknown.
    ModuleCacheUnavailable,
    /// A module's cache directory does not exist.
    ModuleCacheMissing
    {
        module: String,
        path: PathBuf,
    },
    /// A module has no stable cache key (development build or local replacement).
    UnversionedModule
    {
        module: String,
    },
}

impl fmt::Display for Advisory
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self {
            Advisory::EmptySymbolTable(format) => write!(f, "{format} symbol table is empty"),
            Advisory::NoResolvedSymbols { total } => {
                write!(f, "none of {total} symbols resolved to a package")
            }
            Advisory::EstimatedSizes { code_fraction } => write!(
                f,
                "symbol sizes unavailable; sizes are proportional estimates over {:.0}% of the file",
                code_fraction * 100.0
            ),
            Advisory::ModuleCacheUnavailable => write!(f, "no module cache configured"),
            Advisory::ModuleCacheMissing { module, path } => {
                write!(f, "module cache path for {module} does not exist: {}", path.display())
            }
            Advisory::UnversionedModule { module } => write!(f, "{module} has no cacheable version"),
        }
    }
}
