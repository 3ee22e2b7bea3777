//! # Analyzer Configuration
//!
//! Explicit configuration for the attribution pipeline.
//!
//! An [`AnalyzerConfig`] is built once at the composition root (the CLI, or a
//! test) and handed by reference to the components that need it. Compiled
//! text patterns live in [`Patterns`] inside the configuration rather than in
//! process-wide statics.
//!
//! ## Example
//!
//! ```rust
//! use heft_core::config::AnalyzerConfig;
//!
//! # fn main() -> heft_core::error::HeftResult<()> {
//! let config = AnalyzerConfig::new()?
//!     .with_code_fraction(0.6)?
//!     .with_module_cache(Some("/home/me/go/pkg/mod".into()));
//! assert_eq!(config.code_fraction(), 0.6);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{HeftError, HeftResult};
use crate::resolver::PackageResolver;

/// Fraction of the file assumed to hold code when estimating sizes.
pub const DEFAULT_CODE_FRACTION: f64 = 0.7;

/// Symbol prefixes reported as packages of their own: the runtime, the
/// program entry package, and the toolchain's own namespace.
pub const DEFAULT_RESERVED_PACKAGES: [&str; 3] = ["runtime", "main", "go"];

const MODULE_LINE: &str = r"^(mod|dep|=>)\t([^\t]+)\t([^\t]*)(?:\t([^\t]*))?$";
const PACKAGE_FILE_LINE: &str = r"^packagefile ([^=]+)=(.+)$";
const COMPILE_OUTPUT: &str = r"(?:^|/)compile\s.*?-o\s+(\S+_pkg_\.a)";
const COMPILE_PACKAGE: &str = r"\s-p\s+(\S+)";
const PACK_LINE: &str = r"^pack r (\S+_pkg_\.a)";
const WORK_LINE: &str = r"^WORK=(.+)$";

/// Compiled text patterns used by the provenance loader and work-directory analysis.
#[derive(Debug, Clone)]
pub struct Patterns
{
    /// `mod`/`dep`/`=>` lines of embedded module info.
    pub module_line: Regex,
    /// `packagefile <importpath>=<archive>` lines of an `importcfg` file.
    pub package_file: Regex,
    /// Compile command writing a package archive in verbose build output.
    pub compile_output: Regex,
    /// `-p <importpath>` argument of a compile command.
    pub compile_package: Regex,
    /// `pack r <archive>` lines in verbose build output.
    pub pack_line: Regex,
    /// `WORK=<dir>` line printed by `-work`.
    pub work_line: Regex,
}

impl Patterns
{
    /// Compile every pattern.
    ///
    /// ## Errors
    ///
    /// Returns [`HeftError::InvalidConfig`] if a pattern fails to compile.
    pub fn new() -> HeftResult<Self>
    {
        Ok(Self {
            module_line: compile(MODULE_LINE)?,
            package_file: compile(PACKAGE_FILE_LINE)?,
            compile_output: compile(COMPILE_OUTPUT)?,
            compile_package: compile(COMPILE_PACKAGE)?,
            pack_line: compile(PACK_LINE)?,
            work_line: compile(WORK_LINE)?,
        })
    }
}

fn compile(pattern: &str) -> HeftResult<Regex>
{
    Regex::new(pattern).map_err(|err| HeftError::InvalidConfig(format!("pattern {pattern:?}: {err}")))
}

/// Configuration shared by every stage of an analysis.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig
{
    code_fraction: f64,
    reserved_packages: Vec<String>,
    module_cache: Option<PathBuf>,
    fill_missing_from_cache: bool,
    patterns: Patterns,
}

impl AnalyzerConfig
{
    /// Default configuration: 0.7 code fraction, `runtime`/`main`/`go`
    /// reserved, no module cache.
    ///
    /// ## Errors
    ///
    /// Returns [`HeftError::InvalidConfig`] if the built-in patterns fail to compile.
    pub fn new() -> HeftResult<Self>
    {
        Ok(Self {
            code_fraction: DEFAULT_CODE_FRACTION,
            reserved_packages: DEFAULT_RESERVED_PACKAGES.iter().map(|name| (*name).to_string()).collect(),
            module_cache: None,
            fill_missing_from_cache: false,
            patterns: Patterns::new()?,
        })
    }

    /// Set the fraction of the file attributed to code by the proportional estimate.
    ///
    /// ## Errors
    ///
    /// Returns [`HeftError::InvalidConfig`] unless `fraction` is in `(0, 1]`.
    pub fn with_code_fraction(mut self, fraction: f64) -> HeftResult<Self>
    {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(HeftError::InvalidConfig(format!(
                "code fraction must be in (0, 1], got {fraction}"
            )));
        }
        self.code_fraction = fraction;
        Ok(self)
    }

    #[must_use]
    pub fn with_module_cache(mut self, root: Option<PathBuf>) -> Self
    {
        self.module_cache = root;
        self
    }

    #[must_use]
    pub fn with_reserved_packages<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_packages = names.into_iter().map(Into::into).collect();
        self
    }

    /// Also size modules from the module cache when symbol sizes exist but a
    /// module received none of them. Off by default: it can report more bytes
    /// than the binary's symbols account for.
    #[must_use]
    pub fn with_fill_missing_from_cache(mut self, enabled: bool) -> Self
    {
        self.fill_missing_from_cache = enabled;
        self
    }

    pub fn code_fraction(&self) -> f64
    {
        self.code_fraction
    }

    pub fn reserved_packages(&self) -> &[String]
    {
        &self.reserved_packages
    }

    pub fn module_cache(&self) -> Option<&Path>
    {
        self.module_cache.as_deref()
    }

    pub fn fill_missing_from_cache(&self) -> bool
    {
        self.fill_missing_from_cache
    }

    pub fn patterns(&self) -> &Patterns
    {
        &self.patterns
    }

    /// Package resolver honoring the configured reserved identifiers.
    pub fn resolver(&self) -> PackageResolver
    {
        PackageResolver::new(self.reserved_packages.iter().cloned())
    }
}
