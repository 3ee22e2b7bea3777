//! # Analysis Pipeline
//!
//! Runs one analysis request end to end, strictly in sequence:
//!
//! 1. read the binary
//! 2. load build provenance (fatal if absent)
//! 3. detect the container and read its symbols (fatal if unrecognized)
//! 4. resolve symbol names to packages
//! 5. reconcile sizes
//! 6. assemble the ranked report
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use heft_core::analyzer::Analyzer;
//! use heft_core::config::AnalyzerConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let config = AnalyzerConfig::new()?;
//!     let report = Analyzer::new(&config).analyze(Path::new("./app"))?;
//!     for entry in &report.entries {
//!         println!("{:>8} {}", entry.size_human(), entry.name());
//!     }
//!     Ok(())
//! }
//! ```

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::buildinfo::read_build_info;
use crate::config::AnalyzerConfig;
use crate::container::read_symbol_table;
use crate::error::{HeftError, HeftResult};
use crate::reconcile::{ReconcileInput, Reconciler};
use crate::report::{assemble, Report};
use crate::resolver::PackageResolver;
use crate::types::{Advisory, SymbolTable};

/// Analyzes binaries with one configuration.
pub struct Analyzer<'a>
{
    config: &'a AnalyzerConfig,
    resolver: PackageResolver,
    reconciler: Reconciler,
}

impl<'a> Analyzer<'a>
{
    pub fn new(config: &'a AnalyzerConfig) -> Self
    {
        Self {
            config,
            resolver: config.resolver(),
            reconciler: Reconciler::from_config(config),
        }
    }

    /// Analyze the binary at `path`.
    ///
    /// ## Errors
    ///
    /// - [`HeftError::OpenBinary`] if the file cannot be read.
    /// - [`HeftError::MissingBuildInfo`] if it carries no build info.
    /// - [`HeftError::UnrecognizedContainerFormat`] if it is not ELF, Mach-O or PE.
    pub fn analyze(&self, path: &Path) -> HeftResult<Report>
    {
        let data = fs::read(path).map_err(|source| HeftError::OpenBinary {
            path: path.to_path_buf(),
            source,
        })?;
        self.analyze_bytes(&data, path)
    }

    /// Analyze a binary already in memory. `path` is used for diagnostics and row paths.
    ///
    /// ## Errors
    ///
    /// Same as [`Analyzer::analyze`], minus the read failure.
    pub fn analyze_bytes(&self, data: &[u8], path: &Path) -> HeftResult<Report>
    {
        info!(path = %path.display(), bytes = data.len(), "analyzing binary");

        let provenance = read_build_info(data, path, self.config.patterns())?;
        let mut table = read_symbol_table(data, path)?;
        let mut advisories = self.resolve(&mut table);

        let input = ReconcileInput {
            symbols: &table.symbols,
            file_size: data.len() as u64,
            provenance: &provenance,
        };
        let attribution = self.reconciler.reconcile(&input);
        let entries = assemble(path, &provenance, &attribution);
        advisories.extend(attribution.advisories);

        info!(entries = entries.len(), method = %attribution.method, "report assembled");
        Ok(Report {
            binary: path.to_path_buf(),
            format: table.format,
            go_version: provenance.go_version,
            method: attribution.method,
            entries,
            advisories,
        })
    }

    /// Fill in each symbol's package and report tables that yield nothing.
    fn resolve(&self, table: &mut SymbolTable) -> Vec<Advisory>
    {
        if table.is_empty() {
            warn!(format = %table.format, "symbol table is empty");
            return vec![Advisory::EmptySymbolTable(table.format)];
        }

        for symbol in &mut table.symbols {
            symbol.package = self.resolver.package_of(&symbol.name);
        }

        let resolved = table.resolved().count();
        info!(total = table.symbols.len(), resolved, "symbols resolved");
        if resolved == 0 {
            warn!(total = table.symbols.len(), "no symbol resolved to a package");
            return vec![Advisory::NoResolvedSymbols {
                total: table.symbols.len(),
            }];
        }
        Vec::new()
    }
}
