//! # Size Reconciliation
//!
//! Turns resolved symbols and build provenance into byte sizes per package.
//!
//! Reconciliation is an ordered chain of [`SizeStrategy`] values. Each one
//! either concludes with sizes ([`Outcome::Sized`]) or declares the available
//! information insufficient, handing over to the next:
//!
//! 1. [`DirectAggregation`]: sum explicit symbol sizes per package.
//! 2. [`ProportionalEstimate`]: split a fraction of the file size across
//!    packages by symbol count. Approximate by construction.
//! 3. [`ModuleCacheFallback`]: size provenance modules from their source tree
//!    in the local module cache.
//!
//! The concluding strategy is recorded on the [`Attribution`] so reports can
//! tell measured sizes from estimates.
//!
//! ## Errors
//!
//! Reconciliation never fails. Missing information degrades to absent or zero
//! sizes plus an [`Advisory`].

mod estimate;
mod modcache;

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

pub use self::estimate::{proportional_estimate, symbol_counts, ProportionalEstimate};
pub use self::modcache::{cache_dir_for, dir_size, escape_module_path, size_cached_modules, ModuleCacheFallback};
use crate::config::AnalyzerConfig;
use crate::types::{Advisory, BuildInfo, SizeSource, Symbol};

/// Everything a strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a>
{
    /// Symbols with their resolved packages. Unresolved symbols are ignored.
    pub symbols: &'a [Symbol],
    /// Size of the analyzed file in bytes.
    pub file_size: u64,
    pub provenance: &'a BuildInfo,
}

/// Result of one strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome
{
    /// Sizes keyed by package identity, or by module path for module-cache sizing.
    Sized(BTreeMap<String, u64>),
    /// Not enough information; the next strategy runs.
    Insufficient,
}

/// One step of the reconciliation chain.
pub trait SizeStrategy: Send + Sync
{
    /// Source tag given to sizes this strategy concludes with.
    fn source(&self) -> SizeSource;

    /// Try to size the input. Degraded conditions are pushed to `advisories`.
    fn attempt(&self, input: &ReconcileInput<'_>, advisories: &mut Vec<Advisory>) -> Outcome;
}

/// Sum of explicit symbol sizes per resolved package.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectAggregation;

impl SizeStrategy for DirectAggregation
{
    fn source(&self) -> SizeSource
    {
        SizeSource::Symbols
    }

    fn attempt(&self, input: &ReconcileInput<'_>, _advisories: &mut Vec<Advisory>) -> Outcome
    {
        let sizes = aggregate_sizes(input.symbols);
        if sizes.values().any(|size| *size > 0) {
            Outcome::Sized(sizes)
        } else {
            debug!(packages = sizes.len(), "no package has a non-zero symbol size");
            Outcome::Insufficient
        }
    }
}

/// Sum `size` across resolved symbols, grouped by package.
///
/// Packages whose symbols all have size `0` are present with `0`. The result
/// does not depend on symbol order.
pub fn aggregate_sizes<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> BTreeMap<String, u64>
{
    let mut sizes: BTreeMap<String, u64> = BTreeMap::new();
    for symbol in symbols {
        if let Some(package) = &symbol.package {
            let total = sizes.entry(package.clone()).or_default();
            *total = total.saturating_add(symbol.size);
        }
    }
    sizes
}

/// Sizes produced by reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution
{
    /// Strategy that concluded, [`SizeSource::Unknown`] if none did.
    pub method: SizeSource,
    /// Package sizes from symbol aggregation or the proportional estimate.
    pub packages: BTreeMap<String, u64>,
    /// Module sizes read from the module cache, keyed by module path.
    pub modules: BTreeMap<String, u64>,
    pub advisories: Vec<Advisory>,
}

impl Attribution
{
    pub fn is_estimate(&self) -> bool
    {
        self.method.is_estimate()
    }
}

/// Runs the strategy chain.
pub struct Reconciler
{
    strategies: Vec<Box<dyn SizeStrategy>>,
    module_cache: Option<PathBuf>,
    fill_missing_from_cache: bool,
}

impl Reconciler
{
    /// Default chain: direct aggregation, proportional estimate, module cache.
    pub fn from_config(config: &AnalyzerConfig) -> Self
    {
        let module_cache = config.module_cache().map(PathBuf::from);
        Self {
            strategies: vec![
                Box::new(DirectAggregation),
                Box::new(ProportionalEstimate::new(config.code_fraction())),
                Box::new(ModuleCacheFallback::new(module_cache.clone())),
            ],
            module_cache,
            fill_missing_from_cache: config.fill_missing_from_cache(),
        }
    }

    /// Custom chain. Strategies run in the given order.
    pub fn with_strategies(strategies: Vec<Box<dyn SizeStrategy>>) -> Self
    {
        Self {
            strategies,
            module_cache: None,
            fill_missing_from_cache: false,
        }
    }

    pub fn reconcile(&self, input: &ReconcileInput<'_>) -> Attribution
    {
        let mut advisories = Vec::new();
        let mut attribution = None;

        for strategy in &self.strategies {
            match strategy.attempt(input, &mut advisories) {
                Outcome::Sized(sizes) => {
                    info!(method = %strategy.source(), entries = sizes.len(), "sizes reconciled");
                    attribution = Some((strategy.source(), sizes));
                    break;
                }
                Outcome::Insufficient => debug!(method = %strategy.source(), "strategy insufficient"),
            }
        }

        let Some((method, sizes)) = attribution else {
            info!("no strategy produced sizes");
            return Attribution {
                method: SizeSource::Unknown,
                packages: BTreeMap::new(),
                modules: BTreeMap::new(),
                advisories,
            };
        };

        if method == SizeSource::ModuleCache {
            return Attribution {
                method,
                packages: BTreeMap::new(),
                modules: sizes,
                advisories,
            };
        }

        let modules = match (&self.module_cache, self.fill_missing_from_cache) {
            (Some(root), true) => {
                let missing = input
                    .provenance
                    .modules()
                    .filter(|module| sizes.get(&module.path).copied().unwrap_or(0) == 0);
                size_cached_modules(root, missing, &mut advisories)
            }
            _ => BTreeMap::new(),
        };

        Attribution {
            method,
            packages: sizes,
            modules,
            advisories,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn resolved(name: &str, size: u64, package: &str) -> Symbol
    {
        Symbol::new(name, size, 0).with_package(package)
    }

    #[test]
    fn test_aggregate_sizes_ignores_unresolved()
    {
        let symbols = vec![
            resolved("main.run", 10, "main"),
            resolved("main.init", 2, "main"),
            Symbol::new("noise123", 3, 0),
        ];
        let sizes = aggregate_sizes(&symbols);
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes["main"], 12);
    }

    #[test]
    fn test_direct_aggregation_insufficient_on_zero()
    {
        let symbols = vec![resolved("main.run", 0, "main")];
        let provenance = BuildInfo::default();
        let input = ReconcileInput {
            symbols: &symbols,
            file_size: 100,
            provenance: &provenance,
        };
        assert_eq!(DirectAggregation.attempt(&input, &mut Vec::new()), Outcome::Insufficient);
    }

    #[test]
    fn test_chain_stops_at_first_sized()
    {
        let symbols = vec![resolved("main.run", 10, "main")];
        let provenance = BuildInfo::default();
        let input = ReconcileInput {
            symbols: &symbols,
            file_size: 100,
            provenance: &provenance,
        };
        let reconciler = Reconciler::with_strategies(vec![
            Box::new(DirectAggregation),
            Box::new(ProportionalEstimate::new(0.7)),
        ]);
        let attribution = reconciler.reconcile(&input);
        assert_eq!(attribution.method, SizeSource::Symbols);
        assert!(attribution.advisories.is_empty());
    }
}
