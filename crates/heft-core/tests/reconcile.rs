//! Tests for size reconciliation

mod common;

use std::collections::BTreeMap;

use heft_core::config::AnalyzerConfig;
use heft_core::reconcile::{
    aggregate_sizes, dir_size, proportional_estimate, DirectAggregation, Outcome, ReconcileInput, Reconciler, SizeStrategy,
};
use heft_core::resolver::resolve_package;
use heft_core::types::{Advisory, BuildInfo, ModuleVersion, SizeSource, Symbol};
use tempfile::TempDir;

use crate::common::write_tree;

fn resolved_symbols(named: &[(&str, u64)]) -> Vec<Symbol>
{
    named
        .iter()
        .map(|(name, size)| {
            let symbol = Symbol::new(*name, *size, 0);
            match resolve_package(name) {
                Some(package) => symbol.with_package(package),
                None => symbol,
            }
        })
        .collect()
}

fn provenance_with_lib() -> BuildInfo
{
    BuildInfo {
        main: Some(ModuleVersion::new("example.com/app", "(devel)")),
        deps: vec![ModuleVersion::new("example.com/lib", "v1.2.3")],
        ..BuildInfo::default()
    }
}

#[test]
fn test_direct_aggregation_scenario()
{
    let symbols = resolved_symbols(&[
        ("main.run", 10),
        ("runtime.gcStart", 5),
        ("github.com/x/y.Do", 20),
        ("noise123", 3),
    ]);
    let sizes = aggregate_sizes(&symbols);
    let expected = BTreeMap::from([
        ("main".to_string(), 10),
        ("runtime".to_string(), 5),
        ("github.com/x/y".to_string(), 20),
    ]);
    assert_eq!(sizes, expected);

    let reversed: Vec<Symbol> = symbols.iter().rev().cloned().collect();
    assert_eq!(aggregate_sizes(&reversed), expected);

    let mass: u64 = symbols.iter().filter(|symbol| symbol.package.is_some()).map(|symbol| symbol.size).sum();
    assert!(sizes.values().sum::<u64>() <= mass);
}

#[test]
fn test_direct_aggregation_with_huge_sizes()
{
    let huge = u64::MAX / 2 + 1;
    let symbols = resolved_symbols(&[("main.run", huge), ("runtime.gcStart", huge)]);
    let provenance = BuildInfo::default();
    let input = ReconcileInput {
        symbols: &symbols,
        file_size: 4096,
        provenance: &provenance,
    };

    let mut advisories = Vec::new();
    match DirectAggregation.attempt(&input, &mut advisories) {
        Outcome::Sized(sizes) => {
            assert_eq!(sizes["main"], huge);
            assert_eq!(sizes["runtime"], huge);
        }
        Outcome::Insufficient => panic!("Expected symbol sizes to conclude"),
    }
    assert!(advisories.is_empty());
}

#[test]
fn test_proportional_estimate_split()
{
    let counts = BTreeMap::from([("A".to_string(), 2), ("B".to_string(), 8)]);
    let sizes = proportional_estimate(&counts, 1000, 0.7);
    assert_eq!(sizes["A"], 140);
    assert_eq!(sizes["B"], 560);
    assert_eq!(sizes.values().sum::<u64>(), 700);
}

#[test]
fn test_proportional_estimate_empty_counts()
{
    assert!(proportional_estimate(&BTreeMap::new(), 1000, 0.7).is_empty());
}

#[test]
fn test_reconciler_concludes_with_symbols()
{
    let config = AnalyzerConfig::new().unwrap();
    let symbols = resolved_symbols(&[("main.run", 10), ("runtime.gcStart", 5)]);
    let provenance = provenance_with_lib();
    let attribution = Reconciler::from_config(&config).reconcile(&ReconcileInput {
        symbols: &symbols,
        file_size: 4096,
        provenance: &provenance,
    });

    assert_eq!(attribution.method, SizeSource::Symbols);
    assert_eq!(attribution.packages["main"], 10);
    assert!(attribution.modules.is_empty());
    assert!(!attribution.is_estimate());
}

#[test]
fn test_reconciler_estimates_when_sizes_are_zero()
{
    let config = AnalyzerConfig::new().unwrap();
    let symbols = resolved_symbols(&[
        ("main.a", 0),
        ("main.b", 0),
        ("runtime.a", 0),
        ("runtime.b", 0),
        ("runtime.c", 0),
        ("runtime.d", 0),
        ("runtime.e", 0),
        ("runtime.f", 0),
        ("runtime.g", 0),
        ("runtime.h", 0),
    ]);
    let provenance = provenance_with_lib();
    let attribution = Reconciler::from_config(&config).reconcile(&ReconcileInput {
        symbols: &symbols,
        file_size: 1000,
        provenance: &provenance,
    });

    assert!(attribution.is_estimate());
    assert_eq!(attribution.packages["main"], 140);
    assert_eq!(attribution.packages["runtime"], 560);
    assert!(attribution
        .advisories
        .iter()
        .any(|advisory| matches!(advisory, Advisory::EstimatedSizes { .. })));
}

#[test]
fn test_module_cache_fallback()
{
    let cache = TempDir::new().unwrap();
    write_tree(cache.path(), &[("example.com/lib@v1.2.3/lib.go", 300), ("example.com/lib@v1.2.3/sub/x.go", 45)]);

    let config = AnalyzerConfig::new()
        .unwrap()
        .with_module_cache(Some(cache.path().to_path_buf()));
    let provenance = provenance_with_lib();
    let attribution = Reconciler::from_config(&config).reconcile(&ReconcileInput {
        symbols: &[],
        file_size: 1000,
        provenance: &provenance,
    });

    assert_eq!(attribution.method, SizeSource::ModuleCache);
    assert_eq!(attribution.modules["example.com/lib"], 345);
    assert!(attribution.packages.is_empty());
    assert!(attribution.advisories.contains(&Advisory::UnversionedModule {
        module: "example.com/app".to_string(),
    }));
}

#[test]
fn test_module_cache_missing_directory()
{
    let cache = TempDir::new().unwrap();
    let config = AnalyzerConfig::new()
        .unwrap()
        .with_module_cache(Some(cache.path().to_path_buf()));
    let provenance = provenance_with_lib();
    let attribution = Reconciler::from_config(&config).reconcile(&ReconcileInput {
        symbols: &[],
        file_size: 1000,
        provenance: &provenance,
    });

    assert_eq!(attribution.method, SizeSource::Unknown);
    assert!(attribution.modules.is_empty());
    assert!(attribution
        .advisories
        .iter()
        .any(|advisory| matches!(advisory, Advisory::ModuleCacheMissing { module, .. } if module == "example.com/lib")));
}

#[test]
fn test_no_module_cache_configured()
{
    let config = AnalyzerConfig::new().unwrap();
    let provenance = provenance_with_lib();
    let attribution = Reconciler::from_config(&config).reconcile(&ReconcileInput {
        symbols: &[],
        file_size: 0,
        provenance: &provenance,
    });
    assert_eq!(attribution.method, SizeSource::Unknown);
    assert!(attribution.advisories.contains(&Advisory::ModuleCacheUnavailable));
}

#[test]
fn test_fill_missing_from_cache()
{
    let cache = TempDir::new().unwrap();
    write_tree(cache.path(), &[("example.com/lib@v1.2.3/lib.go", 64)]);
    let symbols = resolved_symbols(&[("main.run", 10)]);
    let provenance = provenance_with_lib();

    let config = AnalyzerConfig::new()
        .unwrap()
        .with_module_cache(Some(cache.path().to_path_buf()));
    let plain = Reconciler::from_config(&config).reconcile(&ReconcileInput {
        symbols: &symbols,
        file_size: 1000,
        provenance: &provenance,
    });
    assert!(plain.modules.is_empty());

    let filling = Reconciler::from_config(&config.with_fill_missing_from_cache(true)).reconcile(&ReconcileInput {
        symbols: &symbols,
        file_size: 1000,
        provenance: &provenance,
    });
    assert_eq!(filling.method, SizeSource::Symbols);
    assert_eq!(filling.modules["example.com/lib"], 64);
}

#[test]
fn test_dir_size_empty_and_missing()
{
    let dir = TempDir::new().unwrap();
    assert_eq!(dir_size(dir.path()), 0);
    assert_eq!(dir_size(&dir.path().join("does-not-exist")), 0);
}

#[test]
fn test_dir_size_sums_nested_files()
{
    let dir = TempDir::new().unwrap();
    write_tree(dir.path(), &[("a.txt", 10), ("nested/b.txt", 20), ("nested/deeper/c.txt", 30)]);
    assert_eq!(dir_size(dir.path()), 60);
}
