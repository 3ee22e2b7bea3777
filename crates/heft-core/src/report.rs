//! # Report Assembly
//!
//! Merges symbol-derived package sizes with provenance modules into one
//! ranked list of [`ModuleEntry`] rows.
//!
//! ## Merge rules
//!
//! - Rows are keyed by identity (`name`); each identity appears once.
//! - A size concluded by reconciliation is authoritative. A provenance module
//!   only takes a module-cache size when its symbol-derived size is zero.
//! - Provenance modules with no size information are kept at `0` with
//!   [`SizeSource::Unknown`].
//!
//! ## Ordering
//!
//! Descending by size, ties broken by ascending name. The order is total, so
//! assembling identical input twice yields identical output.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::reconcile::Attribution;
use crate::types::{Advisory, BuildInfo, ContainerFormat, ModuleEntry, SizeSource};

/// The outcome of one analysis.
#[derive(Debug, Clone)]
pub struct Report
{
    /// Analyzed binary.
    pub binary: PathBuf,
    pub format: ContainerFormat,
    /// Toolchain version from build info.
    pub go_version: String,
    /// Strategy that produced the sizes.
    pub method: SizeSource,
    /// Ranked rows.
    pub entries: Vec<ModuleEntry>,
    /// Degraded conditions met along the way.
    pub advisories: Vec<Advisory>,
}

impl Report
{
    /// Whether sizes are a proportional estimate rather than measured.
    pub fn is_estimate(&self) -> bool
    {
        self.method.is_estimate()
    }

    pub fn total_size(&self) -> u64
    {
        self.entries.iter().map(ModuleEntry::size).fold(0, u64::saturating_add)
    }

    /// Rows collapsed by [`top_level_package`].
    pub fn rolled_up(&self) -> Vec<ModuleEntry>
    {
        rollup(&self.entries, top_level_package)
    }
}

/// Build ranked rows from reconciled sizes and provenance.
///
/// Package rows take `binary` as their path and the attribution method as
/// their source. Module rows take the module path as both name and path.
pub fn assemble(binary: &Path, provenance: &BuildInfo, attribution: &Attribution) -> Vec<ModuleEntry>
{
    let binary_path = binary.display().to_string();
    let mut rows: BTreeMap<String, ModuleEntry> = BTreeMap::new();

    for (package, size) in &attribution.packages {
        if package.is_empty() {
            continue;
        }
        rows.insert(
            package.clone(),
            ModuleEntry::new(package.as_str(), *size, attribution.method).with_path(binary_path.as_str()),
        );
    }

    for module in provenance.modules() {
        if module.path.is_empty() {
            continue;
        }
        let row = rows
            .entry(module.path.clone())
            .or_insert_with(|| ModuleEntry::new(module.path.as_str(), 0, SizeSource::Unknown));
        row.set_path(module.path.as_str());
        if row.version().is_empty() {
            row.set_version(module.version.as_str());
        }
        if row.size() == 0 {
            if let Some(size) = attribution.modules.get(&module.path) {
                row.set_size(*size, SizeSource::ModuleCache);
            }
        }
    }

    let mut entries: Vec<ModuleEntry> = rows.into_values().collect();
    sort_entries(&mut entries);
    entries
}

/// Deduplicate rows by name and rank them.
///
/// The first row seen for a name is kept unless it is at zero and a later
/// row for the same name carries a size.
pub fn merge_entries(entries: impl IntoIterator<Item = ModuleEntry>) -> Vec<ModuleEntry>
{
    let mut rows: BTreeMap<String, ModuleEntry> = BTreeMap::new();
    for entry in entries {
        if entry.name().is_empty() {
            continue;
        }
        match rows.get_mut(entry.name()) {
            Some(existing) if existing.size() == 0 && entry.size() > 0 => *existing = entry,
            Some(_) => {}
            None => {
                rows.insert(entry.name().to_string(), entry);
            }
        }
    }

    let mut merged: Vec<ModuleEntry> = rows.into_values().collect();
    sort_entries(&mut merged);
    merged
}

/// Descending by size, then ascending by name.
pub fn sort_entries(entries: &mut [ModuleEntry])
{
    entries.sort_by(|left, right| {
        right
            .size()
            .cmp(&left.size())
            .then_with(|| left.name().cmp(right.name()))
    });
}

/// Collapse rows sharing a coarse key, summing their sizes.
///
/// The sum of sizes is preserved exactly for any key function. Rolled-up rows
/// carry the key as name and path, and no version.
pub fn rollup<F>(entries: &[ModuleEntry], key: F) -> Vec<ModuleEntry>
where
    F: Fn(&str) -> String,
{
    let mut groups: BTreeMap<String, ModuleEntry> = BTreeMap::new();
    for entry in entries {
        let group = key(entry.name());
        match groups.get_mut(&group) {
            Some(existing) => {
                existing.add_size(entry.size());
                let source = combine_sources(existing.source(), entry.source());
                existing.set_size(existing.size(), source);
            }
            None => {
                let row = ModuleEntry::new(group.as_str(), entry.size(), entry.source()).with_path(group.as_str());
                groups.insert(group, row);
            }
        }
    }

    let mut rolled: Vec<ModuleEntry> = groups.into_values().collect();
    sort_entries(&mut rolled);
    rolled
}

fn combine_sources(left: SizeSource, right: SizeSource) -> SizeSource
{
    match (left, right) {
        _ if left == right => left,
        (SizeSource::Unknown, other) | (other, SizeSource::Unknown) => other,
        (SizeSource::Estimate, _) | (_, SizeSource::Estimate) => SizeSource::Estimate,
        (SizeSource::ModuleCache, _) | (_, SizeSource::ModuleCache) => SizeSource::ModuleCache,
        _ => left,
    }
}

/// Default coarse grouping key.
///
/// ```rust
/// use heft_core::report::top_level_package;
///
/// assert_eq!(top_level_package("runtime/internal/atomic"), "runtime");
/// assert_eq!(top_level_package("internal/abi"), "internal/*");
/// assert_eq!(top_level_package("github.com/acme/foo/bar"), "github.com/acme");
/// assert_eq!(top_level_package("net/http"), "net/http");
/// assert_eq!(top_level_package("main"), "main");
/// ```
pub fn top_level_package(name: &str) -> String
{
    if name.starts_with("runtime") {
        return "runtime".to_string();
    }
    if name.starts_with("internal/") {
        return "internal/*".to_string();
    }
    if name.starts_with("vendor/") {
        return "vendor/*".to_string();
    }
    if name.contains(['.', '/']) {
        return name.split('/').take(2).collect::<Vec<_>>().join("/");
    }
    name.to_string()
}
