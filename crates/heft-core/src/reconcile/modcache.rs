use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{Outcome, ReconcileInput, SizeStrategy};
use crate::types::{Advisory, ModuleVersion, SizeSource};

/// Sizes provenance modules by the on-disk size of their cached source.
///
/// Concludes when at least one module directory was found.
#[derive(Debug, Clone, Default)]
pub struct ModuleCacheFallback
{
    root: Option<PathBuf>,
}

impl ModuleCacheFallback
{
    pub fn new(root: Option<PathBuf>) -> Self
    {
        Self { root }
    }
}

impl SizeStrategy for ModuleCacheFallback
{
    fn source(&self) -> SizeSource
    {
        SizeSource::ModuleCache
    }

    fn attempt(&self, input: &ReconcileInput<'_>, advisories: &mut Vec<Advisory>) -> Outcome
    {
        let Some(root) = &self.root else {
            warn!("no module cache configured, module sizes unknown");
            advisories.push(Advisory::ModuleCacheUnavailable);
            return Outcome::Insufficient;
        };

        let sizes = size_cached_modules(root, input.provenance.modules(), advisories);
        if sizes.is_empty() {
            Outcome::Insufficient
        } else {
            Outcome::Sized(sizes)
        }
    }
}

/// Escape a module path or version for the cache layout: every uppercase
/// ASCII letter `X` becomes `!x`.
///
/// Returns `None` for text that already contains `!`, which has no escaped form.
///
/// ```rust
/// use heft_core::reconcile::escape_module_path;
///
/// assert_eq!(escape_module_path("github.com/BurntSushi/toml").as_deref(), Some("github.com/!burnt!sushi/toml"));
/// assert_eq!(escape_module_path("bad!path"), None);
/// ```
pub fn escape_module_path(text: &str) -> Option<String>
{
    if text.contains('!') {
        return None;
    }
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if character.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(character.to_ascii_lowercase());
        } else {
            escaped.push(character);
        }
    }
    Some(escaped)
}

/// `<root>/<escaped path>@<escaped version>`, or `None` when either part cannot be escaped.
pub fn cache_dir_for(root: &Path, path: &str, version: &str) -> Option<PathBuf>
{
    let path = escape_module_path(path)?;
    let version = escape_module_path(version)?;
    Some(root.join(format!("{path}@{version}")))
}

/// Total size of the regular files beneath `root`.
///
/// Symbolic links are not followed. Entries that cannot be read are logged
/// and skipped; a missing `root` yields `0`.
pub fn dir_size(root: &Path) -> u64
{
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(root = %root.display(), "skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!(path = %entry.path().display(), "skipping file without metadata: {err}");
                0
            }
        })
        .sum()
}

/// Look up each module's cache directory and size those that exist.
///
/// Modules without a release version, or whose directory is missing, are
/// left out and recorded as advisories. Directories are walked in parallel;
/// each walk sums into its own total.
pub fn size_cached_modules<'a>(
    root: &Path,
    modules: impl IntoIterator<Item = &'a ModuleVersion>,
    advisories: &mut Vec<Advisory>,
) -> BTreeMap<String, u64>
{
    let mut lookups: BTreeMap<String, PathBuf> = BTreeMap::new();

    for module in modules {
        if lookups.contains_key(&module.path) {
            continue;
        }
        let Some(dir) = module
            .cache_key()
            .and_then(|(path, version)| cache_dir_for(root, path, version))
        else {
            warn!(module = %module.path, version = %module.version, "module has no cacheable version");
            advisories.push(Advisory::UnversionedModule {
                module: module.path.clone(),
            });
            continue;
        };
        if !dir.is_dir() {
            warn!(module = %module.path, path = %dir.display(), "module cache path does not exist");
            advisories.push(Advisory::ModuleCacheMissing {
                module: module.path.clone(),
                path: dir,
            });
            continue;
        }
        lookups.insert(module.path.clone(), dir);
    }

    let sizes: Vec<(String, u64)> = lookups
        .into_par_iter()
        .map(|(module, dir)| {
            let size = dir_size(&dir);
            debug!(module = %module, size, "module cache directory sized");
            (module, size)
        })
        .collect();

    sizes.into_iter().collect()
}
