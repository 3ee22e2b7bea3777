//! # Build Work-Directory Analysis
//!
//! Sizes packages by their compiled archives instead of a linked binary.
//!
//! A `go build -work -x` run prints every compile command and keeps its work
//! directory. Two sources are read from it:
//!
//! - [`parse_build_log`]: compile and `pack r` lines of the verbose build log.
//! - [`scan_work_dir`]: the `importcfg` files the build left behind, whose
//!   `packagefile <importpath>=<archive>` lines name every archive the
//!   compiler and linker consumed.
//!
//! Archive sizes are on-disk sizes of compiled code, which track but do not
//! equal the bytes a package contributes to the final binary.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Patterns;
use crate::error::HeftResult;
use crate::report::merge_entries;
use crate::types::{ModuleEntry, SizeSource};

const WORK_VARIABLE: &str = "$WORK";
const IMPORTCFG_NAMES: [&str; 2] = ["importcfg", "importcfg.link"];

/// Work directory announced by a `WORK=<dir>` line.
pub fn work_dir_from_log(log: &str, patterns: &Patterns) -> Option<PathBuf>
{
    log.lines()
        .find_map(|line| patterns.work_line.captures(line.trim_end()))
        .map(|caps| PathBuf::from(caps[1].trim()))
}

/// One row per package archive written during the logged build.
///
/// Compile lines name the package through their `-p` argument; `pack r`
/// lines reuse the name recorded for the same archive, or fall back to the
/// archive's action directory (`b001`). `$WORK` is expanded when the log
/// announces the work directory, and the archive is sized from disk if it
/// still exists. Otherwise the row stays at `0`.
pub fn parse_build_log(log: &str, patterns: &Patterns) -> Vec<ModuleEntry>
{
    let work_dir = work_dir_from_log(log, patterns);
    let mut packages_by_archive: HashMap<String, String> = HashMap::new();
    let mut entries = Vec::new();

    for line in log.lines() {
        let (archive, package) = if let Some(caps) = patterns.compile_output.captures(line) {
            let package = patterns
                .compile_package
                .captures(line)
                .map(|package| package[1].trim_matches('"').to_string());
            (caps[1].to_string(), package)
        } else if let Some(caps) = patterns.pack_line.captures(line) {
            let archive = caps[1].to_string();
            let package = packages_by_archive.get(&archive).cloned();
            (archive, package)
        } else {
            continue;
        };

        let name = package.unwrap_or_else(|| action_name(&archive));
        packages_by_archive.insert(archive.clone(), name.clone());

        let location = expand_work(&archive, work_dir.as_deref());
        let (size, source) = match &location {
            Some(path) => archive_size(path),
            None => (0, SizeSource::Unknown),
        };
        let path = location.map_or(archive, |path| path.display().to_string());
        entries.push(ModuleEntry::new(name, size, source).with_path(path));
    }

    let entries = merge_entries(entries);
    info!(packages = entries.len(), "build log parsed");
    entries
}

/// One row per import path listed in the work directory's `importcfg` files.
///
/// ## Errors
///
/// Returns [`HeftError::Io`](crate::error::HeftError::Io) if `dir` itself
/// cannot be read. Unreadable entries below it, and archives that no longer
/// exist, are skipped with a warning.
pub fn scan_work_dir(dir: &Path, patterns: &Patterns) -> HeftResult<Vec<ModuleEntry>>
{
    fs::read_dir(dir)?;

    let mut archives: BTreeMap<String, PathBuf> = BTreeMap::new();
    for config in importcfg_files(dir) {
        let text = match fs::read_to_string(&config) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %config.display(), "skipping unreadable importcfg: {err}");
                continue;
            }
        };
        for line in text.lines() {
            if let Some(caps) = patterns.package_file.captures(line.trim_end()) {
                archives
                    .entry(caps[1].trim().to_string())
                    .or_insert_with(|| PathBuf::from(caps[2].trim()));
            }
        }
    }

    let mut entries = Vec::with_capacity(archives.len());
    for (package, archive) in archives {
        match fs::metadata(&archive) {
            Ok(metadata) => {
                entries.push(
                    ModuleEntry::new(package, metadata.len(), SizeSource::Archive)
                        .with_path(archive.display().to_string()),
                );
            }
            Err(err) => warn!(package = %package, path = %archive.display(), "skipping archive: {err}"),
        }
    }

    let entries = merge_entries(entries);
    info!(dir = %dir.display(), packages = entries.len(), "work directory scanned");
    Ok(entries)
}

fn importcfg_files(dir: &Path) -> Vec<PathBuf>
{
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(dir = %dir.display(), "skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| IMPORTCFG_NAMES.contains(&name))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn expand_work(archive: &str, work_dir: Option<&Path>) -> Option<PathBuf>
{
    match archive.strip_prefix(WORK_VARIABLE) {
        Some(rest) => {
            let work_dir = work_dir?;
            Some(work_dir.join(rest.trim_start_matches('/')))
        }
        None => Some(PathBuf::from(archive)),
    }
}

fn archive_size(path: &Path) -> (u64, SizeSource)
{
    match fs::metadata(path) {
        Ok(metadata) => (metadata.len(), SizeSource::Archive),
        Err(err) => {
            debug!(path = %path.display(), "archive not on disk: {err}");
            (0, SizeSource::Unknown)
        }
    }
}

/// Name of the build action directory holding `archive`, e.g. `b001`.
fn action_name(archive: &str) -> String
{
    Path::new(archive)
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or(archive)
        .to_string()
}
