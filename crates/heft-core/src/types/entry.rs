//! Report rows and size rendering.

use std::fmt;

use serde::Serialize;

/// How the size of a report row was obtained.
///
/// A row at `0` bytes is ambiguous on its own: the package may genuinely
/// contribute nothing, or no size information may exist. The source tag keeps
/// the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeSource
{
    /// Summed from explicit symbol sizes in the container's symbol table.
    Symbols,
    /// Proportional estimate from symbol counts and file size. Never exact.
    Estimate,
    /// On-disk size of the module's source tree in the module cache.
    ModuleCache,
    /// On-disk size of a compiled package archive from a build work directory.
    Archive,
    /// No size information was available.
    Unknown,
}

impl SizeSource
{
    /// Whether this source is an approximation rather than a measurement.
    pub fn is_estimate(self) -> bool
    {
        matches!(self, SizeSource::Estimate)
    }
}

impl fmt::Display for SizeSource
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SizeSource::Symbols => "symbols",
            SizeSource::Estimate => "estimate",
            SizeSource::ModuleCache => "module-cache",
            SizeSource::Archive => "archive",
            SizeSource::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// One row of a size report.
///
/// `size_human` is derived from `size` and is recomputed by every mutation of
/// the size, so the two never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleEntry
{
    path: String,
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    version: String,
    size: u64,
    size_human: String,
    source: SizeSource,
}

impl ModuleEntry
{
    /// Create a row for `name` with the given size and provenance of that size.
    pub fn new(name: impl Into<String>, size: u64, source: SizeSource) -> Self
    {
        Self {
            path: String::new(),
            name: name.into(),
            version: String::new(),
            size,
            size_human: humanize_bytes(size),
            source,
        }
    }

    /// Set the on-disk or in-binary origin of the row.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self
    {
        self.path = path.into();
        self
    }

    /// Set the module version. `(devel)` is stored as unknown.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self
    {
        self.version = normalize_version(version.into());
        self
    }

    pub fn path(&self) -> &str
    {
        &self.path
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn version(&self) -> &str
    {
        &self.version
    }

    pub fn size(&self) -> u64
    {
        self.size
    }

    pub fn size_human(&self) -> &str
    {
        &self.size_human
    }

    pub fn source(&self) -> SizeSource
    {
        self.source
    }

    /// Replace the size and record where it came from.
    pub fn set_size(&mut self, size: u64, source: SizeSource)
    {
        self.size = size;
        self.source = source;
        self.size_human = humanize_bytes(size);
    }

    /// Add `bytes` to the row, keeping the existing source tag.
    pub fn add_size(&mut self, bytes: u64)
    {
        self.size = self.size.saturating_add(bytes);
        self.size_human = humanize_bytes(self.size);
    }

    pub(crate) fn set_path(&mut self, path: impl Into<String>)
    {
        self.path = path.into();
    }

    pub(crate) fn set_version(&mut self, version: impl Into<String>)
    {
        self.version = normalize_version(version.into());
    }
}

/// Version string the toolchain records for builds outside a module version.
pub const DEVEL_VERSION: &str = "(devel)";

fn normalize_version(version: String) -> String
{
    if version == DEVEL_VERSION {
        String::new()
    } else {
        version
    }
}

const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Render a byte count with SI units, e.g. `"1.5 kB"` or `"83 MB"`.
///
/// Values below 10 bytes are printed exactly. Larger values are rounded to one
/// decimal place, and the decimal is only shown while the scaled value is below 10.
pub fn humanize_bytes(size: u64) -> String
{
    if size < 10 {
        return format!("{size} B");
    }

    let mut exponent = 0usize;
    let mut scaled = size;
    while scaled >= 1000 && exponent < UNITS.len() - 1 {
        scaled /= 1000;
        exponent += 1;
    }

    let divisor = 1000f64.powi(exponent as i32);
    let value = ((size as f64 / divisor) * 10.0 + 0.5).floor() / 10.0;
    let unit = UNITS[exponent];
    if value < 10.0 {
        format!("{value:.1} {unit}")
    } else {
        format!("{value:.0} {unit}")
    }
}
