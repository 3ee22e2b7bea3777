//! Build provenance embedded by the toolchain at link time.

use super::entry::DEVEL_VERSION;

/// A module identity with its version, as recorded in build info.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleVersion
{
    /// Module path, e.g. `github.com/acme/foo`.
    pub path: String,
    /// Module version, `""` or `(devel)` for local builds.
    pub version: String,
    /// Checksum from the module graph, when recorded.
    pub sum: String,
    /// Replacement directive applied to this module, if any.
    pub replace: Option<Box<ModuleVersion>>,
}

impl ModuleVersion
{
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self
    {
        Self {
            path: path.into(),
            version: version.into(),
            sum: String::new(),
            replace: None,
        }
    }

    /// Whether the version identifies a published module release.
    pub fn has_release_version(&self) -> bool
    {
        !self.version.is_empty() && self.version != DEVEL_VERSION
    }

    /// `(path, version)` under which the module's source sits in the module cache.
    ///
    /// A versioned replacement is looked up under the replacement; a local
    /// directory replacement, a development build, or an unversioned module
    /// has no stable cache key.
    pub fn cache_key(&self) -> Option<(&str, &str)>
    {
        let effective = match &self.replace {
            Some(replacement) => replacement.as_ref(),
            None => self,
        };
        if effective.has_release_version() {
            Some((effective.path.as_str(), effective.version.as_str()))
        } else {
            None
        }
    }
}

/// Provenance record read once per analysis.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildInfo
{
    /// Toolchain version, e.g. `go1.22.1`.
    pub go_version: String,
    /// Import path of the main package.
    pub path: String,
    /// Main module, absent for binaries built outside module mode.
    pub main: Option<ModuleVersion>,
    /// Dependency modules. Order is as recorded; uniqueness is not guaranteed.
    pub deps: Vec<ModuleVersion>,
    /// `build` key/value settings (compiler flags, VCS revision, ...).
    pub settings: Vec<(String, String)>,
}

impl BuildInfo
{
    /// Main module followed by every dependency.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleVersion>
    {
        self.main.iter().chain(self.deps.iter())
    }

    pub fn setting(&self, key: &str) -> Option<&str>
    {
        self.settings
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}
