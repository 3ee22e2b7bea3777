//! # Module Cache Discovery
//!
//! Finds the root of the local Go module cache the way the toolchain does:
//!
//! 1. `GOMODCACHE`, when set and non-empty
//! 2. the first entry of `GOPATH`, plus `pkg/mod`
//! 3. `$HOME/go/pkg/mod`
//!
//! The directory is not required to exist; callers treat a missing cache
//! as a degraded condition.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Module cache root from the process environment, if one can be derived.
pub fn locate_module_cache() -> Option<PathBuf>
{
    let root = module_cache_from(
        env::var_os("GOMODCACHE"),
        env::var_os("GOPATH"),
        env::var_os("HOME").map(PathBuf::from).as_deref(),
    );
    debug!(root = ?root, "module cache located");
    root
}

/// Module cache root from explicit `GOMODCACHE`, `GOPATH` and home values.
pub fn module_cache_from(gomodcache: Option<OsString>, gopath: Option<OsString>, home: Option<&Path>) -> Option<PathBuf>
{
    if let Some(cache) = gomodcache.filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(cache));
    }

    let first_gopath = gopath.and_then(|value| env::split_paths(&value).find(|entry| !entry.as_os_str().is_empty()));
    if let Some(gopath) = first_gopath {
        return Some(gopath.join("pkg").join("mod"));
    }

    home.map(|home| home.join("go").join("pkg").join("mod"))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_gomodcache_wins()
    {
        let root = module_cache_from(
            Some("/cache".into()),
            Some("/gopath".into()),
            Some(Path::new("/home/me")),
        );
        assert_eq!(root, Some(PathBuf::from("/cache")));
    }

    #[test]
    fn test_empty_gomodcache_is_ignored()
    {
        let root = module_cache_from(Some(OsString::new()), Some("/gopath".into()), None);
        assert_eq!(root, Some(PathBuf::from("/gopath/pkg/mod")));
    }

    #[cfg(unix)]
    #[test]
    fn test_first_gopath_entry()
    {
        let root = module_cache_from(None, Some("/first:/second".into()), None);
        assert_eq!(root, Some(PathBuf::from("/first/pkg/mod")));
    }

    #[test]
    fn test_home_fallback()
    {
        let root = module_cache_from(None, None, Some(Path::new("/home/me")));
        assert_eq!(root, Some(PathBuf::from("/home/me/go/pkg/mod")));
        assert_eq!(module_cache_from(None, None, None), None);
    }
}
