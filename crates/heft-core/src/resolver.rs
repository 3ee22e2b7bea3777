//! # Package Name Resolution
//!
//! Maps a linked symbol name back to the package that defined it.
//!
//! Go symbol names are the defining package's import path followed by a dot
//! and the in-package name: `runtime.newobject`, `main.run`,
//! `github.com/acme/foo.(*Client).Do`. The linker escapes dots in the last
//! element of an import path (`gopkg.in/yaml%2ev3.Marshal`), so the package is
//! everything up to the first dot following the last slash.
//!
//! ## Heuristic
//!
//! This is a naming heuristic, not a verified mapping. It prefers leaving a
//! symbol unresolved over attributing it to the wrong package: single-element
//! standard library packages such as `fmt` are not recognized, nor are type
//! descriptors (`type:*foo.T`) or linker-synthesized names. Unresolved symbols
//! are dropped from attribution by the caller.
//!
//! ## Algorithm
//!
//! 1. The first `.`-delimited segment is returned as-is when it is a reserved
//!    identifier (`runtime`, `main`, `go` by default).
//! 2. Otherwise, if the import-path head of the name (up to the first `.` after
//!    the last `/`) contains a `/` or an internal `.`, the dot-delimited
//!    prefixes of the full name are tried from most to least specific. The
//!    first one that is a well-formed import path, or a reserved identifier, wins.
//! 3. Otherwise the symbol is unresolved.
//!
//! [`PackageResolver::package_of`] also undoes the linker's `%xx` escapes, so
//! the identity matches the module path recorded in build info.

use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::config::DEFAULT_RESERVED_PACKAGES;

/// Resolves symbol names to package identities.
///
/// Resolution is pure: the same name always yields the same answer.
#[derive(Debug, Clone)]
pub struct PackageResolver
{
    reserved: BTreeSet<String>,
}

impl Default for PackageResolver
{
    fn default() -> Self
    {
        Self::new(DEFAULT_RESERVED_PACKAGES.iter().map(|name| (*name).to_string()))
    }
}

impl PackageResolver
{
    pub fn new(reserved: impl IntoIterator<Item = String>) -> Self
    {
        Self {
            reserved: reserved.into_iter().collect(),
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool
    {
        self.reserved.contains(name)
    }

    /// Resolve `symbol` to its owning package, or `None` if no prefix qualifies.
    ///
    /// The returned identity always borrows a prefix of `symbol`.
    ///
    /// ```rust
    /// use heft_core::resolver::PackageResolver;
    ///
    /// let resolver = PackageResolver::default();
    /// assert_eq!(resolver.resolve("runtime.newobject"), Some("runtime"));
    /// assert_eq!(resolver.resolve("github.com/acme/foo.Bar"), Some("github.com/acme/foo"));
    /// assert_eq!(resolver.resolve("tmp42"), None);
    /// ```
    pub fn resolve<'a>(&self, symbol: &'a str) -> Option<&'a str>
    {
        let (first, _) = symbol.split_once('.')?;
        if first.is_empty() {
            return None;
        }
        if self.is_reserved(first) {
            return Some(first);
        }

        let head = import_path_head(symbol);
        if !head.contains(['/', '.']) {
            return None;
        }

        // Most specific first; the full name itself is never a package.
        let mut end = symbol.len();
        while let Some(dot) = symbol[..end].rfind('.') {
            let candidate = &symbol[..dot];
            if looks_like_import_path(candidate) || self.is_reserved(candidate) {
                return Some(candidate);
            }
            end = dot;
        }
        None
    }

    /// Owned package identity of `symbol`, with linker escapes decoded.
    ///
    /// ```rust
    /// use heft_core::resolver::PackageResolver;
    ///
    /// let resolver = PackageResolver::default();
    /// assert_eq!(resolver.package_of("gopkg.in/yaml%2ev3.Marshal").as_deref(), Some("gopkg.in/yaml.v3"));
    /// ```
    pub fn package_of(&self, symbol: &str) -> Option<String>
    {
        self.resolve(symbol).map(|package| unescape_import_path(package).into_owned())
    }
}

/// Decode `%xx` escapes in a linker-mangled import path.
///
/// A `%` not followed by two hex digits is kept as-is.
pub fn unescape_import_path(path: &str) -> Cow<'_, str>
{
    if !path.contains('%') {
        return Cow::Borrowed(path);
    }

    let bytes = path.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            if let Some(byte) = bytes.get(index + 1..index + 3).and_then(decode_hex_pair) {
                decoded.push(byte);
                index += 3;
                continue;
            }
        }
        decoded.push(bytes[index]);
        index += 1;
    }
    Cow::Owned(String::from_utf8_lossy(&decoded).into_owned())
}

fn decode_hex_pair(pair: &[u8]) -> Option<u8>
{
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u8::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok()
}

/// Resolve with the default reserved identifiers.
pub fn resolve_package(symbol: &str) -> Option<&str>
{
    PackageResolver::default().resolve(symbol)
}

/// Text up to the first `.` that follows the last `/`.
fn import_path_head(symbol: &str) -> &str
{
    let last_slash = symbol.rfind('/').map_or(0, |index| index + 1);
    match symbol[last_slash..].find('.') {
        Some(dot) => &symbol[..last_slash + dot],
        None => symbol,
    }
}

/// A slash-delimited path of import-path characters whose last element holds no dot.
fn looks_like_import_path(candidate: &str) -> bool
{
    let Some((_, last)) = candidate.rsplit_once('/') else {
        return false;
    };
    !last.is_empty()
        && !last.contains('.')
        && !candidate.starts_with('/')
        && candidate.split('/').all(|element| !element.is_empty())
        && candidate.chars().all(is_import_path_char)
}

fn is_import_path_char(character: char) -> bool
{
    character.is_ascii_alphanumeric() || matches!(character, '/' | '.' | '-' | '_' | '~' | '%' | '+')
}
