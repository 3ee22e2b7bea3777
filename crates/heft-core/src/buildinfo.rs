//! # Build Info Loading
//!
//! Reads the provenance record the Go linker embeds in every module-aware
//! binary: the toolchain version, the main module, and each dependency module
//! with its version.
//!
//! ## Layout
//!
//! The record starts with a 32-byte header at a 16-byte aligned offset:
//!
//! | bytes   | meaning                                    |
//! |---------|--------------------------------------------|
//! | 0..14   | magic `\xff Go buildinf:`                  |
//! | 14      | pointer size (4 or 8)                      |
//! | 15      | flags: `0x1` big endian, `0x2` inline data |
//! | 16..32  | legacy pointers, or padding                |
//!
//! With the inline flag the version and module-info strings follow the header,
//! each prefixed by an unsigned LEB128 length. Older toolchains store two
//! pointers to string headers in virtual memory instead; those are resolved
//! through the container's section address ranges.
//!
//! The header is looked for in the dedicated section (`.go.buildinfo`,
//! `__go_buildinfo`) first, then in every section, then in the raw file.

use std::fs;
use std::path::Path;

use object::{Object, ObjectSection};
use tracing::debug;

use crate::config::Patterns;
use crate::error::{HeftError, HeftResult};
use crate::types::{BuildInfo, ModuleVersion};

/// First bytes of the build-info header.
pub const BUILD_INFO_MAGIC: &[u8; 14] = b"\xff Go buildinf:";

const HEADER_SIZE: usize = 32;
const HEADER_ALIGN: usize = 16;
const FLAG_BIG_ENDIAN: u8 = 0x1;
const FLAG_INLINE: u8 = 0x2;
const SENTINEL_LEN: usize = 16;
const MAX_STRING_LEN: u64 = 1 << 32;
const SECTION_NAMES: [&str; 2] = [".go.buildinfo", "__go_buildinfo"];

/// Read the build info of the binary at `path`.
///
/// ## Errors
///
/// - [`HeftError::OpenBinary`] if the file cannot be read.
/// - [`HeftError::MissingBuildInfo`] if no valid build-info record is found.
pub fn load_provenance(path: &Path, patterns: &Patterns) -> HeftResult<BuildInfo>
{
    let data = fs::read(path).map_err(|source| HeftError::OpenBinary {
        path: path.to_path_buf(),
        source,
    })?;
    read_build_info(&data, path, patterns)
}

/// Decode build info from the bytes of a binary. `path` is used for diagnostics.
///
/// ## Errors
///
/// Returns [`HeftError::MissingBuildInfo`] if no valid build-info record is found.
pub fn read_build_info(data: &[u8], path: &Path, patterns: &Patterns) -> HeftResult<BuildInfo>
{
    let (version, module_info) = locate_strings(data).map_err(|reason| HeftError::MissingBuildInfo {
        path: path.to_path_buf(),
        reason,
    })?;

    if version.is_empty() {
        return Err(HeftError::MissingBuildInfo {
            path: path.to_path_buf(),
            reason: "empty toolchain version".to_string(),
        });
    }

    let mut info = parse_module_info(strip_sentinels(&module_info), patterns);
    info.go_version = version;
    debug!(
        go_version = %info.go_version,
        main = info.main.as_ref().map_or("", |module| module.path.as_str()),
        deps = info.deps.len(),
        "build info decoded"
    );
    Ok(info)
}

/// Parse the text form of module info (`path`, `mod`, `dep`, `=>`, `build` lines).
///
/// Unknown or malformed lines are ignored. A `=>` line replaces the module of
/// the immediately preceding `mod` or `dep` line.
pub fn parse_module_info(text: &str, patterns: &Patterns) -> BuildInfo
{
    #[derive(Clone, Copy)]
    enum Last
    {
        Main,
        Dep,
    }

    let mut info = BuildInfo::default();
    let mut last = None;

    for line in text.lines() {
        if let Some(path) = line.strip_prefix("path\t") {
            info.path = path.to_string();
            continue;
        }
        if let Some(setting) = line.strip_prefix("build\t") {
            if let Some((key, value)) = setting.split_once('=') {
                info.settings.push((key.to_string(), unquote(value)));
            }
            continue;
        }

        let Some(caps) = patterns.module_line.captures(line) else {
            continue;
        };
        let module = ModuleVersion {
            path: caps[2].to_string(),
            version: caps[3].to_string(),
            sum: caps.get(4).map_or_else(String::new, |sum| sum.as_str().to_string()),
            replace: None,
        };

        match &caps[1] {
            "mod" => {
                info.main = Some(module);
                last = Some(Last::Main);
            }
            "dep" => {
                info.deps.push(module);
                last = Some(Last::Dep);
            }
            _ => {
                let target = match last.take() {
                    Some(Last::Main) => info.main.as_mut(),
                    Some(Last::Dep) => info.deps.last_mut(),
                    None => None,
                };
                match target {
                    Some(target) => target.replace = Some(Box::new(module)),
                    None => debug!(line, "replacement without a preceding module"),
                }
            }
        }
    }

    info
}

fn unquote(value: &str) -> String
{
    match value.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// Module info is framed by 16-byte sentinels; anything else is treated as absent.
fn strip_sentinels(module_info: &str) -> &str
{
    let bytes = module_info.as_bytes();
    let len = bytes.len();
    if len > 2 * SENTINEL_LEN && bytes[len - SENTINEL_LEN - 1] == b'\n' {
        module_info.get(SENTINEL_LEN..len - SENTINEL_LEN).unwrap_or("")
    } else {
        ""
    }
}

fn locate_strings(data: &[u8]) -> Result<(String, String), String>
{
    let Ok(file) = object::File::parse(data) else {
        debug!("no container parsed, scanning raw bytes for build info");
        let header = find_header(data).ok_or("build-info magic not found")?;
        return decode_header(header, None);
    };

    let memory = SectionMemory::new(&file);
    let named = SECTION_NAMES.iter().filter_map(|name| file.section_by_name(name));
    for section in named.chain(file.sections()) {
        let Ok(region) = section.data() else {
            continue;
        };
        if let Some(header) = find_header(region) {
            return decode_header(header, Some(&memory));
        }
    }

    Err("build-info magic not found in any section".to_string())
}

/// Slice starting at the first 16-byte aligned, complete header in `region`.
fn find_header(region: &[u8]) -> Option<&[u8]>
{
    let mut offset = 0;
    while offset < region.len() {
        let index = region[offset..]
            .windows(BUILD_INFO_MAGIC.len())
            .position(|window| window == BUILD_INFO_MAGIC)?;
        let at = offset + index;
        if at % HEADER_ALIGN == 0 {
            return (region.len() - at >= HEADER_SIZE).then(|| &region[at..]);
        }
        offset = (at + HEADER_ALIGN - 1) & !(HEADER_ALIGN - 1);
    }
    None
}

fn decode_header(header: &[u8], memory: Option<&SectionMemory<'_>>) -> Result<(String, String), String>
{
    let pointer_size = usize::from(header[14]);
    let flags = header[15];

    if flags & FLAG_INLINE != 0 {
        let (version, rest) = read_varint_string(&header[HEADER_SIZE..]).ok_or("truncated version string")?;
        let (module_info, _) = read_varint_string(rest).ok_or("truncated module info")?;
        return Ok((version, module_info));
    }

    if pointer_size != 4 && pointer_size != 8 {
        return Err(format!("unsupported pointer size {pointer_size}"));
    }
    let memory = memory.ok_or("legacy build info needs section addresses")?;
    let big_endian = flags & FLAG_BIG_ENDIAN != 0;
    let word = Word {
        size: pointer_size,
        big_endian,
    };

    let version_addr = word.read(&header[16..]).ok_or("truncated header")?;
    let module_addr = word.read(&header[16 + pointer_size..]).ok_or("truncated header")?;
    let version = memory.read_string(version_addr, word).ok_or("unreadable version string")?;
    let module_info = memory.read_string(module_addr, word).unwrap_or_default();
    Ok((version, module_info))
}

fn read_varint_string(bytes: &[u8]) -> Option<(String, &[u8])>
{
    let (len, consumed) = read_uvarint(bytes)?;
    let len = usize::try_from(len).ok()?;
    let rest = bytes.get(consumed..)?;
    let text = rest.get(..len)?;
    Some((String::from_utf8_lossy(text).into_owned(), &rest[len..]))
}

/// Unsigned LEB128, at most ten bytes. Returns the value and bytes consumed.
fn read_uvarint(bytes: &[u8]) -> Option<(u64, usize)>
{
    let mut value = 0u64;
    let mut shift = 0u32;
    for (index, byte) in bytes.iter().enumerate().take(10) {
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Some((value, index + 1));
        }
        shift += 7;
    }
    None
}

#[derive(Clone, Copy)]
struct Word
{
    size: usize,
    big_endian: bool,
}

impl Word
{
    fn read(self, bytes: &[u8]) -> Option<u64>
    {
        let bytes = bytes.get(..self.size)?;
        Some(match (self.size, self.big_endian) {
            (4, false) => u64::from(u32::from_le_bytes(bytes.try_into().ok()?)),
            (4, true) => u64::from(u32::from_be_bytes(bytes.try_into().ok()?)),
            (_, false) => u64::from_le_bytes(bytes.try_into().ok()?),
            (_, true) => u64::from_be_bytes(bytes.try_into().ok()?),
        })
    }
}

/// Virtual address view over the loaded, file-backed sections of a container.
struct SectionMemory<'data>
{
    regions: Vec<(u64, &'data [u8])>,
}

impl<'data> SectionMemory<'data>
{
    fn new(file: &object::File<'data>) -> Self
    {
        let regions = file
            .sections()
            .filter_map(|section| {
                let data = section.data().ok()?;
                (section.address() != 0 && !data.is_empty()).then(|| (section.address(), data))
            })
            .collect();
        Self { regions }
    }

    fn read(&self, address: u64, len: u64) -> Option<&'data [u8]>
    {
        self.regions.iter().find_map(|(start, data)| {
            let offset = address.checked_sub(*start)?;
            let offset = usize::try_from(offset).ok()?;
            let len = usize::try_from(len).ok()?;
            data.get(offset..offset.checked_add(len)?)
        })
    }

    /// Read a `(data pointer, length)` string header and the bytes it names.
    fn read_string(&self, address: u64, word: Word) -> Option<String>
    {
        let header = self.read(address, 2 * word.size as u64)?;
        let data_addr = word.read(header)?;
        let len = word.read(&header[word.size..])?;
        if len > MAX_STRING_LEN {
            return None;
        }
        let bytes = self.read(data_addr, len)?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }
}
