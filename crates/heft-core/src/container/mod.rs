//! # Container Detection and Symbol Reading
//!
//! Interprets a binary as one of the supported executable containers and
//! extracts its symbols and sections.
//!
//! Each format is a [`ContainerParser`]. Detection tries them in a fixed
//! priority order (ELF, Mach-O, PE) against the same in-memory bytes; every
//! trial gets its own read view, so a failed trial leaves nothing behind for
//! the next one. The first parser that accepts the file is used and no other
//! format is consulted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use heft_core::container::read_symbol_table;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let path = Path::new("/path/to/binary");
//!     let data = std::fs::read(path)?;
//!     let table = read_symbol_table(&data, path)?;
//!     println!("{} symbols in a {} container", table.symbols.len(), table.format);
//!     Ok(())
//! }
//! ```
//!
//! ## Edge policy
//!
//! - Symbols without an explicit size carry `size = 0`; estimating a
//!   substitute is the reconciler's job.
//! - Symbols whose section index does not name a section of the container are
//!   dropped. Undefined, absolute and common symbols occupy no section of
//!   their own and are dropped as well.
//! - An empty symbol table is a successful, empty result.

mod elf;
mod macho;
mod pe;

use std::path::Path;

use object::{FileKind, Object, ObjectSection, ObjectSymbol, SymbolSection};
use tracing::debug;

pub use self::elf::ElfParser;
pub use self::macho::MachOParser;
pub use self::pe::PeParser;
use crate::error::{HeftError, HeftResult};
use crate::types::{ContainerFormat, Section, Symbol, SymbolTable};

/// One supported container format.
pub trait ContainerParser
{
    /// Format produced by this parser.
    fn format(&self) -> ContainerFormat;

    /// Whether the file's magic identifies this format.
    fn recognizes(&self, kind: FileKind) -> bool;

    /// Extract symbols and sections.
    ///
    /// ## Errors
    ///
    /// Returns the parse error when the headers match but the container is
    /// malformed; detection then moves on to the next format.
    fn parse(&self, data: &[u8]) -> object::Result<SymbolTable>;
}

/// Parsers in detection priority order.
pub fn parsers() -> [&'static dyn ContainerParser; 3]
{
    [&ElfParser, &MachOParser, &PeParser]
}

/// Detect the container format of `data` and read its symbol table.
///
/// `path` is only used for diagnostics.
///
/// ## Errors
///
/// Returns [`HeftError::UnrecognizedContainerFormat`] if no parser accepts the file.
pub fn read_symbol_table(data: &[u8], path: &Path) -> HeftResult<SymbolTable>
{
    let kind = match FileKind::parse(data) {
        Ok(kind) => kind,
        Err(err) => {
            debug!(path = %path.display(), "no container magic: {err}");
            return Err(HeftError::UnrecognizedContainerFormat { path: path.to_path_buf() });
        }
    };

    for parser in parsers() {
        if !parser.recognizes(kind) {
            continue;
        }
        match parser.parse(data) {
            Ok(table) => {
                debug!(
                    format = %table.format,
                    symbols = table.symbols.len(),
                    sections = table.sections.len(),
                    "container recognized"
                );
                return Ok(table);
            }
            Err(err) => debug!(format = %parser.format(), "container trial failed: {err}"),
        }
    }

    Err(HeftError::UnrecognizedContainerFormat { path: path.to_path_buf() })
}

/// Symbols from a symbol table iterator, keeping those placed in a real section.
pub(crate) fn collect_symbols<'data, S>(
    file: &object::File<'data>,
    symbols: impl Iterator<Item = S>,
    naming: fn(&str) -> &str,
) -> Vec<Symbol>
where
    S: ObjectSymbol<'data>,
{
    symbols
        .filter_map(|symbol| {
            let SymbolSection::Section(index) = symbol.section() else {
                return None;
            };
            let section = file.section_by_index(index).ok()?;
            let name = naming(symbol.name().ok()?);
            if name.is_empty() {
                return None;
            }
            let section_name = section.name().unwrap_or_default();
            Some(Symbol::new(name, symbol.size(), symbol.address()).in_section(section_name))
        })
        .collect()
}

/// Exported names, used when a format's symbol table is empty. Exports carry no size.
pub(crate) fn collect_exports(file: &object::File<'_>, naming: fn(&str) -> &str) -> Vec<Symbol>
{
    let exports = match file.exports() {
        Ok(exports) => exports,
        Err(err) => {
            debug!("export table unreadable: {err}");
            return Vec::new();
        }
    };

    exports
        .iter()
        .filter_map(|export| {
            let name = naming(std::str::from_utf8(export.name()).ok()?);
            (!name.is_empty()).then(|| Symbol::new(name, 0, export.address()))
        })
        .collect()
}

pub(crate) fn collect_sections(file: &object::File<'_>) -> Vec<Section>
{
    file.sections()
        .map(|section| Section {
            name: section.name().unwrap_or_default().to_string(),
            size: section.size(),
            kind: format!("{:?}", section.kind()),
        })
        .collect()
}

fn unchanged(name: &str) -> &str
{
    name
}
