//! Mach-O symbol reader.

use object::{FileKind, Object};
use tracing::debug;

use super::{collect_exports, collect_sections, collect_symbols, ContainerParser};
use crate::types::{ContainerFormat, SymbolTable};

/// Reads the `LC_SYMTAB` table, falling back to the export trie.
///
/// Mach-O records no symbol sizes, so every symbol carries `size = 0`.
/// Fat (universal) binaries are not unpacked.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachOParser;

impl ContainerParser for MachOParser
{
    fn format(&self) -> ContainerFormat
    {
        ContainerFormat::MachO
    }

    fn recognizes(&self, kind: FileKind) -> bool
    {
        matches!(kind, FileKind::MachO32 | FileKind::MachO64)
    }

    fn parse(&self, data: &[u8]) -> object::Result<SymbolTable>
    {
        let file = object::File::parse(data)?;

        let mut table = SymbolTable::new(ContainerFormat::MachO);
        table.sections = collect_sections(&file);
        table.symbols = collect_symbols(&file, file.symbols(), strip_c_prefix);
        if table.symbols.is_empty() {
            debug!("Mach-O symbol table empty, reading exports");
            table.symbols = collect_exports(&file, strip_c_prefix);
        }
        Ok(table)
    }
}

/// Mach-O prefixes every C-level symbol with one underscore.
fn strip_c_prefix(name: &str) -> &str
{
    name.strip_prefix('_').unwrap_or(name)
}
