//! ELF symbol reader.

use object::{FileKind, Object};
use tracing::debug;

use super::{collect_sections, collect_symbols, unchanged, ContainerParser};
use crate::types::{ContainerFormat, SymbolTable};

/// Reads `.symtab`, falling back to `.dynsym` when the static table is empty
/// (stripped binaries keep only their dynamic symbols).
#[derive(Debug, Clone, Copy, Default)]
pub struct ElfParser;

impl ContainerParser for ElfParser
{
    fn format(&self) -> ContainerFormat
    {
        ContainerFormat::Elf
    }

    fn recognizes(&self, kind: FileKind) -> bool
    {
        matches!(kind, FileKind::Elf32 | FileKind::Elf64)
    }

    fn parse(&self, data: &[u8]) -> object::Result<SymbolTable>
    {
        let file = object::File::parse(data)?;

        let mut table = SymbolTable::new(ContainerFormat::Elf);
        table.sections = collect_sections(&file);
        table.symbols = collect_symbols(&file, file.symbols(), unchanged);
        if table.symbols.is_empty() {
            debug!("ELF static symbol table empty, reading dynamic symbols");
            table.symbols = collect_symbols(&file, file.dynamic_symbols(), unchanged);
        }
        Ok(table)
    }
}
