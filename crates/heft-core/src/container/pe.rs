//! PE/COFF symbol reader.

use object::{FileKind, Object};
use tracing::debug;

use super::{collect_exports, collect_sections, collect_symbols, unchanged, ContainerParser};
use crate::types::{ContainerFormat, SymbolTable};

/// Reads the COFF symbol table, falling back to the export directory.
///
/// Plain COFF objects (no `MZ` stub) are accepted as well. COFF symbols record
/// no sizes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeParser;

impl ContainerParser for PeParser
{
    fn format(&self) -> ContainerFormat
    {
        ContainerFormat::Pe
    }

    fn recognizes(&self, kind: FileKind) -> bool
    {
        matches!(kind, FileKind::Pe32 | FileKind::Pe64 | FileKind::Coff | FileKind::CoffBig)
    }

    fn parse(&self, data: &[u8]) -> object::Result<SymbolTable>
    {
        let file = object::File::parse(data)?;

        let mut table = SymbolTable::new(ContainerFormat::Pe);
        table.sections = collect_sections(&file);
        table.symbols = collect_symbols(&file, file.symbols(), unchanged);
        if table.symbols.is_empty() {
            debug!("COFF symbol table empty, reading exports");
            table.symbols = collect_exports(&file, unchanged);
        }
        Ok(table)
    }
}
