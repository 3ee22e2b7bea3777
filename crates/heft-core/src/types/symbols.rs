//! Raw symbol and section records read from a container.

use std::fmt;

/// Executable container layouts the symbol reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat
{
    /// Executable and Linkable Format (Linux, BSDs).
    Elf,
    /// Mach object file (macOS, iOS).
    MachO,
    /// Portable Executable / COFF (Windows).
    Pe,
}

impl fmt::Display for ContainerFormat
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            ContainerFormat::Elf => "ELF",
            ContainerFormat::MachO => "Mach-O",
            ContainerFormat::Pe => "PE",
        };
        write!(f, "{label}")
    }
}

/// A symbol table record.
///
/// Created per parse and consumed by the size reconciler; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol
{
    /// Name exactly as stored in the container.
    pub name: String,
    /// Byte size, or `0` when the format does not record one.
    pub size: u64,
    /// Load address or offset. Advisory only.
    pub address: u64,
    /// Owning package, `None` while unresolved.
    pub package: Option<String>,
    /// Name of the section holding the symbol, when known.
    pub section: Option<String>,
}

impl Symbol
{
    pub fn new(name: impl Into<String>, size: u64, address: u64) -> Self
    {
        Self {
            name: name.into(),
            size,
            address,
            package: None,
            section: None,
        }
    }

    #[must_use]
    pub fn in_section(mut self, section: impl Into<String>) -> Self
    {
        self.section = Some(section.into());
        self
    }

    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self
    {
        self.package = Some(package.into());
        self
    }
}

/// Descriptive record of an addressable region. Diagnostic context only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section
{
    pub name: String,
    pub size: u64,
    pub kind: String,
}

/// Everything the symbol reader extracted from one container.
#[derive(Debug, Clone)]
pub struct SymbolTable
{
    pub format: ContainerFormat,
    pub symbols: Vec<Symbol>,
    pub sections: Vec<Section>,
}

impl SymbolTable
{
    pub fn new(format: ContainerFormat) -> Self
    {
        Self {
            format,
            symbols: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool
    {
        self.symbols.is_empty()
    }

    /// Symbols whose owning package was resolved.
    pub fn resolved(&self) -> impl Iterator<Item = &Symbol>
    {
        self.symbols.iter().filter(|symbol| symbol.package.is_some())
    }
}
