//! Value types shared across the pipeline.

pub mod advisory;
pub mod entry;
pub mod provenance;
pub mod symbols;

pub use advisory::Advisory;
pub use entry::{humanize_bytes, ModuleEntry, SizeSource, DEVEL_VERSION};
pub use provenance::{BuildInfo, ModuleVersion};
pub use symbols::{ContainerFormat, Section, Symbol, SymbolTable};
