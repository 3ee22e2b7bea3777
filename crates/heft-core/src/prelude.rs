//! Common module for library exports

pub use crate::analyzer::Analyzer;
pub use crate::config::{AnalyzerConfig, Patterns};
pub use crate::error::{HeftError, HeftResult};
pub use crate::reconcile::{Attribution, Outcome, ReconcileInput, Reconciler, SizeStrategy};
pub use crate::report::{merge_entries, rollup, sort_entries, top_level_package, Report};
pub use crate::resolver::{resolve_package, PackageResolver};
pub use crate::types::{Advisory, BuildInfo, ContainerFormat, ModuleEntry, ModuleVersion, SizeSource, Symbol, SymbolTable};
