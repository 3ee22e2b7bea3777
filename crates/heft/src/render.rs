//! Report output: an aligned text table or a JSON array.

use std::io::{self, Write};

use heft_core::types::ModuleEntry;

const ESTIMATE_NOTE: &str =
    "note: the binary records no symbol sizes; sizes are proportional estimates from symbol counts";

/// One `{size:>8} {name}` line per entry, plus a note when sizes are estimated.
///
/// ## Errors
///
/// Returns any error from writing to `out`.
pub fn render_text(entries: &[ModuleEntry], estimated: bool, out: &mut impl Write) -> io::Result<()>
{
    for entry in entries {
        writeln!(out, "{:>8} {}", entry.size_human(), entry.name())?;
    }
    if estimated {
        writeln!(out)?;
        writeln!(out, "{ESTIMATE_NOTE}")?;
    }
    Ok(())
}

/// All entries as one JSON array.
///
/// ## Errors
///
/// Returns an error if serialization or writing fails.
pub fn render_json(entries: &[ModuleEntry], out: &mut impl Write) -> serde_json::Result<()>
{
    serde_json::to_writer(&mut *out, entries)?;
    writeln!(out).map_err(serde_json::Error::io)
}
