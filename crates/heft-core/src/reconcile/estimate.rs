use std::collections::BTreeMap;

use tracing::warn;

use super::{Outcome, ReconcileInput, SizeStrategy};
use crate::types::{Advisory, SizeSource, Symbol};

/// Splits `file_size * code_fraction` across packages by resolved symbol count.
///
/// Used when the container records no symbol sizes at all. The result is
/// never exact and is tagged [`SizeSource::Estimate`].
#[derive(Debug, Clone, Copy)]
pub struct ProportionalEstimate
{
    code_fraction: f64,
}

impl ProportionalEstimate
{
    pub fn new(code_fraction: f64) -> Self
    {
        Self { code_fraction }
    }
}

impl SizeStrategy for ProportionalEstimate
{
    fn source(&self) -> SizeSource
    {
        SizeSource::Estimate
    }

    fn attempt(&self, input: &ReconcileInput<'_>, advisories: &mut Vec<Advisory>) -> Outcome
    {
        let counts = symbol_counts(input.symbols);
        if counts.is_empty() {
            return Outcome::Insufficient;
        }

        let sizes = proportional_estimate(&counts, input.file_size, self.code_fraction);
        if sizes.values().all(|size| *size == 0) {
            return Outcome::Insufficient;
        }

        warn!(
            code_fraction = self.code_fraction,
            file_size = input.file_size,
            "symbol sizes unavailable, estimating from symbol counts"
        );
        advisories.push(Advisory::EstimatedSizes {
            code_fraction: self.code_fraction,
        });
        Outcome::Sized(sizes)
    }
}

/// Number of resolved symbols per package.
pub fn symbol_counts<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> BTreeMap<String, u64>
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for package in symbols.into_iter().filter_map(|symbol| symbol.package.as_ref()) {
        *counts.entry(package.clone()).or_default() += 1;
    }
    counts
}

/// Each package's share of `round(file_size * code_fraction)`, proportional to its count.
///
/// Shares are floored, so their sum may fall short of the budget by less than
/// one byte per package.
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// use heft_core::reconcile::proportional_estimate;
///
/// let counts = BTreeMap::from([("A".to_string(), 2), ("B".to_string(), 8)]);
/// let sizes = proportional_estimate(&counts, 1000, 0.7);
/// assert_eq!(sizes["A"], 140);
/// assert_eq!(sizes["B"], 560);
/// ```
pub fn proportional_estimate(counts: &BTreeMap<String, u64>, file_size: u64, code_fraction: f64) -> BTreeMap<String, u64>
{
    let total: u128 = counts.values().map(|count| u128::from(*count)).sum();
    if total == 0 {
        return BTreeMap::new();
    }

    let budget = u128::from((file_size as f64 * code_fraction).round() as u64);
    counts
        .iter()
        .map(|(package, count)| {
            let share = u128::from(*count) * budget / total;
            (package.clone(), u64::try_from(share).unwrap_or(u64::MAX))
        })
        .collect()
}
