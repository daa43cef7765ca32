//! Parallel selection and pairing for already-classified events.

use crate::accumulator::PairAccumulator;
use crate::analysis::EventOutcome;
use crate::statistics::RunStatistics;
use mmfactor_core::error::{Error, Result};
use mmfactor_core::particle::Event;
use mmfactor_core::selection::ParticleSelector;
use rayon::prelude::*;

/// Selects and pairs classified events in parallel.
///
/// `assigned` holds `(bin, centrality, event)` triples. Each rayon worker
/// fills a private copy of `template`; partial accumulators are then merged
/// bin by bin. The returned accumulator contains only this batch.
///
/// # Errors
/// Returns an error if partial accumulators cannot be merged.
pub fn accumulate_parallel(
    selector: &ParticleSelector,
    template: &PairAccumulator,
    assigned: &[(usize, f64, &Event)],
) -> Result<(PairAccumulator, RunStatistics)> {
    let empty = || (template.empty_like(), RunStatistics::default());

    assigned
        .par_iter()
        .try_fold(empty, |(mut acc, mut stats), &(bin, centrality, event)| {
            let triggers = selector.select_triggers(event);
            let associates = selector.select_associates(event);
            let pairs = acc.accumulate(bin, &triggers, &associates);
            stats.record(&EventOutcome::Accepted {
                bin,
                centrality,
                triggers: triggers.len(),
                associates: associates.len(),
                pairs,
            });
            Ok::<_, Error>((acc, stats))
        })
        .try_reduce(empty, |(mut acc, mut stats), (other_acc, other_stats)| {
            acc.merge(&other_acc)?;
            stats.merge(&other_stats);
            Ok((acc, stats))
        })
}
