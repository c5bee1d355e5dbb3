//! Generate → static filter → probe → dynamic filter

use crate::combination::generate;
use crate::filter::{prune_redundant, static_filter};
use crate::flag::Vocabulary;
use crate::probe::{run_probes, RuntimeProber};
use crate::results::ResultMap;

/// Final mapping plus how many combinations each stage saw
#[derive(Debug, Clone)]
pub struct Discovery {
    pub results: ResultMap,
    pub generated: usize,
    pub probed: usize,
    pub succeeded: usize,
}

impl Discovery {
    /// Edges left for the report
    pub fn reported(&self) -> usize {
        self.results.len()
    }
}

/// Discover which collectors every informative flag combination selects
pub fn discover<P>(vocabulary: &Vocabulary, prober: &mut P) -> Discovery
where
    P: RuntimeProber + ?Sized,
{
    let combinations = generate(vocabulary);
    let generated = combinations.len();

    let candidates = static_filter(combinations);
    tracing::debug!(
        generated,
        candidates = candidates.len(),
        "static filter applied"
    );

    let run = run_probes(prober, &candidates);
    let observed = run.results();
    let results = prune_redundant(&observed);
    tracing::debug!(
        observed = observed.len(),
        reported = results.len(),
        "dynamic filter applied"
    );

    Discovery {
        results,
        generated,
        probed: candidates.len(),
        succeeded: run.succeeded(),
    }
}
