//! Combination filtering
//!
//! Two passes remove combinations that carry no information:
//! - Static: before probing, drop all-negative combinations and pairs that
//!   enable and disable the same switch.
//! - Dynamic: after probing, drop pairs whose negative flag made no observable
//!   difference compared to the positive flag alone.

use crate::combination::Combination;
use crate::results::ResultMap;

/// True when every flag in the combination disables a switch
pub fn is_all_negative(combination: &Combination) -> bool {
    combination.flags().iter().all(|flag| flag.is_negative())
}

/// True for a pair that both enables and disables the same switch
pub fn is_self_contradictory(combination: &Combination) -> bool {
    match combination.flags() {
        [first, second] => {
            first.switch() == second.switch() && first.polarity() != second.polarity()
        }
        _ => false,
    }
}

/// Drop combinations not worth probing, keeping generator order
pub fn static_filter(combinations: Vec<Combination>) -> Vec<Combination> {
    combinations
        .into_iter()
        .filter(|combination| {
            if is_all_negative(combination) {
                tracing::debug!(%combination, "skipping all-negative combination");
                false
            } else if is_self_contradictory(combination) {
                tracing::debug!(%combination, "skipping self-contradictory combination");
                false
            } else {
                true
            }
        })
        .collect()
}

/// The singleton a pair reduces to once its negative flags are removed
///
/// `None` unless exactly one positive flag remains.
pub fn reduced_form(combination: &Combination) -> Option<Combination> {
    let mut positives = combination.positive_flags();
    match (positives.next(), positives.next()) {
        (Some(flag), None) => Some(Combination::single(flag.clone())),
        _ => None,
    }
}

/// Drop pairs whose observed result equals that of their reduced singleton
///
/// Singletons always pass. A pair also passes when it has no single-flag
/// reduction or when that reduction was not successfully probed.
pub fn prune_redundant(results: &ResultMap) -> ResultMap {
    results.retain_into(|combination, observed| {
        if !combination.is_pair() {
            return true;
        }

        let Some(reduced) = reduced_form(combination) else {
            return true;
        };

        match results.get(&reduced) {
            Some(reduced_observed) if reduced_observed == observed => {
                tracing::debug!(
                    %combination,
                    %reduced,
                    "dropping pair: negative flag does not change collectors"
                );
                false
            }
            _ => true,
        }
    })
}
