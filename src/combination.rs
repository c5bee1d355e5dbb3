//! Flag combinations and their generator
//!
//! Collector selection only ever depends on one or two co-occurring flags, so
//! the generator emits the power set of the vocabulary restricted to subsets
//! of size one and two.

use crate::flag::{Flag, Vocabulary};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A set of one or two flags probed together as a single trial
///
/// Flags keep the order they were given in (vocabulary order when produced by
/// [`generate`]), which is the order used for command lines and rendering.
/// Equality and hashing ignore that order.
#[derive(Debug, Clone)]
pub struct Combination {
    flags: Vec<Flag>,
}

impl Combination {
    pub fn single(flag: Flag) -> Self {
        Self { flags: vec![flag] }
    }

    /// Pair of distinct flags, `first` rendered before `second`
    pub fn pair(first: Flag, second: Flag) -> Self {
        debug_assert_ne!(first, second, "a combination cannot repeat a flag");
        Self {
            flags: vec![first, second],
        }
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn is_pair(&self) -> bool {
        self.flags.len() == 2
    }

    /// Flags that are not of negative polarity, in order
    pub fn positive_flags(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter().filter(|flag| !flag.is_negative())
    }

    pub fn tokens(&self) -> Vec<&str> {
        self.flags.iter().map(Flag::token).collect()
    }

    fn sorted_tokens(&self) -> Vec<&str> {
        let mut tokens = self.tokens();
        tokens.sort_unstable();
        tokens
    }
}

impl PartialEq for Combination {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_tokens() == other.sorted_tokens()
    }
}

impl Eq for Combination {}

impl Hash for Combination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted_tokens().hash(state);
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}

/// Every combination of one or two vocabulary flags
///
/// Order follows binary counting over vocabulary indices: for each index `j`
/// the singleton `{j}` comes first, then `{i, j}` for every `i < j`.
pub fn generate(vocabulary: &Vocabulary) -> Vec<Combination> {
    let flags = vocabulary.flags();
    let n = flags.len();
    let mut combinations = Vec::with_capacity(n + n * n.saturating_sub(1) / 2);

    for (j, flag) in flags.iter().enumerate() {
        combinations.push(Combination::single(flag.clone()));
        for earlier in &flags[..j] {
            combinations.push(Combination::pair(earlier.clone(), flag.clone()));
        }
    }

    tracing::debug!(
        vocabulary = n,
        combinations = combinations.len(),
        "generated flag combinations"
    );

    combinations
}
