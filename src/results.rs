//! Observed probe results keyed by combination

use crate::combination::Combination;
use indexmap::IndexMap;

/// Collector names reported by one successful probe, in reported order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ObservedResult {
    names: Vec<String>,
}

impl ObservedResult {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a probe's standard output
    ///
    /// One trailing line terminator is dropped, then the text is split on
    /// `,` as-is. Empty components are kept, so empty output is a single
    /// empty name.
    pub fn parse(stdout: &str) -> Self {
        let line = stdout
            .strip_suffix("\r\n")
            .or_else(|| stdout.strip_suffix('\n'))
            .unwrap_or(stdout);
        Self::new(line.split(','))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Insertion-ordered map from combination to observed result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultMap {
    entries: IndexMap<Combination, ObservedResult>,
}

impl ResultMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; a combination already present keeps its position and
    /// takes the new result
    pub fn insert(&mut self, combination: Combination, result: ObservedResult) {
        self.entries.insert(combination, result);
    }

    pub fn get(&self, combination: &Combination) -> Option<&ObservedResult> {
        self.entries.get(combination)
    }

    pub fn contains(&self, combination: &Combination) -> bool {
        self.entries.contains_key(combination)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Combination, &ObservedResult)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// New map holding the entries accepted by `keep`, order preserved
    pub fn retain_into<F>(&self, mut keep: F) -> ResultMap
    where
        F: FnMut(&Combination, &ObservedResult) -> bool,
    {
        self.iter()
            .filter(|(combination, result)| keep(combination, result))
            .map(|(combination, result)| (combination.clone(), result.clone()))
            .collect()
    }
}

impl FromIterator<(Combination, ObservedResult)> for ResultMap {
    fn from_iter<T: IntoIterator<Item = (Combination, ObservedResult)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
