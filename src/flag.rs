//! Collector-selection flag vocabulary
//!
//! A flag is a HotSpot boolean option token such as `-XX:+UseG1GC` or
//! `-XX:-UseSerialGC`. The `+`/`-` after `-XX:` is its polarity and the rest
//! is the switch name.

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

const POSITIVE_PREFIX: &str = "-XX:+";
const NEGATIVE_PREFIX: &str = "-XX:-";

/// Every collector-selection switch known to HotSpot, in declaration order
pub const HOTSPOT_COLLECTOR_SWITCHES: [&str; 6] = [
    "UseConcMarkSweepGC",
    "UseG1GC",
    "UseParNewGC",
    "UseParallelGC",
    "UseParallelOldGC",
    "UseSerialGC",
];

/// Errors raised while building a flag vocabulary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    #[error("Flag '{0}' has no polarity prefix (expected -XX:+ or -XX:-)")]
    MissingPolarity(String),

    #[error("Flag '{0}' has an empty switch name")]
    EmptySwitch(String),

    #[error("Duplicate flag in vocabulary: {0}")]
    Duplicate(String),

    #[error("Unknown switch: {0}")]
    UnknownSwitch(String),
}

/// Whether a flag enables or disables its switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Positive,
    Negative,
}

/// A single boolean-style runtime option token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flag {
    token: String,
    polarity: Polarity,
}

impl Flag {
    /// Parse a token like `-XX:+UseG1GC`
    pub fn parse(token: &str) -> Result<Self, FlagError> {
        let (polarity, switch) = if let Some(switch) = token.strip_prefix(POSITIVE_PREFIX) {
            (Polarity::Positive, switch)
        } else if let Some(switch) = token.strip_prefix(NEGATIVE_PREFIX) {
            (Polarity::Negative, switch)
        } else {
            return Err(FlagError::MissingPolarity(token.to_string()));
        };

        if switch.is_empty() {
            return Err(FlagError::EmptySwitch(token.to_string()));
        }

        Ok(Self {
            token: token.to_string(),
            polarity,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Switch name with the polarity prefix stripped
    pub fn switch(&self) -> &str {
        // Both prefixes have the same length and parse() guarantees one of them.
        &self.token[POSITIVE_PREFIX.len()..]
    }

    pub fn is_negative(&self) -> bool {
        self.polarity == Polarity::Negative
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Ordered, duplicate-free set of flags to combine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    flags: Vec<Flag>,
}

impl Vocabulary {
    /// Build a vocabulary from tokens, keeping their order
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, FlagError> {
        let mut seen = HashSet::new();
        let mut flags = Vec::with_capacity(tokens.len());

        for token in tokens {
            let flag = Flag::parse(token.as_ref())?;
            if !seen.insert(flag.token().to_string()) {
                return Err(FlagError::Duplicate(flag.token().to_string()));
            }
            flags.push(flag);
        }

        Ok(Self { flags })
    }

    /// The HotSpot collector vocabulary: all positive forms, then all negative forms
    pub fn hotspot() -> Result<Self, FlagError> {
        let tokens: Vec<String> = [POSITIVE_PREFIX, NEGATIVE_PREFIX]
            .iter()
            .flat_map(|prefix| {
                HOTSPOT_COLLECTOR_SWITCHES
                    .iter()
                    .map(move |switch| format!("{}{}", prefix, switch))
            })
            .collect();
        Self::from_tokens(&tokens)
    }

    /// Keep only flags whose switch is listed, in vocabulary order
    pub fn restrict<S: AsRef<str>>(&self, switches: &[S]) -> Result<Self, FlagError> {
        let wanted: HashSet<&str> = switches.iter().map(|s| s.as_ref()).collect();

        for switch in switches {
            let switch = switch.as_ref();
            if !self.flags.iter().any(|flag| flag.switch() == switch) {
                return Err(FlagError::UnknownSwitch(switch.to_string()));
            }
        }

        Ok(Self {
            flags: self
                .flags
                .iter()
                .filter(|flag| wanted.contains(flag.switch()))
                .cloned()
                .collect(),
        })
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
}
