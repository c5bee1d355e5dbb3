//! Report rendering
//!
//! The default output is a Graphviz DOT digraph: one edge per combination,
//! from its flags to the collectors it selected. `--format json` emits the
//! same edges as JSON.

use crate::results::ResultMap;
use serde::{Deserialize, Serialize};

/// Graph title used when none is given
pub const DEFAULT_TITLE: &str = "HotSpot JVM Collector Options";

/// DOT digraph formatter
#[derive(Debug, Clone)]
pub struct DotReport {
    title: String,
}

impl DotReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Quote-safe DOT string body
    fn escape(text: &str) -> String {
        text.replace('\\', "\\\\").replace('"', "\\\"")
    }

    /// Render every entry as an edge, in map order
    pub fn render(&self, results: &ResultMap) -> String {
        let mut output = String::new();

        output.push_str("digraph {\n");
        output.push_str(&format!("\tlabel=\"{}\";\n", Self::escape(&self.title)));
        output.push_str("\tlabelloc=top;\n");
        output.push_str("\trankdir=LR;\n");

        for (combination, observed) in results.iter() {
            output.push_str(&format!(
                "\t\"{}\" -> \"{}\"\n",
                Self::escape(&combination.to_string()),
                Self::escape(&observed.names().join(", "))
            ));
        }

        output.push_str("}\n");
        output
    }
}

/// One flags-to-collectors edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonEdge {
    pub flags: Vec<String>,
    pub collectors: Vec<String>,
}

/// JSON form of the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonReport {
    pub title: String,
    pub edges: Vec<JsonEdge>,
}

impl JsonReport {
    pub fn new(title: impl Into<String>, results: &ResultMap) -> Self {
        Self {
            title: title.into(),
            edges: results
                .iter()
                .map(|(combination, observed)| JsonEdge {
                    flags: combination
                        .tokens()
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    collectors: observed.names().to_vec(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
