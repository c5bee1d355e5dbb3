//! gcgraph - empirical map of HotSpot garbage collector flags
//!
//! This library enumerates combinations of collector-selection flags, probes a
//! real JVM with each surviving combination to see which collectors it ends
//! up running, discards combinations that add nothing, and renders the
//! mapping as a DOT graph.

pub mod cli;
pub mod combination;
pub mod filter;
pub mod flag;
pub mod helper;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod results;
