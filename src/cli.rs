//! CLI argument parsing for gcgraph

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Graphviz DOT digraph (default)
    Dot,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "gcgraph")]
#[command(version)]
#[command(
    about = "Graph how HotSpot JVM collector flags map to the garbage collectors they select",
    long_about = None
)]
pub struct Cli {
    /// Java launcher to probe (default: $JAVA_HOME/bin/java, else java on PATH)
    #[arg(long = "java", value_name = "PATH")]
    pub java: Option<PathBuf>,

    /// Classpath holding a compiled helper main class (default: run the bundled helper source, JDK 11+)
    #[arg(long = "classpath", visible_alias = "cp", value_name = "CLASSPATH")]
    pub classpath: Option<String>,

    /// Helper main class on --classpath that prints the active collector names
    #[arg(long = "main-class", value_name = "CLASS", default_value = crate::helper::HELPER_CLASS)]
    pub main_class: String,

    /// Only combine these switches (e.g. --switches UseG1GC,UseSerialGC)
    #[arg(long = "switches", value_name = "SWITCHES", value_delimiter = ',')]
    pub switches: Option<Vec<String>>,

    /// Graph title
    #[arg(long = "title", value_name = "TEXT", default_value = crate::report::DEFAULT_TITLE)]
    pub title: String,

    /// Output format (dot or json)
    #[arg(long = "format", value_enum, default_value = "dot")]
    pub format: OutputFormat,

    /// Kill any probe JVM still running after this many seconds (default: no limit)
    #[arg(
        long = "timeout",
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: Option<u64>,

    /// Print the probe command lines instead of running them
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
