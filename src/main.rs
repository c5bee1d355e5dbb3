use anyhow::{Context, Result};
use clap::Parser;
use gcgraph::cli::{Cli, OutputFormat};
use gcgraph::flag::Vocabulary;
use gcgraph::helper::BundledHelper;
use gcgraph::probe::{self, HelperProgram, JvmProber, ProbeConfig};
use gcgraph::report::{DotReport, JsonReport};
use gcgraph::{combination, filter, pipeline};
use std::env;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Built-in vocabulary, optionally narrowed to the requested switches
fn build_vocabulary(switches: Option<&[String]>) -> Result<Vocabulary> {
    let vocabulary = Vocabulary::hotspot().context("Invalid built-in flag vocabulary")?;
    match switches {
        Some(switches) => vocabulary
            .restrict(switches)
            .context("Invalid value for --switches"),
        None => Ok(vocabulary),
    }
}

/// Resolve launcher, helper program and timeout from arguments and environment
fn build_probe_config(args: &Cli, bundled: Option<&BundledHelper>) -> Result<ProbeConfig> {
    let java_home = env::var_os("JAVA_HOME");
    let search_path = env::var_os("PATH");
    let launcher = probe::find_launcher(
        args.java.as_deref(),
        java_home.as_deref(),
        search_path.as_deref(),
    )?;

    let helper = match (&args.classpath, bundled) {
        (Some(classpath), _) => HelperProgram::Class {
            classpath: classpath.clone(),
            main_class: args.main_class.clone(),
        },
        (None, Some(bundled)) => bundled.program(),
        (None, None) => anyhow::bail!("No collector helper available; pass --classpath"),
    };

    Ok(ProbeConfig {
        launcher,
        helper,
        timeout: args.timeout.map(Duration::from_secs),
    })
}

/// Print the command line each candidate combination would run
fn print_dry_run(vocabulary: &Vocabulary, prober: &JvmProber) {
    for candidate in filter::static_filter(combination::generate(vocabulary)) {
        println!("{}", prober.command_line(&candidate).join(" "));
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let vocabulary = build_vocabulary(args.switches.as_deref())?;
    // Kept alive until probing is done; the directory is removed on drop
    let bundled = match args.classpath {
        Some(_) => None,
        None => Some(BundledHelper::install().context("Failed to write bundled collector helper")?),
    };
    let config = build_probe_config(&args, bundled.as_ref())?;
    tracing::debug!(?config, flags = vocabulary.len(), "configuration resolved");

    let mut prober = JvmProber::new(config);

    if args.dry_run {
        print_dry_run(&vocabulary, &prober);
        return Ok(());
    }

    let discovery = pipeline::discover(&vocabulary, &mut prober);
    tracing::debug!(
        generated = discovery.generated,
        probed = discovery.probed,
        succeeded = discovery.succeeded,
        reported = discovery.reported(),
        "discovery complete"
    );

    match args.format {
        OutputFormat::Dot => {
            print!("{}", DotReport::new(&args.title).render(&discovery.results));
        }
        OutputFormat::Json => {
            let report = JsonReport::new(&args.title, &discovery.results);
            println!("{}", report.to_json()?);
        }
    }

    Ok(())
}
