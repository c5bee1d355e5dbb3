//! Bundled collector-name helper
//!
//! The probe JVM needs a program that prints its `GarbageCollectorMXBean`
//! names. Unless a compiled helper is supplied with `--classpath`, the source
//! below is written to a scratch directory and run with the JDK 11+
//! single-file source launcher.

use crate::probe::HelperProgram;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Main class name of the bundled helper
pub const HELPER_CLASS: &str = "PrintGCMXBeanNames";

/// Java source of the bundled helper
pub const HELPER_SOURCE: &str = include_str!("../helper/PrintGCMXBeanNames.java");

/// Helper source written to a temporary directory, removed on drop
#[derive(Debug)]
pub struct BundledHelper {
    _dir: TempDir,
    path: PathBuf,
}

impl BundledHelper {
    pub fn install() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("gcgraph-").tempdir()?;
        let path = dir.path().join(format!("{}.java", HELPER_CLASS));
        fs::write(&path, HELPER_SOURCE)?;
        tracing::debug!(path = %path.display(), "installed bundled helper");
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn program(&self) -> HelperProgram {
        HelperProgram::Source(self.path.clone())
    }
}
