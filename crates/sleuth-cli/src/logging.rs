//! Tracing setup for the binary.
//!
//! Human-readable events go to stderr so stdout stays clean for command
//! output. With a log-capture directory, a JSON copy of every event is also
//! written to `<dir>/run-NNNN/sleuth.log`, one fresh directory per process.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE: &str = "sleuth.log";

fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("info,sleuth=debug,sleuth_core=debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Install the global subscriber. Returns the run directory when capturing.
pub fn init(verbose: bool, log_dir: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    // RUST_LOG wins over the verbosity flag
    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::new(v),
        _ => default_filter(verbose),
    };

    let (capture, run_dir) = match log_dir {
        Some(base) => {
            let run_dir = next_run_dir(base)?;
            let file = File::create(run_dir.join(LOG_FILE))
                .with_context(|| format!("failed to create log file in {}", run_dir.display()))?;
            let layer = fmt::layer().json().with_writer(Mutex::new(file));
            (Some(layer), Some(run_dir))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(capture)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(run_dir)
}

/// Create `base/run-NNNN` with the next unused number.
pub fn next_run_dir(base: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(base)
        .with_context(|| format!("failed to create log directory {}", base.display()))?;

    let mut highest = 0u32;
    for entry in std::fs::read_dir(base)? {
        let name = entry?.file_name();
        let Some(n) = name
            .to_str()
            .and_then(|s| s.strip_prefix("run-"))
            .and_then(|s| s.parse::<u32>().ok())
        else {
            continue;
        };
        highest = highest.max(n);
    }

    let dir = base.join(format!("run-{:04}", highest + 1));
    std::fs::create_dir(&dir)
        .with_context(|| format!("failed to create run directory {}", dir.display()))?;
    Ok(dir)
}
