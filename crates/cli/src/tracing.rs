use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use tracing_log::AsTrace;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

/// Logs to stderr at the requested verbosity and, if `trace` is given, everything to that file.
pub fn configure_tracing(trace: Option<PathBuf>, verbose: Verbosity<InfoLevel>) -> anyhow::Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(
            verbose
                .log_level_filter()
                .as_trace(),
        );

    let trace_layer = match trace {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("Unable to create trace file. path: {:?}", path))?;

            let layer = fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .with_filter(LevelFilter::TRACE);

            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(trace_layer)
        .try_init()
        .context("Unable to configure tracing")?;

    Ok(())
}
