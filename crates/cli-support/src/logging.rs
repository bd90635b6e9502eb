use std::{
    env,
    io::{self, LineWriter},
};

use anyhow::{Context, Result};
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

pub const LOG_ENV_VAR: &str = "LINKGROUP_LOG";

const DEBUG_FILTER: &str = "info,linkgroup=debug,linkgroup_engine=debug,linkgroup_cli_support=debug";

/// Installs the global stderr subscriber
///
/// The filter comes from `LINKGROUP_LOG`. Without it, nothing is logged unless `debug` is set.
pub fn init(debug: bool) -> Result<()> {
    let filter = match env::var(LOG_ENV_VAR) {
        Ok(filter) => Some(filter),
        Err(env::VarError::NotPresent) => debug.then(|| DEBUG_FILTER.to_owned()),
        Err(err @ env::VarError::NotUnicode(_)) => {
            return Err(err).with_context(|| format!("invalid {} environment variable", LOG_ENV_VAR))
        }
    };

    let stderr_layer = match filter {
        Some(filter) => {
            let env_filter = EnvFilter::try_new(&filter)
                .with_context(|| format!("error in {} environment variable format", LOG_ENV_VAR))?;
            Some(
                tracing_subscriber::fmt::layer()
                    // If we are asking for any trace-level logs, print full span events. Otherwise only print span close.
                    .with_span_events(if filter.contains("trace") {
                        FmtSpan::FULL
                    } else {
                        FmtSpan::CLOSE
                    })
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(atty::is(atty::Stream::Stderr))
                    .with_writer(|| LineWriter::new(io::stderr()))
                    .with_filter(env_filter),
            )
        }
        None => None,
    };

    tracing::subscriber::set_global_default(tracing_subscriber::registry().with(stderr_layer))
        .context("failed to install logging subscriber")?;
    Ok(())
}
