//! Logging setup for the relay daemon.

use eyre::{Result, WrapErr, eyre};
use tracing_subscriber::EnvFilter;

use crate::args::LogArgs;

/// Initialize the global tracing subscriber from command line arguments.
///
/// The filter is built with the following precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` if set, or the level implied by `-v`
/// 3. Apply any custom directives from `--log.filter`
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(args, env.as_deref())?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if args.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| eyre!(e))
    .wrap_err("failed to install tracing subscriber")
}

/// Build the filter for `args`, given the value of `RUST_LOG` if any.
///
/// A malformed `--log.filter` directive is an error. A malformed `RUST_LOG`
/// falls back to the base level.
pub fn build_filter(args: &LogArgs, env: Option<&str>) -> Result<EnvFilter> {
    if args.quiet {
        return Ok(EnvFilter::new("error"));
    }

    let mut filter = env
        .filter(|_| args.verbosity == 0)
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(args.base_level()));

    if let Some(custom) = &args.filter {
        for directive in custom.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let directive = directive
                .parse()
                .wrap_err_with(|| format!("invalid log filter directive `{directive}`"))?;
            filter = filter.add_directive(directive);
        }
    }

    Ok(filter)
}
