use anyhow::Context as _;

/// Default filter when `RUST_LOG` is unset.
pub fn default_directive(quiet: bool, verbose: bool) -> anyhow::Result<&'static str> {
    match (quiet, verbose) {
        (true, true) => {
            anyhow::bail!("invalid logging flag combination: cannot turn on both quiet and verbose")
        }
        (true, false) => Ok("error"),
        (false, true) => Ok("debug"),
        (false, false) => Ok("info"),
    }
}

pub fn init(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let directive = default_directive(quiet, verbose)?;
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(directive))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
