use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,apihub=debug,apihub_server=debug";

/// Installs the global subscriber. `RUST_LOG` wins over the configured
/// directive, which wins over `DEFAULT_FILTER`.
pub fn init_logging(configured: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("could not install tracing subscriber: {}", e))?;

    tracing::debug!("logging initialized");
    Ok(())
}
