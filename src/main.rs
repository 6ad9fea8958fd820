use anyhow::Result;
use asistencia_vibi::utils::logging;
use asistencia_vibi::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // reads .env before the process environment
    let config = Config::from_env();

    logging::init(config.verbose_logging);

    App::initialize(config).await?.run().await?;

    Ok(())
}
