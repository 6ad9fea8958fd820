use crate::config::Config;
use crate::error::BrowserError;
use anyhow::Result;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig, Handler};
use tracing::{debug, error, info};

/// Launch a browser process for the run
///
/// Headed by default so an operator can watch the portal; `HEADLESS` switches
/// to the new headless mode.
pub async fn launch_browser(config: &Config) -> Result<(Browser, Handler)> {
    let (width, height) = config.viewport;
    info!(
        "🚀 Launching browser ({})...",
        if config.headless { "headless" } else { "headed" }
    );

    let mut builder = BrowserConfig::builder()
        .window_size(width, height)
        .viewport(Viewport {
            width,
            height,
            ..Viewport::default()
        })
        .args(vec![
            "--disable-gpu",
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ]);

    if config.headless {
        builder = builder.new_headless_mode();
    } else {
        builder = builder.with_head();
    }

    if let Some(executable) = &config.chrome_executable {
        debug!("browser executable: {}", executable.display());
        builder = builder.chrome_executable(executable);
    }

    let browser_config = builder.build().map_err(|e| {
        error!("browser configuration failed: {}", e);
        BrowserError::ConfigurationFailed(e)
    })?;

    let (browser, handler) = Browser::launch(browser_config).await.map_err(|source| {
        error!("failed to launch browser: {}", source);
        BrowserError::LaunchFailed { source }
    })?;
    debug!("browser launched");

    Ok((browser, handler))
}
