use crate::error::BrowserError;
use anyhow::Result;
use chromiumoxide::{Browser, Handler};
use tracing::{error, info};

/// Attach to a browser already listening on a debugging port
///
/// Handy for watching a run inside an existing, logged-in window.
pub async fn connect_to_browser(port: u16) -> Result<(Browser, Handler)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("🔌 Connecting to browser: {}", browser_url);

    let (browser, handler) = Browser::connect(&browser_url).await.map_err(|source| {
        error!("failed to connect to browser: {}", source);
        BrowserError::ConnectionFailed { port, source }
    })?;

    Ok((browser, handler))
}
