//! Browser lifecycle
//!
//! Launches (or attaches to) a browser, drains its CDP event stream in the
//! background and opens the single page the run works on.

pub mod connection;
pub mod launch;

pub use connection::connect_to_browser;
pub use launch::launch_browser;

use crate::config::Config;
use crate::error::BrowserError;
use anyhow::Result;
use chromiumoxide::{Browser, Handler, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Running browser plus its event loop
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    attached: bool,
}

impl BrowserSession {
    /// Launch, or attach when a debugging port is configured
    pub async fn open(config: &Config) -> Result<Self> {
        let (browser, handler, attached) = match config.browser_debug_port {
            Some(port) => {
                let (browser, handler) = connect_to_browser(port).await?;
                (browser, handler, true)
            }
            None => {
                let (browser, handler) = launch_browser(config).await?;
                (browser, handler, false)
            }
        };

        let handler_task = spawn_handler(handler);

        // let the target list settle before opening pages
        sleep(Duration::from_millis(300)).await;

        Ok(Self {
            browser,
            handler_task,
            attached,
        })
    }

    /// Open a blank page
    pub async fn new_page(&self) -> Result<Page> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|source| BrowserError::PageCreationFailed { source })?;
        debug!("page created");
        Ok(page)
    }

    /// Close a launched browser; an attached one is left running
    pub async fn shutdown(mut self) {
        if !self.attached {
            if let Err(e) = self.browser.close().await {
                warn!("failed to close browser: {}", e);
            }
            let _ = self.browser.wait().await;
        }
        self.handler_task.abort();
    }
}

fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    })
}
