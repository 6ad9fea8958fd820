//! JS executor - infrastructure layer
//!
//! Sole owner of the page. Exposes script evaluation plus the CDP-level
//! capabilities scripts cannot provide: navigation and trusted input.

use crate::error::BrowserError;
use anyhow::{anyhow, Result};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::layout::Point;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Key without text, as CDP expects it: `key`, `code`, virtual key code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub key: &'static str,
    pub code: &'static str,
    pub key_code: i64,
}

impl Key {
    pub const ESCAPE: Key = Key {
        key: "Escape",
        code: "Escape",
        key_code: 27,
    };
}

/// JS executor
///
/// Responsibilities:
/// - hold the single `Page`
/// - run scripts and decode their results
/// - knows nothing about participants or portal screens
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Evaluate a script and return its JSON value
    ///
    /// Promises are awaited, so `(async () => ...)()` bodies are fine.
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// Evaluate a script and deserialize its value
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// Navigate and wait for the load event
    pub async fn goto(&self, url: &str) -> Result<()> {
        debug!("navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|source| BrowserError::NavigationFailed {
                url: url.to_string(),
                source,
            })?;
        Ok(())
    }

    /// Trusted left click at viewport coordinates
    pub async fn click_at(&self, x: f64, y: f64) -> Result<()> {
        self.page.click(Point { x, y }).await?;
        Ok(())
    }

    /// Trusted key press (down then up) on the focused element
    pub async fn press_key(&self, key: Key) -> Result<()> {
        for event in key_events(key)? {
            self.page.execute(event).await?;
        }
        Ok(())
    }
}

fn key_events(key: Key) -> Result<Vec<DispatchKeyEventParams>> {
    [DispatchKeyEventType::RawKeyDown, DispatchKeyEventType::KeyUp]
        .into_iter()
        .map(|kind| {
            DispatchKeyEventParams::builder()
                .r#type(kind)
                .key(key.key)
                .code(key.code)
                .windows_virtual_key_code(key.key_code)
                .native_virtual_key_code(key.key_code)
                .build()
                .map_err(|e| anyhow!("invalid key event for {}: {}", key.key, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_is_sent_as_down_then_up() {
        let events = key_events(Key::ESCAPE).unwrap();

        let kinds: Vec<_> = events.iter().map(|e| e.r#type.clone()).collect();
        assert_eq!(kinds, vec![DispatchKeyEventType::RawKeyDown, DispatchKeyEventType::KeyUp]);
        for event in &events {
            assert_eq!(event.key.as_deref(), Some("Escape"));
            assert_eq!(event.code.as_deref(), Some("Escape"));
            assert_eq!(event.windows_virtual_key_code, Some(27));
            // no text: Escape must not type anything
            assert!(event.text.is_none());
        }
    }
}
