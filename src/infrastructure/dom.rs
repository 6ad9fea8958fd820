//! DOM actions over locators
//!
//! Every action reports success as a value instead of failing: a missing
//! element is `Ok(false)`, only transport/script failures are `Err`.

use crate::infrastructure::locator::{Locator, LocatorChain, TextPattern};
use crate::infrastructure::js_executor::{JsExecutor, Key};
use anyhow::Result;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;

/// Poll interval for bounded waits
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Network considered idle after this long without new resource entries
const IDLE_QUIET_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct ClickPoint {
    x: f64,
    y: f64,
}

/// Locator-driven page actions
pub struct Dom {
    executor: JsExecutor,
}

impl Dom {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// Number of elements matching
    pub async fn count(&self, locator: &Locator) -> Result<usize> {
        self.executor
            .eval_as(locator.script("return els.length;")?)
            .await
    }

    pub async fn exists(&self, locator: &Locator) -> Result<bool> {
        Ok(self.count(locator).await? > 0)
    }

    /// First locator of the chain that has a match
    pub async fn first_present(&self, chain: &LocatorChain) -> Result<Option<Locator>> {
        for locator in chain.iter() {
            if self.exists(locator).await? {
                debug!("matched {}", locator);
                return Ok(Some(locator.clone()));
            }
        }
        debug!("nothing matched {}", chain);
        Ok(None)
    }

    /// Wait until the picked element is visible
    pub async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<bool> {
        let script = locator.script("return visible(el);")?;
        self.poll(timeout, || self.executor.eval_as::<bool>(script.clone()))
            .await
    }

    /// Wait until any locator of the chain has a visible element
    pub async fn wait_for_any(&self, chain: &LocatorChain, timeout: Duration) -> Result<bool> {
        let scripts = chain
            .iter()
            .map(|l| l.script("return visible(el);"))
            .collect::<Result<Vec<_>>>()?;
        self.poll(timeout, || async {
            for script in &scripts {
                if self.executor.eval_as::<bool>(script.clone()).await? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
        .await
    }

    pub async fn scroll_into_view(&self, locator: &Locator) -> Result<bool> {
        self.executor
            .eval_as(locator.script(
                "if (!el) return false; el.scrollIntoView({ block: 'center', inline: 'center' }); return true;",
            )?)
            .await
    }

    /// Trusted mouse click once the element is visible, enabled and on top
    pub async fn click(&self, locator: &Locator, timeout: Duration) -> Result<bool> {
        let script = locator.script("return el ? actionPoint(el) : null;")?;
        let deadline = Instant::now() + timeout;
        loop {
            let point = match self.executor.eval_as::<Option<ClickPoint>>(script.clone()).await {
                Ok(point) => point,
                Err(e) => {
                    debug!("actionability check failed: {}", e);
                    None
                }
            };
            if let Some(point) = point {
                self.executor.click_at(point.x, point.y).await?;
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// Click skipping actionability checks (element obscured or animating)
    pub async fn force_click(&self, locator: &Locator) -> Result<bool> {
        self.executor
            .eval_as(locator.script(
                "if (!el) return false; el.scrollIntoView({ block: 'center' }); el.click(); return true;",
            )?)
            .await
    }

    /// Click, falling back to a forced click
    pub async fn click_or_force(&self, locator: &Locator, timeout: Duration) -> Result<bool> {
        match self.click(locator, timeout).await {
            Ok(true) => return Ok(true),
            Ok(false) => debug!("{} not actionable, forcing click", locator),
            Err(e) => debug!("click on {} failed ({}), forcing click", locator, e),
        }
        self.force_click(locator).await
    }

    /// Replace an input's value the way typing would
    pub async fn fill(&self, locator: &Locator, value: &str) -> Result<bool> {
        let body = format!(
            r#"
            if (!el) return false;
            el.focus();
            const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
            const setter = Object.getOwnPropertyDescriptor(proto, 'value');
            if (setter && setter.set) {{ setter.set.call(el, {value}); }} else {{ el.value = {value}; }}
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
            "#,
            value = serde_json::to_string(value)?
        );
        self.executor.eval_as(locator.script(&body)?).await
    }

    /// Fire plain DOM events on the element
    pub async fn dispatch(&self, locator: &Locator, events: &[&str]) -> Result<bool> {
        let body = format!(
            "if (!el) return false; for (const name of {}) {{ el.dispatchEvent(new Event(name, {{ bubbles: true }})); }} return true;",
            serde_json::to_string(events)?
        );
        self.executor.eval_as(locator.script(&body)?).await
    }

    /// Ensure a checkbox is checked; never unchecks
    pub async fn check(&self, locator: &Locator, timeout: Duration) -> Result<bool> {
        if self.is_checked(locator).await? {
            return Ok(true);
        }
        if self.click(locator, timeout).await? && self.is_checked(locator).await? {
            return Ok(true);
        }
        debug!("{} did not check on click, forcing", locator);
        self.executor
            .eval_as(locator.script(
                r#"
                if (!el) return false;
                if (!el.checked) el.click();
                if (!el.checked) {
                  el.checked = true;
                  el.dispatchEvent(new Event('input', { bubbles: true }));
                  el.dispatchEvent(new Event('change', { bubbles: true }));
                }
                return !!el.checked;
                "#,
            )?)
            .await
    }

    pub async fn is_checked(&self, locator: &Locator) -> Result<bool> {
        self.executor
            .eval_as(locator.script("return !!(el && el.checked);")?)
            .await
    }

    /// Select the option whose label matches
    pub async fn select_option_by_label(&self, locator: &Locator, label: &TextPattern) -> Result<bool> {
        let body = format!(
            r#"
            if (!el || !el.options) return false;
            const re = rx({});
            const option = Array.from(el.options).find((o) => re.test(norm(o.textContent)));
            if (!option) return false;
            el.value = option.value;
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
            "#,
            serde_json::to_string(label)?
        );
        self.executor.eval_as(locator.script(&body)?).await
    }

    /// Submit a form element directly, respecting its validation
    pub async fn submit_form(&self, locator: &Locator) -> Result<bool> {
        self.executor
            .eval_as(locator.script(
                r#"
                if (!el) return false;
                if (el.reportValidity && !el.reportValidity()) return true;
                el.dispatchEvent(new Event('submit', { bubbles: true, cancelable: true }));
                if (typeof el.submit === 'function') el.submit();
                return true;
                "#,
            )?)
            .await
    }

    /// Trusted Escape on the focused element
    pub async fn press_escape(&self) -> Result<()> {
        self.executor.press_key(Key::ESCAPE).await
    }

    /// Wait for the document to leave the `loading` state
    pub async fn wait_for_dom_ready(&self, timeout: Duration) -> Result<bool> {
        self.poll(timeout, || {
            self.executor
                .eval_as::<bool>("document.readyState !== 'loading'")
        })
        .await
    }

    /// Wait until the document is complete and no resource has started for a
    /// quiet period
    pub async fn wait_for_network_idle(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<u64> = None;
        let mut quiet_since = Instant::now();
        loop {
            let (complete, count) = self
                .executor
                .eval_as::<(bool, u64)>(
                    "[document.readyState === 'complete', performance.getEntriesByType('resource').length]",
                )
                .await
                .unwrap_or((false, 0));
            if last_count != Some(count) || !complete {
                last_count = Some(count);
                quiet_since = Instant::now();
            } else if quiet_since.elapsed() >= IDLE_QUIET_PERIOD {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.executor.goto(url).await
    }

    /// Fixed delay
    pub async fn pause(&self, duration: Duration) {
        sleep(duration).await;
    }

    async fn poll<F, Fut>(&self, timeout: Duration, mut check: F) -> Result<bool>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<bool>>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            // the page may be mid-navigation; a failed check is "not yet"
            match check().await {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) => debug!("check failed: {}", e),
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}
