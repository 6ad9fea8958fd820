//! Portal session: login and the way back to the home screen

use crate::config::Config;
use crate::error::{BrowserError, NavigationError};
use crate::infrastructure::{Dom, Locator, LocatorChain, Role, TextPattern};
use crate::services::overlays::clear_overlays;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Text only the logged-in home screen shows
const HOME_MARKER: &str = r"Profesor\s*:";

const LOGIN_LOAD_TIMEOUT: Duration = Duration::from_secs(10);
const LOGIN_SETTLE_TIMEOUT: Duration = Duration::from_secs(15);
const HOME_TIMEOUT: Duration = Duration::from_secs(10);
const CLICK_TIMEOUT: Duration = Duration::from_secs(3);

/// Logs in and brings the browser back home between groups
pub struct SessionDriver {
    portal_url: String,
    email: String,
    password: String,
}

impl SessionDriver {
    pub fn new(config: &Config) -> Self {
        Self {
            portal_url: config.portal_url.clone(),
            email: config.email.clone(),
            password: config.password.clone(),
        }
    }

    fn home_marker() -> Locator {
        Locator::text(TextPattern::regex(HOME_MARKER))
    }

    /// Fill the login form and wait for the home screen
    pub async fn login(&self, dom: &Dom) -> Result<()> {
        info!("🔐 Logging in to {}", self.portal_url);
        dom.goto(&self.portal_url).await?;
        dom.wait_for_dom_ready(LOGIN_LOAD_TIMEOUT).await?;

        let email_field = LocatorChain::new(vec![
            Locator::label(TextPattern::regex("usuario|correo|e-?mail")),
            Locator::css("input[type='email'], input[name*='user'], input[name*='email']"),
        ]);
        let email = dom
            .first_present(&email_field)
            .await?
            .ok_or_else(|| BrowserError::LoginFailed("email field not found".to_string()))?;
        dom.fill(&email, &self.email).await?;

        let password = Locator::css("input[type='password']");
        if !dom.fill(&password, &self.password).await? {
            return Err(BrowserError::LoginFailed("password field not found".to_string()).into());
        }

        let submit = Locator::css("input[type='submit'], button[type='submit']");
        if !dom.click_or_force(&submit, CLICK_TIMEOUT).await? {
            return Err(BrowserError::LoginFailed("login button not found".to_string()).into());
        }
        dom.wait_for_network_idle(LOGIN_SETTLE_TIMEOUT).await?;

        if !dom.wait_for(&Self::home_marker(), LOGIN_SETTLE_TIMEOUT).await? {
            return Err(
                BrowserError::LoginFailed("home screen not shown after login".to_string()).into(),
            );
        }
        info!("✓ Logged in as {}", self.email);
        Ok(())
    }

    /// Back to the home screen via the home link, by address if that fails
    pub async fn return_home(&self, dom: &Dom) -> Result<()> {
        clear_overlays(dom).await;

        let home_link = Locator::role(Role::Link, TextPattern::regex(r"^\s*Inicio\b"));
        if dom.exists(&home_link).await? && dom.click_or_force(&home_link, CLICK_TIMEOUT).await? {
            dom.wait_for_network_idle(HOME_TIMEOUT).await?;
            if dom.wait_for(&Self::home_marker(), HOME_TIMEOUT).await? {
                debug!("home reached via link");
                return Ok(());
            }
            warn!("home link did not reach the home screen, reloading {}", self.portal_url);
        }

        dom.goto(&self.portal_url).await?;
        dom.wait_for_network_idle(HOME_TIMEOUT).await?;
        if dom.wait_for(&Self::home_marker(), HOME_TIMEOUT).await? {
            debug!("home reached by address");
            return Ok(());
        }
        Err(NavigationError::HomeUnreachable.into())
    }
}
