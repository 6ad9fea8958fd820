//! Popup and modal handling
//!
//! The portal greets most screens with notices and answers every save with
//! a confirmation dialog. Both helpers here are best effort: nothing they do
//! can fail the caller.

use crate::infrastructure::{Dom, Locator, Role, TextPattern};
use std::time::Duration;
use tracing::debug;

/// Button captions that close a notice
const CLOSE_CAPTIONS: [&str; 7] = [
    "Cerrar",
    "OK",
    "Aceptar",
    "Entendido",
    "Hecho",
    "Continuar",
    "Sí",
];

/// Close icons of the modal libraries the portal uses
const CLOSE_ICONS: [&str; 4] = [
    ".mfp-close",
    ".swal2-close",
    ".modal-header .close",
    "button[aria-label='Close']",
];

/// Captions of the dialog shown after a save
const CONFIRM_CAPTIONS: &str = r"^\s*(OK|Aceptar|Entendido|S[ií]|Continuar)\s*$";

const OVERLAY_CLICK_TIMEOUT: Duration = Duration::from_millis(500);
const CONFIRM_WAIT: Duration = Duration::from_millis(1500);

/// Close whatever notice is covering the page, then press Escape
pub async fn clear_overlays(dom: &Dom) {
    let buttons = CLOSE_CAPTIONS
        .iter()
        .map(|caption| Locator::role(Role::Button, TextPattern::folded_exact(caption)));
    let icons = CLOSE_ICONS.iter().map(|selector| Locator::css(*selector));

    // hidden modal templates keep their buttons in the DOM; leave them alone
    for locator in buttons.chain(icons).map(Locator::visible) {
        if !dom.exists(&locator).await.unwrap_or(false) {
            continue;
        }
        match dom.click_or_force(&locator, OVERLAY_CLICK_TIMEOUT).await {
            Ok(true) => debug!("closed overlay via {}", locator),
            Ok(false) => {}
            Err(e) => debug!("overlay {} ignored: {}", locator, e),
        }
    }

    if let Err(e) = dom.press_escape().await {
        debug!("escape ignored: {}", e);
    }
}

/// Accept the confirmation dialog a save leaves behind
///
/// Returns whether a dialog was found and clicked.
pub async fn dismiss_confirmations(dom: &Dom) -> bool {
    let confirm = Locator::role(Role::Button, TextPattern::regex(CONFIRM_CAPTIONS)).visible();
    if !dom.wait_for(&confirm, CONFIRM_WAIT).await.unwrap_or(false) {
        return false;
    }
    match dom.click_or_force(&confirm, OVERLAY_CLICK_TIMEOUT).await {
        Ok(clicked) => {
            if clicked {
                debug!("confirmation dismissed");
            }
            clicked
        }
        Err(e) => {
            debug!("confirmation ignored: {}", e);
            false
        }
    }
}
