//! Enrollment controls of a program screen
//!
//! Two ways in: the ID-only popup (fast, not present on every screen) and
//! the full "Matricular Participante" modal.

use crate::infrastructure::{Dom, Locator, LocatorChain, Role, TextPattern};
use crate::models::{NationalId, RosterEntry};
use crate::services::overlays::{clear_overlays, dismiss_confirmations};
use anyhow::{anyhow, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Events the portal's ID lookup listens to
const ID_FIELD_EVENTS: [&str; 3] = ["keyup", "input", "change"];

const CLICK_TIMEOUT: Duration = Duration::from_millis(1500);
const POPUP_TIMEOUT: Duration = Duration::from_secs(4);
const QUICK_SETTLE: Duration = Duration::from_millis(2500);
const QUICK_IDLE_TIMEOUT: Duration = Duration::from_secs(3);
const FORM_TIMEOUT: Duration = Duration::from_secs(8);
const FORM_SETTLE: Duration = Duration::from_millis(800);

/// Which fields of the enrollment modal were filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormFill {
    pub name: bool,
    pub national_id: bool,
    pub gender: bool,
}

/// Fast popup and full modal enrollment
pub struct EnrollmentForms;

impl EnrollmentForms {
    pub fn new() -> Self {
        Self
    }

    /// Enroll through the ID-only popup
    ///
    /// `Ok(false)` when the popup or one of its controls is missing. The
    /// caller still has to re-query the table to know if it worked.
    pub async fn quick_enroll(&self, dom: &Dom, id: &NationalId) -> Result<bool> {
        clear_overlays(dom).await;

        let opener = LocatorChain::new(vec![
            Locator::css("button.matricular_participante, button#matricular_participante"),
            Locator::role(
                Role::Button,
                TextPattern::regex(r"Agregar\s+Participante|Matricular\s+Participante"),
            ),
        ]);
        let Some(opener) = dom.first_present(&opener).await? else {
            info!("no quick enrollment button on this screen");
            return Ok(false);
        };
        dom.scroll_into_view(&opener).await?;
        dom.click_or_force(&opener, CLICK_TIMEOUT).await?;

        let id_field = LocatorChain::new(vec![
            Locator::css("#rut_parti_matri"),
            Locator::css("#rut_parti, input[name*='rut'], input[id*='rut']"),
        ]);
        if !dom.wait_for_any(&id_field, POPUP_TIMEOUT).await? {
            debug!("quick enrollment popup did not show an ID field");
            return Ok(false);
        }
        let Some(id_field) = dom.first_present(&id_field).await? else {
            return Ok(false);
        };
        dom.fill(&id_field, id.as_str()).await?;
        dom.dispatch(&id_field, &ID_FIELD_EVENTS).await?;

        let send = LocatorChain::new(vec![
            Locator::css("#enviar_matricula"),
            Locator::has_text("button", TextPattern::regex("Agregar|Matricular|Guardar")).visible(),
        ]);
        let Some(send) = dom.first_present(&send).await? else {
            debug!("quick enrollment popup has no send button");
            return Ok(false);
        };
        if !dom.click_or_force(&send, CLICK_TIMEOUT).await? {
            return Ok(false);
        }

        dom.pause(QUICK_SETTLE).await;
        dom.wait_for_network_idle(QUICK_IDLE_TIMEOUT).await?;
        dismiss_confirmations(dom).await;
        info!("⚡ Quick enrollment sent for {}", id);
        Ok(true)
    }

    fn dialog() -> Locator {
        Locator::role(Role::Dialog, TextPattern::any()).visible()
    }

    /// Open the full enrollment modal and wait for its fields
    ///
    /// Returns the form to fill and submit. When a modal opened, the form is
    /// scoped to it and stops resolving once the modal closes.
    pub async fn open_enrollment_form(&self, dom: &Dom) -> Result<Option<Locator>> {
        let opener = LocatorChain::new(vec![
            Locator::role(
                Role::Button,
                TextPattern::regex(r"^\s*Matricular\s+Participante\s*$"),
            ),
            Locator::has_text("button, a", TextPattern::regex(r"Matricular\s+Participante")),
        ]);
        let Some(opener) = dom.first_present(&opener).await? else {
            warn!("'Matricular Participante' button not found");
            return Ok(None);
        };
        dom.scroll_into_view(&opener).await?;
        if !dom.click_or_force(&opener, CLICK_TIMEOUT).await? {
            return Ok(None);
        }

        let fields = LocatorChain::new(vec![
            Locator::css("form input, form select").within(&Self::dialog()),
            Locator::css("form input, form select"),
        ]);
        if !dom.wait_for_any(&fields, FORM_TIMEOUT).await? {
            return Ok(None);
        }
        let form = form_handle(dom.exists(&Self::dialog()).await?);
        debug!("enrollment form: {}", form);
        Ok(Some(form))
    }

    /// Fill name, ID and gender; each field takes the first locator that hits
    pub async fn fill_enrollment_form(
        &self,
        dom: &Dom,
        form: &Locator,
        entry: &RosterEntry,
    ) -> Result<FormFill> {
        if !dom.wait_for(form, FORM_TIMEOUT).await? {
            return Err(anyhow!("enrollment form did not appear"));
        }

        let name_field = LocatorChain::new(vec![
            Locator::label(TextPattern::regex(r"^Nombre\b")),
            Locator::label(TextPattern::regex(r"^Nombre\s+Completo\b")),
            Locator::label(TextPattern::regex(r"Nombres\s+y\s+Apellidos")),
            Locator::placeholder(TextPattern::regex("Nombre")),
            Locator::css("#nombre_parti, input[name*='nombre'], input[id*='nombre']"),
        ])
        .within(form);
        let id_field = LocatorChain::new(vec![
            Locator::css("#rut_parti"),
            Locator::label(TextPattern::regex(r"^(RUT|RUN)\b")),
            Locator::placeholder(TextPattern::regex(r"RUT|RUN|Documento")),
            Locator::css("input[name*='rut'], input[id*='rut'], input[name*='run'], input[id*='run']"),
        ])
        .within(form);
        let gender_field = LocatorChain::new(vec![
            Locator::css("#genero, select[name*='genero'], select[id*='genero']"),
            Locator::label(TextPattern::regex(r"G[eé]nero|Sexo")),
        ])
        .within(form);

        let mut filled = FormFill::default();

        if let Some(field) = dom.first_present(&name_field).await? {
            filled.name = dom.fill(&field, &entry.full_name).await?;
        }
        if let Some(field) = dom.first_present(&id_field).await? {
            filled.national_id = dom.fill(&field, entry.national_id.as_str()).await?;
            dom.dispatch(&field, &ID_FIELD_EVENTS).await?;
        }
        if let Some(field) = dom.first_present(&gender_field).await? {
            // a missing option is not worth failing the enrollment over
            filled.gender = dom
                .select_option_by_label(&field, &TextPattern::contains(&entry.gender))
                .await
                .unwrap_or(false);
        }

        debug!("enrollment form filled: {:?}", filled);
        Ok(filled)
    }

    /// Submit the form `open_enrollment_form` returned; synthetic submit
    /// event as the last resort
    ///
    /// `Ok(false)` once that form is gone, e.g. the modal was closed.
    pub async fn submit_enrollment_form(&self, dom: &Dom, form: &Locator) -> Result<bool> {
        if !dom.exists(form).await? {
            warn!("enrollment form {} is no longer on the page", form);
            return Ok(false);
        }
        let submit = Locator::css("input[type='submit'], button[type='submit']").within(form);

        let mut submitted = false;
        if dom.exists(&submit).await? {
            dom.scroll_into_view(&submit).await?;
            submitted = dom.click(&submit, CLICK_TIMEOUT).await? || dom.force_click(&submit).await?;
        }
        if !submitted {
            debug!("no usable submit control, submitting {} directly", form);
            submitted = dom.submit_form(form).await?;
        }

        if submitted {
            dom.pause(FORM_SETTLE).await;
            dismiss_confirmations(dom).await;
        }
        Ok(submitted)
    }
}

impl Default for EnrollmentForms {
    fn default() -> Self {
        Self::new()
    }
}

/// The enrollment form: inside the modal when one is open, otherwise the
/// page's own form
fn form_handle(dialog_open: bool) -> Locator {
    let form = Locator::css("form");
    if dialog_open {
        form.within(&EnrollmentForms::dialog())
    } else {
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_form_is_scoped_to_the_visible_dialog() {
        let form = form_handle(true);

        assert_ne!(form, Locator::css("form"));
        assert_eq!(form, Locator::css("form").within(&EnrollmentForms::dialog()));
        assert!(form.to_string().ends_with(":visible"), "{}", form);
    }

    #[test]
    fn test_inline_form_when_no_dialog() {
        assert_eq!(form_handle(false), Locator::css("form"));
    }

    #[test]
    fn test_submit_control_stays_inside_the_form() {
        let submit = Locator::css("input[type='submit'], button[type='submit']").within(&form_handle(true));
        let json = serde_json::to_value(&submit).unwrap();

        assert_eq!(json["within"]["strategy"]["selector"], "form");
        assert_eq!(json["within"]["within"]["strategy"]["kind"], "role");
        assert_eq!(json["within"]["within"]["visible"], true);
    }
}
