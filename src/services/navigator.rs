//! Menu navigation: facility panel → building → section → program
//!
//! Each step clears overlays first, tries its locator cascade in order and
//! falls back to a forced click when the element is covered.

use crate::config::Config;
use crate::error::NavigationError;
use crate::infrastructure::{Dom, Locator, LocatorChain, Role, TextPattern};
use crate::services::overlays::clear_overlays;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

/// Building links are only rendered once the facility panel is open
const BUILDING_LINK: &str = r"EDIFICIO\s+\S";

/// Any of these means the participant screen of a program is loaded
const PROGRAM_SCREEN_MARKER: &str =
    r"Buscar\s+por\s+Nombre|Registrar\s+Asistencias|Agregar\s+Participante|Matricular\s+Participante";

const CLICK_TIMEOUT: Duration = Duration::from_millis(1200);
const PANEL_OPEN_TIMEOUT: Duration = Duration::from_millis(1500);
const DOM_READY_TIMEOUT: Duration = Duration::from_secs(5);
const STEP_TIMEOUT: Duration = Duration::from_secs(10);
const PROGRAM_TIMEOUT: Duration = Duration::from_secs(12);

/// Walks the portal menus down to a program's participant table
pub struct Navigator {
    facility: String,
    program: String,
}

impl Navigator {
    pub fn new(config: &Config) -> Self {
        Self {
            facility: config.facility.clone(),
            program: config.program.clone(),
        }
    }

    fn building_links() -> Locator {
        Locator::has_text("a", TextPattern::regex(BUILDING_LINK)).visible()
    }

    /// Expand the facility accordion on the home screen
    ///
    /// Returns `false` when no candidate opened it.
    pub async fn open_facility_panel(&self, dom: &Dom) -> Result<bool> {
        if dom.exists(&Self::building_links()).await? {
            debug!("facility panel already open");
            return Ok(true);
        }

        clear_overlays(dom).await;
        dom.wait_for_dom_ready(DOM_READY_TIMEOUT).await?;

        let candidates = LocatorChain::new(vec![
            Locator::text(TextPattern::folded_exact(&self.facility)),
            Locator::text(TextPattern::folded_contains(&self.facility)),
            Locator::folded_text(self.facility.as_str()),
        ]);

        for candidate in candidates.iter() {
            if !dom.exists(candidate).await? {
                continue;
            }
            dom.scroll_into_view(candidate).await?;
            if !dom.click_or_force(candidate, CLICK_TIMEOUT).await? {
                continue;
            }
            dom.pause(Duration::from_millis(300)).await;
            if dom.wait_for(&Self::building_links(), PANEL_OPEN_TIMEOUT).await? {
                info!("✓ Facility panel '{}' open", self.facility);
                return Ok(true);
            }
            debug!("{} did not open the panel", candidate);
        }
        Ok(false)
    }

    /// Same as `open_facility_panel`, failing when the panel stays closed
    pub async fn ensure_facility_panel(&self, dom: &Dom) -> Result<()> {
        if self.open_facility_panel(dom).await? {
            Ok(())
        } else {
            Err(NavigationError::FacilityPanel {
                facility: self.facility.clone(),
            }
            .into())
        }
    }

    pub async fn enter_building(&self, dom: &Dom, building: &str) -> Result<()> {
        clear_overlays(dom).await;

        let label = building_label(building);
        self.click_step(dom, "building", &menu_links(&label), &label).await?;

        let landed = Locator::text(TextPattern::regex(format!(
            r"Programas|{}|Volver|Secci[oó]n|Grupo",
            regex::escape(self.program.trim())
        )));
        if !dom.wait_for(&landed, STEP_TIMEOUT).await? {
            return Err(NavigationError::DestinationNotReached { step: "building" }.into());
        }
        info!("🏢 {}", label);
        Ok(())
    }

    pub async fn enter_section(&self, dom: &Dom, section: &str) -> Result<()> {
        self.click_step(dom, "section", &menu_links(section), section).await?;
        info!("📂 Section {}", section.trim());
        Ok(())
    }

    /// Open the program and wait for its participant screen
    ///
    /// A missing program link is fine when the section opens on it already.
    pub async fn enter_program(&self, dom: &Dom) -> Result<()> {
        let chain = LocatorChain::new(vec![
            Locator::role(Role::Link, TextPattern::exact(&self.program)),
            Locator::has_text("a", TextPattern::contains(&self.program)),
        ]);
        match dom.first_present(&chain).await? {
            Some(link) => {
                dom.scroll_into_view(&link).await?;
                dom.click_or_force(&link, CLICK_TIMEOUT).await?;
            }
            None => debug!("no '{}' link, assuming it is already active", self.program),
        }

        let marker = Locator::text(TextPattern::regex(PROGRAM_SCREEN_MARKER));
        if !dom.wait_for(&marker, PROGRAM_TIMEOUT).await? {
            return Err(NavigationError::DestinationNotReached { step: "program" }.into());
        }
        info!("📋 Program '{}' loaded", self.program);
        Ok(())
    }

    async fn click_step(
        &self,
        dom: &Dom,
        step: &'static str,
        chain: &LocatorChain,
        target: &str,
    ) -> Result<()> {
        let link = dom
            .first_present(chain)
            .await?
            .ok_or_else(|| NavigationError::not_found(step, target.trim()))?;
        dom.scroll_into_view(&link).await?;
        if !dom.click_or_force(&link, CLICK_TIMEOUT).await? {
            return Err(NavigationError::not_found(step, target.trim()).into());
        }
        Ok(())
    }
}

/// Building link caption; sheets carry either `A` or `EDIFICIO A`
fn building_label(building: &str) -> String {
    let building = building.trim();
    if building.to_uppercase().starts_with("EDIFICIO") {
        building.to_string()
    } else {
        format!("EDIFICIO {}", building)
    }
}

/// Building and section links: accessible name first, then any anchor
/// whose whole caption is `caption`
fn menu_links(caption: &str) -> LocatorChain {
    LocatorChain::new(vec![
        Locator::role(Role::Link, TextPattern::exact(caption)),
        Locator::has_text("a", whole_caption(caption)),
    ])
}

/// Whole text is `caption`, with any whitespace run between its words
fn whole_caption(caption: &str) -> TextPattern {
    TextPattern::regex(format!(r"^\s*{}\s*$", spaced_words(caption)))
}

/// Literal words separated by any whitespace run
fn spaced_words(text: &str) -> String {
    text.split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}
