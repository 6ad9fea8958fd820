//! Participant table of a program screen
//!
//! Row lookup with bounded pagination, the attendance checkbox and the
//! batch submit. Nothing here is cached: every lookup re-queries the DOM.

use crate::infrastructure::{Dom, Locator, LocatorChain, Role, TextPattern};
use crate::models::NationalId;
use crate::services::overlays::{clear_overlays, dismiss_confirmations};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

const TABLE_ROWS: &str = "#tabla_participante_front tr";
const ATTENDANCE_CHECKBOX: &str = "input[type='checkbox'][name='asistencia[]']";
const PAGINATION: &str = ".pagination, ul.pagination, nav[aria-label*='pagination' i], [rel='next']";
const BATCH_SUBMIT: &str = "#enviar_asistencia, button.enviar_asistencia";
const NEXT_PAGE_CAPTION: &str = r"Siguiente|Next|›|»";

const CLICK_TIMEOUT: Duration = Duration::from_millis(1500);
const PAGE_TURN_DELAY: Duration = Duration::from_millis(320);
const CHECK_TIMEOUT: Duration = Duration::from_secs(2);
const SUBMIT_SETTLE: Duration = Duration::from_millis(1500);

/// Participant table operations
pub struct ParticipantTable;

impl ParticipantTable {
    pub fn new() -> Self {
        Self
    }

    fn row(id: &NationalId) -> Locator {
        Locator::has_text(TABLE_ROWS, TextPattern::regex(id.row_pattern()))
    }

    /// Row showing `id`, paging forward at most `max_pages` times
    pub async fn find_row(&self, dom: &Dom, id: &NationalId, max_pages: usize) -> Result<Option<Locator>> {
        let row = Self::row(id);
        let pages = LivePages {
            table: self,
            dom,
            row: &row,
        };
        match search_pages(&pages, max_pages).await? {
            Some(turns) => {
                debug!("{} found after {} page turn(s)", id, turns);
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    pub async fn has_pagination(&self, dom: &Dom) -> Result<bool> {
        dom.exists(&Locator::css(PAGINATION)).await
    }

    /// Click the next-page control; `false` when there is none left
    pub async fn next_page(&self, dom: &Dom) -> Result<bool> {
        clear_overlays(dom).await;

        let caption = TextPattern::regex(NEXT_PAGE_CAPTION);
        let chain = LocatorChain::new(vec![
            Locator::role(Role::Link, caption.clone()).last(),
            Locator::css("[rel='next']").last(),
            Locator::has_text("a", caption.clone()).last(),
            Locator::has_text("button", caption).last(),
        ]);
        let Some(next) = dom.first_present(&chain).await? else {
            return Ok(false);
        };

        let clicked = dom.click(&next, CLICK_TIMEOUT).await? || dom.force_click(&next).await?;
        if clicked {
            dom.pause(PAGE_TURN_DELAY).await;
        }
        Ok(clicked)
    }

    /// Check the attendance box on the row of `id`
    pub async fn mark_attendance(&self, dom: &Dom, id: &NationalId, max_pages: usize) -> Result<bool> {
        let Some(row) = self.find_row(dom, id, max_pages).await? else {
            warn!("row for {} not found, cannot mark attendance", id);
            return Ok(false);
        };

        let checkbox = Locator::css(ATTENDANCE_CHECKBOX).within(&row);
        if !dom.exists(&checkbox).await? {
            warn!("row for {} has no attendance checkbox", id);
            return Ok(false);
        }
        dom.scroll_into_view(&checkbox).await?;
        dom.check(&checkbox, CHECK_TIMEOUT).await
    }

    /// Send the checked boxes; called once per group
    pub async fn submit_attendance(&self, dom: &Dom) -> Result<bool> {
        let submit = Locator::css(BATCH_SUBMIT);
        if !dom.exists(&submit).await? {
            warn!("attendance submit button not found");
            return Ok(false);
        }
        dom.scroll_into_view(&submit).await?;
        if !dom.click_or_force(&submit, CLICK_TIMEOUT).await? {
            warn!("attendance submit button could not be clicked");
            return Ok(false);
        }
        dom.pause(SUBMIT_SETTLE).await;
        dismiss_confirmations(dom).await;
        info!("📨 Attendance submitted");
        Ok(true)
    }
}

impl Default for ParticipantTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A table that is read one page at a time
#[async_trait]
trait PagedTable: Send + Sync {
    /// Whether the wanted row is on the current page
    async fn row_present(&self) -> Result<bool>;

    async fn has_pagination(&self) -> Result<bool>;

    /// Move one page forward; `false` when there is no next page
    async fn next_page(&self) -> Result<bool>;
}

/// Look for the row on the current page, then page forward up to
/// `max_pages` times
///
/// Returns the number of page turns it took, `None` when the row never
/// showed up. Pagination is only checked once, before the first turn.
async fn search_pages<T: PagedTable + ?Sized>(table: &T, max_pages: usize) -> Result<Option<usize>> {
    if table.row_present().await? {
        return Ok(Some(0));
    }
    if !table.has_pagination().await? {
        return Ok(None);
    }

    for turn in 1..=max_pages {
        if !table.next_page().await? {
            debug!("no next page after {} turn(s)", turn - 1);
            break;
        }
        if table.row_present().await? {
            return Ok(Some(turn));
        }
    }
    Ok(None)
}

/// The live participant table, looking for one row
struct LivePages<'a> {
    table: &'a ParticipantTable,
    dom: &'a Dom,
    row: &'a Locator,
}

#[async_trait]
impl PagedTable for LivePages<'_> {
    async fn row_present(&self) -> Result<bool> {
        self.dom.exists(self.row).await
    }

    async fn has_pagination(&self) -> Result<bool> {
        self.table.has_pagination(self.dom).await
    }

    async fn next_page(&self) -> Result<bool> {
        self.table.next_page(self.dom).await
    }
}
