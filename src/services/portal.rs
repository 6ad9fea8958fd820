//! Portal capabilities
//!
//! `Portal` is everything the workflow may ask of the attendance portal.
//! `ChromePortal` answers through a live page; tests plug in a fake.

use crate::config::Config;
use crate::infrastructure::{Dom, JsExecutor, Locator};
use crate::models::{NationalId, RosterEntry};
use crate::services::enrollment_forms::{EnrollmentForms, FormFill};
use crate::services::navigator::Navigator;
use crate::services::participant_table::ParticipantTable;
use crate::services::session::SessionDriver;
use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::Page;
use tokio::sync::Mutex;
use tracing::warn;

/// What the workflow can do on the portal
///
/// Navigation steps fail with an error when the destination is unreachable.
/// Table and enrollment actions answer `false` when the portal did not
/// cooperate; an `Err` there means the page itself is in trouble.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Expand the facility accordion on the home screen
    async fn open_facility_panel(&self) -> Result<()>;

    async fn enter_building(&self, building: &str) -> Result<()>;

    async fn enter_section(&self, section: &str) -> Result<()>;

    /// Open the configured program's participant screen
    async fn enter_program(&self) -> Result<()>;

    /// Whether the table lists `id`, paging forward up to `max_pages` times
    async fn find_participant(&self, id: &NationalId, max_pages: usize) -> Result<bool>;

    /// Submit `id` through the ID-only popup
    async fn quick_enroll(&self, id: &NationalId) -> Result<bool>;

    /// Open the full enrollment form; later fills and submits go to the
    /// form opened here
    async fn open_enrollment_form(&self) -> Result<bool>;

    async fn fill_enrollment_form(&self, entry: &RosterEntry) -> Result<FormFill>;

    /// `false` when the opened form is gone
    async fn submit_enrollment_form(&self) -> Result<bool>;

    /// Check the attendance box of `id`
    async fn mark_attendance(&self, id: &NationalId, max_pages: usize) -> Result<bool>;

    /// Send the group's attendance
    async fn submit_attendance(&self) -> Result<bool>;

    async fn return_home(&self) -> Result<()>;
}

/// `Portal` over a chromiumoxide page
pub struct ChromePortal {
    dom: Dom,
    session: SessionDriver,
    navigator: Navigator,
    table: ParticipantTable,
    enrollment: EnrollmentForms,
    /// Form from the last `open_enrollment_form`
    open_form: Mutex<Option<Locator>>,
}

impl ChromePortal {
    pub fn new(page: Page, config: &Config) -> Self {
        Self {
            dom: Dom::new(JsExecutor::new(page)),
            session: SessionDriver::new(config),
            navigator: Navigator::new(config),
            table: ParticipantTable::new(),
            enrollment: EnrollmentForms::new(),
            open_form: Mutex::new(None),
        }
    }

    /// Log in; must succeed before any group is processed
    pub async fn login(&self) -> Result<()> {
        self.session.login(&self.dom).await
    }
}

#[async_trait]
impl Portal for ChromePortal {
    async fn open_facility_panel(&self) -> Result<()> {
        self.navigator.ensure_facility_panel(&self.dom).await
    }

    async fn enter_building(&self, building: &str) -> Result<()> {
        self.navigator.enter_building(&self.dom, building).await
    }

    async fn enter_section(&self, section: &str) -> Result<()> {
        self.navigator.enter_section(&self.dom, section).await
    }

    async fn enter_program(&self) -> Result<()> {
        self.navigator.enter_program(&self.dom).await
    }

    async fn find_participant(&self, id: &NationalId, max_pages: usize) -> Result<bool> {
        Ok(self.table.find_row(&self.dom, id, max_pages).await?.is_some())
    }

    async fn quick_enroll(&self, id: &NationalId) -> Result<bool> {
        self.enrollment.quick_enroll(&self.dom, id).await
    }

    async fn open_enrollment_form(&self) -> Result<bool> {
        let mut open_form = self.open_form.lock().await;
        *open_form = self.enrollment.open_enrollment_form(&self.dom).await?;
        Ok(open_form.is_some())
    }

    async fn fill_enrollment_form(&self, entry: &RosterEntry) -> Result<FormFill> {
        let open_form = self.open_form.lock().await;
        match open_form.as_ref() {
            Some(form) => self.enrollment.fill_enrollment_form(&self.dom, form, entry).await,
            None => {
                warn!("no enrollment form open for {}", entry.national_id);
                Ok(FormFill::default())
            }
        }
    }

    async fn submit_enrollment_form(&self) -> Result<bool> {
        let open_form = self.open_form.lock().await;
        match open_form.as_ref() {
            Some(form) => self.enrollment.submit_enrollment_form(&self.dom, form).await,
            None => Ok(false),
        }
    }

    async fn mark_attendance(&self, id: &NationalId, max_pages: usize) -> Result<bool> {
        self.table.mark_attendance(&self.dom, id, max_pages).await
    }

    async fn submit_attendance(&self) -> Result<bool> {
        self.table.submit_attendance(&self.dom).await
    }

    async fn return_home(&self) -> Result<()> {
        *self.open_form.lock().await = None;
        self.session.return_home(&self.dom).await
    }
}
