//! Enrollment resolution - workflow layer
//!
//! Decides, for one roster entry, whether the portal already lists it and
//! otherwise enrolls it: quick popup first, full form as the fallback.
//!
//! ```text
//! NotChecked ──found──▶ Present
//!     │ missing
//!     ▼
//! AbsentFastPending ──quick enroll + found──▶ Enrolled
//!     │ otherwise
//!     ▼
//! AbsentFormPending ──form (+ one resubmit) + found──▶ Enrolled
//!     │ otherwise
//!     ▼
//! EnrollFailed
//! ```

use crate::models::RosterEntry;
use crate::services::Portal;
use crate::workflow::group_ctx::GroupCtx;
use anyhow::Result;
use tracing::{debug, info, warn};

/// Pages re-read after a quick enrollment
pub const QUICK_RECHECK_PAGES: usize = 4;

/// Where an entry stands with respect to the portal table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentState {
    NotChecked,
    /// Listed before anything was done
    Present,
    AbsentFastPending,
    AbsentFormPending,
    /// Listed after this run enrolled it
    Enrolled,
    EnrollFailed,
}

impl EnrollmentState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EnrollmentState::Present | EnrollmentState::Enrolled | EnrollmentState::EnrollFailed
        )
    }

    /// Confirmed in the table, so attendance may be marked
    pub fn is_listed(self) -> bool {
        matches!(self, EnrollmentState::Present | EnrollmentState::Enrolled)
    }
}

/// Enrollment state machine driver
pub struct EnrollmentResolver {
    max_pages: usize,
}

impl EnrollmentResolver {
    pub fn new(max_pages: usize) -> Self {
        Self { max_pages }
    }

    /// Run the state machine to a terminal state
    ///
    /// Only the first table query can fail the call; enrollment trouble
    /// ends in `EnrollFailed` instead.
    pub async fn resolve<P: Portal + ?Sized>(
        &self,
        portal: &P,
        entry: &RosterEntry,
        ctx: &GroupCtx,
    ) -> Result<EnrollmentState> {
        let mut state = EnrollmentState::NotChecked;
        while !state.is_terminal() {
            let next = self.step(portal, entry, state).await?;
            debug!("{} {}: {:?} -> {:?}", ctx, entry.national_id, state, next);
            state = next;
        }
        Ok(state)
    }

    /// One transition
    pub async fn step<P: Portal + ?Sized>(
        &self,
        portal: &P,
        entry: &RosterEntry,
        state: EnrollmentState,
    ) -> Result<EnrollmentState> {
        let id = &entry.national_id;
        let next = match state {
            EnrollmentState::NotChecked => {
                if portal.find_participant(id, self.max_pages).await? {
                    EnrollmentState::Present
                } else {
                    info!("🔎 {} not listed, enrolling", id);
                    EnrollmentState::AbsentFastPending
                }
            }
            EnrollmentState::AbsentFastPending => match self.quick_path(portal, entry).await {
                Ok(true) => EnrollmentState::Enrolled,
                Ok(false) => EnrollmentState::AbsentFormPending,
                Err(e) => {
                    warn!("quick enrollment of {} failed: {}", id, e);
                    EnrollmentState::AbsentFormPending
                }
            },
            EnrollmentState::AbsentFormPending => match self.form_path(portal, entry).await {
                Ok(true) => EnrollmentState::Enrolled,
                Ok(false) => EnrollmentState::EnrollFailed,
                Err(e) => {
                    warn!("form enrollment of {} failed: {}", id, e);
                    EnrollmentState::EnrollFailed
                }
            },
            terminal => terminal,
        };
        Ok(next)
    }

    async fn quick_path<P: Portal + ?Sized>(&self, portal: &P, entry: &RosterEntry) -> Result<bool> {
        let id = &entry.national_id;
        if !portal.quick_enroll(id).await? {
            return Ok(false);
        }
        let listed = portal.find_participant(id, QUICK_RECHECK_PAGES).await?;
        if listed {
            info!("✓ {} enrolled via quick popup", id);
        } else {
            debug!("{} still missing after quick popup", id);
        }
        Ok(listed)
    }

    async fn form_path<P: Portal + ?Sized>(&self, portal: &P, entry: &RosterEntry) -> Result<bool> {
        let id = &entry.national_id;
        if !portal.open_enrollment_form().await? {
            warn!("enrollment form for {} did not open", id);
            return Ok(false);
        }

        let filled = portal.fill_enrollment_form(entry).await?;
        if !filled.national_id {
            warn!("enrollment form has no ID field for {}", id);
        }

        if !portal.submit_enrollment_form().await? {
            return Ok(false);
        }
        if portal.find_participant(id, self.max_pages).await? {
            info!("✓ {} enrolled via form", id);
            return Ok(true);
        }

        warn!("{} not listed after submit, resubmitting once", id);
        if !portal.submit_enrollment_form().await? {
            return Ok(false);
        }
        let listed = portal.find_participant(id, self.max_pages).await?;
        if listed {
            info!("✓ {} enrolled via form (second submit)", id);
        }
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupKey;
    use crate::testing::{entry, Call, FakePortal};

    fn ctx() -> GroupCtx {
        GroupCtx::new(1, 1, GroupKey::new("A", "101"))
    }

    fn enrollment_calls(portal: &FakePortal) -> usize {
        portal.count(|c| {
            matches!(
                c,
                Call::QuickEnroll(_) | Call::OpenForm | Call::FillForm(_) | Call::SubmitForm
            )
        })
    }

    #[tokio::test]
    async fn test_present_entry_never_enrolls() {
        let portal = FakePortal::new().with_listed(&["12345678-K"]);
        let state = EnrollmentResolver::new(8)
            .resolve(&portal, &entry("12345678K"), &ctx())
            .await
            .unwrap();

        assert_eq!(state, EnrollmentState::Present);
        assert_eq!(enrollment_calls(&portal), 0);
        assert_eq!(portal.calls(), vec![Call::Find("12345678-K".into(), 8)]);
    }

    #[tokio::test]
    async fn test_quick_path_rechecks_four_pages() {
        let portal = FakePortal::new().with_quick_enroll();
        let state = EnrollmentResolver::new(8)
            .resolve(&portal, &entry("7654321-0"), &ctx())
            .await
            .unwrap();

        assert_eq!(state, EnrollmentState::Enrolled);
        assert_eq!(
            portal.calls(),
            vec![
                Call::Find("7654321-0".into(), 8),
                Call::QuickEnroll("7654321-0".into()),
                Call::Find("7654321-0".into(), QUICK_RECHECK_PAGES),
            ]
        );
    }

    #[tokio::test]
    async fn test_form_path_when_quick_control_missing() {
        let portal = FakePortal::new().with_form_enrolling_after(1);
        let state = EnrollmentResolver::new(8)
            .resolve(&portal, &entry("7654321-0"), &ctx())
            .await
            .unwrap();

        assert_eq!(state, EnrollmentState::Enrolled);
        assert_eq!(portal.count(|c| *c == Call::OpenForm), 1);
        assert_eq!(portal.count(|c| *c == Call::SubmitForm), 1);
    }

    #[tokio::test]
    async fn test_form_resubmits_once() {
        let portal = FakePortal::new().with_form_enrolling_after(2);
        let state = EnrollmentResolver::new(8)
            .resolve(&portal, &entry("7654321-0"), &ctx())
            .await
            .unwrap();

        assert_eq!(state, EnrollmentState::Enrolled);
        assert_eq!(portal.count(|c| *c == Call::SubmitForm), 2);
    }

    #[tokio::test]
    async fn test_form_never_listing_fails_after_two_submits() {
        let portal = FakePortal::new();
        let state = EnrollmentResolver::new(8)
            .resolve(&portal, &entry("7654321-0"), &ctx())
            .await
            .unwrap();

        assert_eq!(state, EnrollmentState::EnrollFailed);
        assert_eq!(portal.count(|c| *c == Call::SubmitForm), 2);
        assert_eq!(portal.count(|c| matches!(c, Call::Mark(_))), 0);
    }

    #[tokio::test]
    async fn test_resubmit_after_form_closed_goes_nowhere() {
        let portal = FakePortal::new().with_form_closing_on_submit();
        let state = EnrollmentResolver::new(8)
            .resolve(&portal, &entry("7654321-0"), &ctx())
            .await
            .unwrap();

        assert_eq!(state, EnrollmentState::EnrollFailed);
        assert_eq!(portal.count(|c| *c == Call::SubmitForm), 2);
        assert_eq!(portal.form_submits(), 1);
        // a refused resubmit skips the second table search
        assert_eq!(portal.count(|c| matches!(c, Call::Find(..))), 2);
    }

    #[tokio::test]
    async fn test_quick_error_falls_through_to_form() {
        let portal = FakePortal::new()
            .with_quick_error()
            .with_form_enrolling_after(1);
        let state = EnrollmentResolver::new(8)
            .resolve(&portal, &entry("7654321-0"), &ctx())
            .await
            .unwrap();

        assert_eq!(state, EnrollmentState::Enrolled);
        assert_eq!(portal.count(|c| *c == Call::OpenForm), 1);
    }

    #[tokio::test]
    async fn test_missing_form_is_terminal_failure() {
        let portal = FakePortal::new().without_form();
        let state = EnrollmentResolver::new(8)
            .resolve(&portal, &entry("7654321-0"), &ctx())
            .await
            .unwrap();

        assert_eq!(state, EnrollmentState::EnrollFailed);
        assert_eq!(portal.count(|c| *c == Call::SubmitForm), 0);
    }

    #[test]
    fn test_terminal_states() {
        assert!(EnrollmentState::Present.is_terminal());
        assert!(EnrollmentState::EnrollFailed.is_terminal());
        assert!(!EnrollmentState::AbsentFormPending.is_terminal());
        assert!(!EnrollmentState::EnrollFailed.is_listed());
        assert!(EnrollmentState::Enrolled.is_listed());
    }
}
