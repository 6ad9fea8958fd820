//! Participant flow - workflow layer
//!
//! One roster entry end to end: resolve enrollment, then mark attendance.
//! Attendance is only attempted once the table has confirmed the ID.

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::models::RosterEntry;
use crate::services::Portal;
use crate::workflow::enrollment::{EnrollmentResolver, EnrollmentState};
use crate::workflow::group_ctx::GroupCtx;

/// Result of processing one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantOutcome {
    /// Terminal enrollment state
    pub state: EnrollmentState,
    /// Attendance box checked
    pub marked: bool,
}

/// Participant flow
///
/// - orchestrates resolver then marker
/// - holds no page; every portal access goes through `Portal`
pub struct ParticipantFlow {
    resolver: EnrollmentResolver,
    max_pages: usize,
}

impl ParticipantFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: EnrollmentResolver::new(config.max_pages),
            max_pages: config.max_pages,
        }
    }

    pub async fn run<P: Portal + ?Sized>(
        &self,
        portal: &P,
        entry: &RosterEntry,
        ctx: &GroupCtx,
    ) -> Result<ParticipantOutcome> {
        info!("{} 👤 {} ({})", ctx, entry.full_name, entry.national_id);

        let state = self.resolver.resolve(portal, entry, ctx).await?;
        if !state.is_listed() {
            warn!(
                "{} ❌ {} could not be enrolled, attendance skipped",
                ctx, entry.national_id
            );
            return Ok(ParticipantOutcome {
                state,
                marked: false,
            });
        }

        let marked = portal
            .mark_attendance(&entry.national_id, self.max_pages)
            .await?;
        if marked {
            info!("{} ✔ attendance checked for {}", ctx, entry.national_id);
        } else {
            warn!("{} ⚠️ could not check attendance for {}", ctx, entry.national_id);
        }

        Ok(ParticipantOutcome { state, marked })
    }
}
