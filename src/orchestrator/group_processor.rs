//! Group processor - orchestration layer
//!
//! ## Responsibilities
//!
//! 1. **Navigation**: facility panel → building → section → program
//! 2. **Entries**: run every entry of the group through `ParticipantFlow`
//! 3. **Batch submit**: send the group's attendance once
//! 4. **Containment**: a failed group is logged and the run moves on
//! 5. **Statistics**: per group and for the whole run

use crate::config::Config;
use crate::error::{BrowserError, NavigationError};
use crate::models::{Group, Roster};
use crate::services::Portal;
use crate::utils::logging::log_group_start;
use crate::workflow::{EnrollmentState, GroupCtx, ParticipantFlow, ParticipantOutcome};
use anyhow::Result;
use tracing::{error, info, warn};

/// Per-group counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GroupStats {
    /// Listed before the run touched them
    pub already_present: usize,
    /// Enrolled by this run
    pub enrolled: usize,
    pub enroll_failed: usize,
    pub marked: usize,
    /// Listed (or errored) but attendance not checked
    pub not_marked: usize,
}

impl GroupStats {
    fn record(&mut self, outcome: &ParticipantOutcome) {
        match outcome.state {
            EnrollmentState::Present => self.already_present += 1,
            EnrollmentState::Enrolled => self.enrolled += 1,
            EnrollmentState::EnrollFailed => self.enroll_failed += 1,
            _ => {}
        }
        if outcome.marked {
            self.marked += 1;
        } else if outcome.state.is_listed() {
            self.not_marked += 1;
        }
    }

    /// Entries that ended without attendance
    pub fn failed(&self) -> usize {
        self.enroll_failed + self.not_marked
    }
}

/// Whole-run counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub groups_ok: usize,
    pub groups_failed: usize,
    pub marked: usize,
    pub failed: usize,
}

/// Process one group, from the home screen to the batch submit
///
/// # Arguments
/// - `portal`: logged-in portal on the home screen
/// - `group`: entries sharing building and section
/// - `ctx`: group position, for logs
/// - `config`: run configuration
///
/// # Returns
/// Group statistics; `Err` when navigation or the batch submit broke
pub async fn process_group<P: Portal + ?Sized>(
    portal: &P,
    group: &Group,
    ctx: &GroupCtx,
    config: &Config,
) -> Result<GroupStats> {
    log_group_start(&ctx.to_string(), group.entries.len());

    // ========== Navigation ==========
    portal.open_facility_panel().await?;
    portal.enter_building(&group.key.building).await?;
    portal.enter_section(&group.key.section).await?;
    portal.enter_program().await?;

    // ========== Entries ==========
    let flow = ParticipantFlow::new(config);
    let mut stats = GroupStats::default();

    for entry in &group.entries {
        match flow.run(portal, entry, ctx).await {
            Ok(outcome) => stats.record(&outcome),
            Err(e) => {
                error!("{} {} failed: {:#}", ctx, entry.national_id, e);
                stats.not_marked += 1;
            }
        }
    }

    // ========== Batch submit ==========
    if stats.marked == 0 {
        warn!("{} nothing checked, submitting anyway", ctx);
    }
    if !portal.submit_attendance().await? {
        warn!("{} ⚠️ attendance was not submitted", ctx);
    }

    log_group_complete(ctx, &stats, group.entries.len());
    Ok(stats)
}

/// Process every group in roster order, then come back home
///
/// A failing group only costs that group.
pub async fn run_groups<P: Portal + ?Sized>(portal: &P, roster: &Roster, config: &Config) -> RunStats {
    let mut run = RunStats::default();
    let group_count = roster.groups().len();

    for (index, group) in roster.groups().iter().enumerate() {
        let ctx = GroupCtx::new(index + 1, group_count, group.key.clone());

        match process_group(portal, group, &ctx, config).await {
            Ok(stats) => {
                run.groups_ok += 1;
                run.marked += stats.marked;
                run.failed += stats.failed();
            }
            Err(e) => {
                error!("{} ❌ group aborted ({}): {:#}", ctx, abort_reason(&e), e);
                run.groups_failed += 1;
                run.failed += group.entries.len();
            }
        }

        if let Err(e) = portal.return_home().await {
            warn!("{} could not return home: {:#}", ctx, e);
        }
    }

    run
}

// ========== Logging helpers ==========

/// Short cause of a group abort, for the log line
fn abort_reason(e: &anyhow::Error) -> &'static str {
    match e.downcast_ref::<NavigationError>() {
        Some(NavigationError::HomeUnreachable) => "lost the home screen",
        Some(_) => "navigation",
        None if e.downcast_ref::<BrowserError>().is_some() => "browser",
        None => "page",
    }
}

fn log_group_complete(ctx: &GroupCtx, stats: &GroupStats, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ {} done: {}/{} marked", ctx, stats.marked, total);
    info!(
        "   already listed: {} | enrolled now: {} | enroll failed: {} | not marked: {}",
        stats.already_present, stats.enrolled, stats.enroll_failed, stats.not_marked
    );
    info!("{}", "─".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GroupKey;
    use crate::testing::{entry, Call, FakePortal};
    use anyhow::Context;

    /// One (building, section, raw id) per entry
    fn roster(rows: &[(&str, &str, &str)]) -> Roster {
        let mut roster = Roster::new();
        for (building, section, id) in rows {
            roster.push(GroupKey::new(*building, *section), entry(id));
        }
        roster
    }

    #[tokio::test]
    async fn test_listed_entry_marks_once_and_submits_once() {
        let portal = FakePortal::new().with_listed(&["12345678-K"]);
        let roster = roster(&[("A", "101", "12345678K")]);

        let run = run_groups(&portal, &roster, &Config::default()).await;

        assert_eq!(run, RunStats { groups_ok: 1, groups_failed: 0, marked: 1, failed: 0 });
        assert_eq!(
            portal.calls(),
            vec![
                Call::OpenFacility,
                Call::Building("A".into()),
                Call::Section("101".into()),
                Call::Program,
                Call::Find("12345678-K".into(), 8),
                Call::Mark("12345678-K".into()),
                Call::SubmitAttendance,
                Call::ReturnHome,
            ]
        );
    }

    #[tokio::test]
    async fn test_unlisted_entry_without_quick_popup_uses_form_and_is_not_marked() {
        let portal = FakePortal::new();
        let roster = roster(&[("A", "101", "7654321-0")]);

        let run = run_groups(&portal, &roster, &Config::default()).await;

        assert_eq!(run.failed, 1);
        assert_eq!(run.marked, 0);
        assert_eq!(portal.count(|c| *c == Call::OpenForm), 1);
        assert_eq!(portal.count(|c| matches!(c, Call::FillForm(_))), 1);
        assert_eq!(portal.count(|c| matches!(c, Call::Mark(_))), 0);
        // the group still sends its (empty) batch
        assert_eq!(portal.count(|c| *c == Call::SubmitAttendance), 1);
    }

    #[tokio::test]
    async fn test_broken_group_does_not_stop_the_next() {
        let portal = FakePortal::new()
            .with_broken_building("B")
            .with_listed(&["2-7"]);
        let roster = roster(&[("B", "201", "1-9"), ("A", "101", "2-7")]);

        let run = run_groups(&portal, &roster, &Config::default()).await;

        assert_eq!(run, RunStats { groups_ok: 1, groups_failed: 1, marked: 1, failed: 1 });
        assert_eq!(portal.count(|c| *c == Call::ReturnHome), 2);
        assert_eq!(portal.count(|c| *c == Call::SubmitAttendance), 1);
        assert!(portal.calls().contains(&Call::Mark("2-7".into())));
    }

    #[test]
    fn test_abort_reason_tells_navigation_from_page_errors() {
        let lost: anyhow::Error = NavigationError::not_found("section", "101").into();
        assert_eq!(abort_reason(&lost), "navigation");

        let wrapped = Err::<(), _>(NavigationError::DestinationNotReached { step: "program" })
            .context("group A / 101")
            .unwrap_err();
        assert_eq!(abort_reason(&wrapped), "navigation");

        let home: anyhow::Error = NavigationError::HomeUnreachable.into();
        assert_eq!(abort_reason(&home), "lost the home screen");

        let browser: anyhow::Error = BrowserError::LoginFailed("no marker".into()).into();
        assert_eq!(abort_reason(&browser), "browser");

        assert_eq!(abort_reason(&anyhow::anyhow!("script threw")), "page");
    }

    #[test]
    fn test_group_stats_counts_outcomes() {
        let mut stats = GroupStats::default();
        stats.record(&ParticipantOutcome { state: EnrollmentState::Present, marked: true });
        stats.record(&ParticipantOutcome { state: EnrollmentState::Enrolled, marked: false });
        stats.record(&ParticipantOutcome { state: EnrollmentState::EnrollFailed, marked: false });

        assert_eq!(stats.already_present, 1);
        assert_eq!(stats.enrolled, 1);
        assert_eq!(stats.marked, 1);
        assert_eq!(stats.not_marked, 1);
        assert_eq!(stats.failed(), 2);
    }
}
