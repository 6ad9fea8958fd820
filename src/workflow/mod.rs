pub mod enrollment;
pub mod group_ctx;
pub mod participant_flow;

pub use enrollment::{EnrollmentResolver, EnrollmentState, QUICK_RECHECK_PAGES};
pub use group_ctx::GroupCtx;
pub use participant_flow::{ParticipantFlow, ParticipantOutcome};
