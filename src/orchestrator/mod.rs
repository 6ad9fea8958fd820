//! Orchestration layer
//!
//! ## Modules
//!
//! ### `run_processor` - application entry
//! - validates configuration, reads the roster
//! - owns the browser session and the logged-in portal
//! - prints the run summary
//!
//! ### `group_processor` - one (building, section) group
//! - navigates to the group's program screen
//! - runs every entry through `ParticipantFlow`
//! - submits the group's attendance and returns home
//!
//! ## Layering
//!
//! ```text
//! run_processor (Roster)
//!     ↓
//! group_processor (Group)
//!     ↓
//! workflow::ParticipantFlow (RosterEntry)
//!     ↓
//! services (Portal: navigation / table / enrollment)
//!     ↓
//! infrastructure (Dom, JsExecutor)
//! ```

pub mod group_processor;
pub mod run_processor;

pub use group_processor::{process_group, run_groups, GroupStats, RunStats};
pub use run_processor::App;
