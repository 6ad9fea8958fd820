//! # Asistencia ViBi
//!
//! Registers a day's attendance in the wellness portal from a Google Sheet
//! roster, enrolling participants the portal does not list yet.
//!
//! ## Layers
//!
//! ### ① Infrastructure
//! - `infrastructure/` - owns the page, exposes capabilities only
//! - `JsExecutor` - sole page owner: eval, navigation, trusted clicks
//! - `Locator` / `Dom` - element queries and actions returning `Result<bool>`
//!
//! ### ② Services
//! - `services/` - what can be done on one screen, for one participant
//! - `Portal` - the seam the workflow talks to (`ChromePortal` in production)
//! - `RosterLoader` - sheet records → grouped roster
//!
//! ### ③ Workflow
//! - `workflow/` - one roster entry end to end
//! - `EnrollmentResolver` - listed? quick popup? full form?
//! - `ParticipantFlow` - resolve, then mark attendance
//!
//! ### ④ Orchestration
//! - `orchestrator/group_processor` - one (building, section) group
//! - `orchestrator/run_processor` - the whole run, owns the browser

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{AppError, BrowserError, ConfigError, NavigationError, SheetError};
pub use models::{Group, GroupKey, NationalId, Roster, RosterEntry};
pub use orchestrator::{App, RunStats};
pub use services::{ChromePortal, Portal};
pub use workflow::{EnrollmentState, ParticipantFlow};
