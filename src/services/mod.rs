pub mod enrollment_forms;
pub mod navigator;
pub mod overlays;
pub mod participant_table;
pub mod portal;
pub mod roster_loader;
pub mod session;

pub use enrollment_forms::{EnrollmentForms, FormFill};
pub use navigator::Navigator;
pub use participant_table::ParticipantTable;
pub use portal::{ChromePortal, Portal};
pub use roster_loader::{build_roster, RecordSource, RosterLoader};
pub use session::SessionDriver;
