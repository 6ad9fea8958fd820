pub mod national_id;
pub mod roster;

pub use national_id::NationalId;
pub use roster::{Group, GroupKey, Roster, RosterEntry};
