pub mod dates;
pub mod logging;
