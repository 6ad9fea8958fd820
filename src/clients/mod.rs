pub mod service_account;
pub mod sheets_client;

pub use service_account::ServiceAccount;
pub use sheets_client::{records_from_values, SheetRecord, SheetsClient};
