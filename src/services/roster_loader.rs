//! Roster loader - business capability layer
//!
//! Turns sheet records into the grouped roster for one date.

use crate::clients::SheetRecord;
use crate::models::{GroupKey, NationalId, Roster, RosterEntry};
use crate::utils::dates::parse_date_or;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Gender used when the sheet leaves it blank
pub const DEFAULT_GENDER: &str = "Femenino";

/// Where raw roster rows come from
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self) -> Result<Vec<SheetRecord>>;
}

/// Roster loader
pub struct RosterLoader<S> {
    source: S,
}

impl<S: RecordSource> RosterLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch records and keep the ones for `target`
    ///
    /// # Arguments
    /// - `target`: attendance date
    /// - `today`: fallback for cells no format can read
    pub async fn load(&self, target: NaiveDate, today: NaiveDate) -> Result<Roster> {
        let records = self
            .source
            .fetch_records()
            .await
            .context("failed to read roster records")?;
        let roster = build_roster(&records, target, today);
        info!(
            "✓ {} participants in {} groups for {}",
            roster.total(),
            roster.groups().len(),
            target
        );
        Ok(roster)
    }
}

/// Filter and group records
///
/// Rows whose date differs from `target`, or with a blank last name, first
/// name, ID, building or section, are dropped without error.
pub fn build_roster(records: &[SheetRecord], target: NaiveDate, today: NaiveDate) -> Roster {
    let mut roster = Roster::new();

    for (i, record) in records.iter().enumerate() {
        // header is sheet row 1
        let row_number = i + 2;

        let date = parse_date_or(field(record, "FECHA"), today);
        if date != target {
            continue;
        }

        let last_name = field(record, "APELLIDO").trim();
        let first_name = field(record, "NOMBRE").trim();
        let national_id = NationalId::normalize(field(record, "RUT"));
        let building = field(record, "EDIFICIO").trim();
        let section = field(record, "SECCION").trim();

        if last_name.is_empty()
            || first_name.is_empty()
            || national_id.is_empty()
            || building.is_empty()
            || section.is_empty()
        {
            debug!("row {} skipped: missing required field", row_number);
            continue;
        }

        let gender = record
            .get("GENERO")
            .or_else(|| record.get("GÉNERO"))
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .unwrap_or(DEFAULT_GENDER);

        roster.push(
            GroupKey::new(building, section),
            RosterEntry::new(last_name, first_name, national_id, gender, date),
        );
    }

    roster
}

fn field<'a>(record: &'a SheetRecord, name: &str) -> &'a str {
    record.get(name).map(String::as_str).unwrap_or("")
}
