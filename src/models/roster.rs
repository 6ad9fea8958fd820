//! Roster data: entries grouped by (building, section)

use crate::models::national_id::NationalId;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

/// One participant to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// "{last_name} {first_name}"
    pub full_name: String,
    pub last_name: String,
    pub first_name: String,
    pub national_id: NationalId,
    pub gender: String,
    pub date: NaiveDate,
}

impl RosterEntry {
    pub fn new(
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        national_id: NationalId,
        gender: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        let last_name = last_name.into();
        let first_name = first_name.into();
        Self {
            full_name: format!("{} {}", last_name, first_name),
            last_name,
            first_name,
            national_id,
            gender: gender.into(),
            date,
        }
    }
}

/// Grouping key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    /// Building letter/identifier as written in the sheet
    pub building: String,
    /// Section name as written in the sheet
    pub section: String,
}

impl GroupKey {
    pub fn new(building: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            building: building.into(),
            section: section.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BUILDING {} / SECTION {}", self.building, self.section)
    }
}

/// Entries sharing one batch attendance submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: GroupKey,
    pub entries: Vec<RosterEntry>,
}

/// Groups in first-appearance order
#[derive(Debug, Clone, Default)]
pub struct Roster {
    groups: Vec<Group>,
    index: HashMap<GroupKey, usize>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to its group, creating the group on first sight
    pub fn push(&mut self, key: GroupKey, entry: RosterEntry) {
        match self.index.get(&key) {
            Some(&i) => self.groups[i].entries.push(entry),
            None => {
                self.index.insert(key.clone(), self.groups.len());
                self.groups.push(Group {
                    key,
                    entries: vec![entry],
                });
            }
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn get(&self, key: &GroupKey) -> Option<&Group> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    /// Total entries across all groups
    pub fn total(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
