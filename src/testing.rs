//! In-memory portal for workflow and orchestration tests

use crate::error::NavigationError;
use crate::models::{NationalId, RosterEntry};
use crate::services::{FormFill, Portal};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Mutex;

/// Portal interactions, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    OpenFacility,
    Building(String),
    Section(String),
    Program,
    Find(String, usize),
    QuickEnroll(String),
    OpenForm,
    FillForm(String),
    SubmitForm,
    Mark(String),
    SubmitAttendance,
    ReturnHome,
}

#[derive(Debug, Default)]
struct State {
    listed: HashSet<String>,
    quick_available: bool,
    quick_error: bool,
    form_missing: bool,
    /// Form submits after which the filled ID shows up in the table
    form_lists_after: Option<usize>,
    form_submits: usize,
    form_id: Option<String>,
    form_open: bool,
    /// The modal closes after each submit (e.g. on a confirmation)
    form_closes_on_submit: bool,
    broken_buildings: HashSet<String>,
    calls: Vec<Call>,
}

/// Scriptable `Portal`
///
/// Defaults: empty table, no quick popup, a form that opens but never lists.
#[derive(Debug, Default)]
pub struct FakePortal {
    state: Mutex<State>,
}

impl FakePortal {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_listed(self, ids: &[&str]) -> Self {
        self.with(|s| s.listed.extend(ids.iter().map(|id| id.to_string())))
    }

    /// Quick popup present and effective
    pub fn with_quick_enroll(self) -> Self {
        self.with(|s| s.quick_available = true)
    }

    pub fn with_quick_error(self) -> Self {
        self.with(|s| s.quick_error = true)
    }

    pub fn with_form_enrolling_after(self, submits: usize) -> Self {
        self.with(|s| s.form_lists_after = Some(submits))
    }

    pub fn with_form_closing_on_submit(self) -> Self {
        self.with(|s| s.form_closes_on_submit = true)
    }

    pub fn without_form(self) -> Self {
        self.with(|s| s.form_missing = true)
    }

    pub fn with_broken_building(self, building: &str) -> Self {
        self.with(|s| {
            s.broken_buildings.insert(building.to_string());
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Submits that reached an open form
    pub fn form_submits(&self) -> usize {
        self.state.lock().unwrap().form_submits
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    fn log(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, State> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl Portal for FakePortal {
    async fn open_facility_panel(&self) -> Result<()> {
        self.log(Call::OpenFacility);
        Ok(())
    }

    async fn enter_building(&self, building: &str) -> Result<()> {
        let state = self.record(Call::Building(building.to_string()));
        if state.broken_buildings.contains(building) {
            return Err(NavigationError::not_found("building", building).into());
        }
        Ok(())
    }

    async fn enter_section(&self, section: &str) -> Result<()> {
        self.log(Call::Section(section.to_string()));
        Ok(())
    }

    async fn enter_program(&self) -> Result<()> {
        self.log(Call::Program);
        Ok(())
    }

    async fn find_participant(&self, id: &NationalId, max_pages: usize) -> Result<bool> {
        let state = self.record(Call::Find(id.to_string(), max_pages));
        Ok(state.listed.contains(id.as_str()))
    }

    async fn quick_enroll(&self, id: &NationalId) -> Result<bool> {
        let mut state = self.record(Call::QuickEnroll(id.to_string()));
        if state.quick_error {
            return Err(anyhow!("popup detached"));
        }
        if !state.quick_available {
            return Ok(false);
        }
        state.listed.insert(id.to_string());
        Ok(true)
    }

    async fn open_enrollment_form(&self) -> Result<bool> {
        let mut state = self.record(Call::OpenForm);
        state.form_open = !state.form_missing;
        Ok(state.form_open)
    }

    async fn fill_enrollment_form(&self, entry: &RosterEntry) -> Result<FormFill> {
        let mut state = self.record(Call::FillForm(entry.national_id.to_string()));
        state.form_id = Some(entry.national_id.to_string());
        Ok(FormFill {
            name: true,
            national_id: true,
            gender: true,
        })
    }

    async fn submit_enrollment_form(&self) -> Result<bool> {
        let mut state = self.record(Call::SubmitForm);
        if !state.form_open {
            return Ok(false);
        }
        state.form_submits += 1;
        if state.form_closes_on_submit {
            state.form_open = false;
        }
        if state.form_lists_after.is_some_and(|n| state.form_submits >= n) {
            if let Some(id) = state.form_id.clone() {
                state.listed.insert(id);
            }
        }
        Ok(true)
    }

    async fn mark_attendance(&self, id: &NationalId, _max_pages: usize) -> Result<bool> {
        let state = self.record(Call::Mark(id.to_string()));
        Ok(state.listed.contains(id.as_str()))
    }

    async fn submit_attendance(&self) -> Result<bool> {
        self.log(Call::SubmitAttendance);
        Ok(true)
    }

    async fn return_home(&self) -> Result<()> {
        self.log(Call::ReturnHome);
        Ok(())
    }
}

/// Entry dated 2024-06-01 with the given raw ID
pub fn entry(raw_id: &str) -> RosterEntry {
    RosterEntry::new(
        "Pérez",
        "Ana",
        NationalId::normalize(raw_id),
        "Femenino",
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    )
}
