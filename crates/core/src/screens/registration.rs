//! Patient registration.
//!
//! A create form with a candidate patient number on display and a duplicate-search assist:
//! the operator can look up existing patients and copy one into the form before saving.

use crate::models::{Doctor, Patient, PatientCreate, PatientForm, PatientKind};
use crate::notice::{confirmed, Confirm, Notice};
use crate::numbering;
use crate::validation::require_fields;
use crate::HmsResult;
use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

/// Search state of the duplicate-search assist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientSearch {
    pub term: String,
    pub results: Vec<Patient>,
    pub list_visible: bool,
    pub selected: Option<Patient>,
}

#[derive(Debug, Clone)]
pub struct RegistrationScreen {
    kind: PatientKind,
    pub form: PatientForm,
    candidate_number: String,
    doctors: Vec<Doctor>,
    pub search: PatientSearch,
}

impl RegistrationScreen {
    pub fn new(kind: PatientKind, today: NaiveDate) -> Self {
        Self {
            kind,
            form: PatientForm::default(),
            candidate_number: candidate(kind, today),
            doctors: Vec::new(),
            search: PatientSearch::default(),
        }
    }

    pub fn kind(&self) -> PatientKind {
        self.kind
    }

    /// The display-only number the next registration is shown under.
    pub fn candidate_number(&self) -> &str {
        &self.candidate_number
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    fn first_doctor_id(&self) -> i64 {
        self.doctors.first().and_then(|d| d.id).unwrap_or(0)
    }

    /// Stores the doctor lookup; the form defaults to the first doctor.
    pub fn apply_doctors(&mut self, doctors: Vec<Doctor>) {
        self.doctors = doctors;
        if self.form.doctor_id <= 0 {
            self.form.doctor_id = self.first_doctor_id();
        }
    }

    /// Switches between OP and IP registration.
    ///
    /// Clears the search state, drops the room when switching to OP and shows a fresh
    /// candidate number with the new prefix. Switching to the current kind changes nothing.
    pub fn switch_kind(&mut self, kind: PatientKind, today: NaiveDate) {
        if kind == self.kind {
            return;
        }
        self.kind = kind;
        if !kind.is_ip() {
            self.form.room.clear();
        }
        self.search = PatientSearch::default();
        self.candidate_number = candidate(kind, today);
    }

    /// Validates the form and builds the create payload.
    ///
    /// # Errors
    ///
    /// `HmsError::MissingFields` when a required field is blank; inpatients also need a room.
    pub fn prepare_submit(&self, now: NaiveDateTime) -> HmsResult<PatientCreate> {
        self.form.validate_required()?;
        if self.kind.is_ip() {
            require_fields(&[("room", &self.form.room)])?;
        }
        Ok(PatientCreate::from_form(
            &self.form,
            self.kind,
            self.candidate_number.clone(),
            now,
        ))
    }

    /// Resets the form after a successful registration.
    pub fn apply_submitted(&mut self, today: NaiveDate) -> Notice {
        let number = std::mem::take(&mut self.candidate_number);
        info!(kind = %self.kind, number = %number, "patient registered");
        self.reset(today);
        Notice::success(format!(
            "Patient registered successfully! {} Number: {}",
            self.kind.label(),
            number
        ))
    }

    /// Trimmed search term for `/patients/search`.
    ///
    /// # Errors
    ///
    /// `HmsError::MissingFields` when the term is blank.
    pub fn prepare_search(&self) -> HmsResult<String> {
        require_fields(&[("search term", &self.search.term)])?;
        Ok(self.search.term.trim().to_string())
    }

    pub fn apply_search(&mut self, results: Vec<Patient>) -> Notice {
        let notice = Notice::success(format!("Found {} patients", results.len()));
        self.search.results = results;
        self.search.list_visible = true;
        notice
    }

    /// Copies a found patient into the form. Address, referral and room are not carried over.
    pub fn select_patient(&mut self, patient: Patient) -> Notice {
        self.form = PatientForm {
            name: patient.name.clone(),
            age: patient.age.clone(),
            gender: patient.gender,
            complaint: patient.complaint.clone(),
            phone: patient.phone.clone(),
            doctor_id: patient.doctor_id,
            ..PatientForm::default()
        };
        let notice = Notice::success(format!("Loaded data for {}", patient.name));
        self.search.selected = Some(patient);
        self.search.list_visible = false;
        notice
    }

    /// Clears the form after confirmation.
    ///
    /// # Errors
    ///
    /// `HmsError::Declined` when the operator declines; nothing changes.
    pub fn clear(&mut self, today: NaiveDate, confirm: &mut impl Confirm) -> HmsResult<Notice> {
        confirmed(confirm, "Are you sure you want to clear this form?")?;
        self.reset(today);
        Ok(Notice::success("Form cleared successfully"))
    }

    fn reset(&mut self, today: NaiveDate) {
        self.form = PatientForm::with_doctor(self.first_doctor_id());
        self.search = PatientSearch::default();
        self.candidate_number = candidate(self.kind, today);
    }
}

fn candidate(kind: PatientKind, today: NaiveDate) -> String {
    numbering::patient_number(kind, today, &mut rand::thread_rng())
}

/// Notice text for a failed registration, by HTTP status.
///
/// A 401 never reaches this point: it tears the session down before any screen sees it.
pub fn failure_message(status: u16, detail: Option<&str>) -> String {
    match status {
        400 => detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("Invalid data. Please check all fields.")
            .to_string(),
        409 => "Patient with similar details already exists".into(),
        401 => "Session expired. Please login again.".into(),
        _ => "Registration failed. Please try again.".into(),
    }
}
