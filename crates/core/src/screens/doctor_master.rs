//! Doctor master data: list, filter, create, edit and delete.

use crate::models::Doctor;
use crate::notice::{confirmed, Confirm, Notice};
use crate::validation::require_fields;
use crate::{numbering, HmsError, HmsResult};
use std::collections::HashSet;

/// The request a save resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum DoctorSave {
    Create(Doctor),
    Update(i64, Doctor),
}

impl DoctorSave {
    pub fn doctor(&self) -> &Doctor {
        match self {
            DoctorSave::Create(d) | DoctorSave::Update(_, d) => d,
        }
    }
}

/// Header counters of the doctor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DoctorCounts {
    pub total: usize,
    pub active: usize,
    pub departments: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DoctorMasterScreen {
    doctors: Vec<Doctor>,
    pub form: Doctor,
    editing: Option<i64>,
    pub search_term: String,
}

impl DoctorMasterScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    /// `Some(id)` while an existing doctor is being edited.
    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn apply_doctors(&mut self, doctors: Vec<Doctor>) {
        self.doctors = doctors;
    }

    /// Doctors matching the search term; a blank term matches everyone.
    pub fn filtered(&self) -> Vec<&Doctor> {
        let term = self.search_term.trim();
        self.doctors
            .iter()
            .filter(|d| term.is_empty() || d.matches(term))
            .collect()
    }

    pub fn counts(&self) -> DoctorCounts {
        let departments: HashSet<&str> = self.doctors.iter().map(|d| d.department.as_str()).collect();
        DoctorCounts {
            total: self.doctors.len(),
            active: self.doctors.iter().filter(|d| d.is_active()).count(),
            departments: departments.len(),
        }
    }

    /// Opens an empty form for a new doctor.
    pub fn start_new(&mut self) {
        self.form = Doctor::default();
        self.editing = None;
    }

    /// Loads a listed doctor into the form for editing.
    ///
    /// # Errors
    ///
    /// `HmsError::InvalidInput` if no listed doctor has `id`.
    pub fn start_edit(&mut self, id: i64) -> HmsResult<()> {
        let doctor = self
            .doctors
            .iter()
            .find(|d| d.id == Some(id))
            .cloned()
            .ok_or_else(|| HmsError::InvalidInput(format!("no doctor with id {id}")))?;
        self.form = doctor;
        self.editing = Some(id);
        Ok(())
    }

    /// Validates the form and resolves it to a create or an update.
    ///
    /// A new doctor without a code gets a generated `DRNNNN` code.
    ///
    /// # Errors
    ///
    /// `HmsError::MissingFields` naming the blank required fields.
    pub fn prepare_save(&self) -> HmsResult<DoctorSave> {
        let mut doctor = self.form.clone();
        if self.editing.is_none() && doctor.code.trim().is_empty() {
            doctor.code = numbering::doctor_code(&mut rand::thread_rng());
        }
        require_fields(&[
            ("code", &doctor.code),
            ("name", &doctor.name),
            ("specialty", &doctor.specialty),
            ("department", &doctor.department),
        ])?;
        if doctor.resignation_date.as_deref().is_some_and(|d| d.trim().is_empty()) {
            doctor.resignation_date = None;
        }

        Ok(match self.editing {
            Some(id) => {
                doctor.id = Some(id);
                DoctorSave::Update(id, doctor)
            }
            None => {
                doctor.id = None;
                DoctorSave::Create(doctor)
            }
        })
    }

    /// Resets the form after a save. The caller reloads the list.
    pub fn apply_saved(&mut self, save: &DoctorSave) -> Notice {
        self.start_new();
        match save {
            DoctorSave::Create(_) => Notice::success("Doctor added successfully"),
            DoctorSave::Update(..) => Notice::success("Doctor updated successfully"),
        }
    }

    /// Confirms deleting a listed doctor and returns its id.
    ///
    /// # Errors
    ///
    /// `HmsError::InvalidInput` for an unknown id, `HmsError::Declined` when declined.
    pub fn request_delete(&self, id: i64, confirm: &mut impl Confirm) -> HmsResult<i64> {
        if !self.doctors.iter().any(|d| d.id == Some(id)) {
            return Err(HmsError::InvalidInput(format!("no doctor with id {id}")));
        }
        confirmed(confirm, "Are you sure you want to delete this doctor?")?;
        Ok(id)
    }

    pub fn apply_deleted(&mut self, id: i64) -> Notice {
        self.doctors.retain(|d| d.id != Some(id));
        if self.editing == Some(id) {
            self.start_new();
        }
        Notice::success("Doctor deleted successfully")
    }
}
