//! Patient picker with per-field filtering.

use crate::models::Patient;
use crate::notice::Notice;
use crate::{HmsError, HmsResult};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatientFilterField {
    #[default]
    Name,
    OpNumber,
    IpNumber,
    Phone,
    Place,
    Room,
}

impl PatientFilterField {
    pub const ALL: [PatientFilterField; 6] = [
        PatientFilterField::Name,
        PatientFilterField::OpNumber,
        PatientFilterField::IpNumber,
        PatientFilterField::Phone,
        PatientFilterField::Place,
        PatientFilterField::Room,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PatientFilterField::Name => "Name",
            PatientFilterField::OpNumber => "OP Number",
            PatientFilterField::IpNumber => "IP Number",
            PatientFilterField::Phone => "Phone",
            PatientFilterField::Place => "Place",
            PatientFilterField::Room => "Room",
        }
    }

    fn value(self, patient: &Patient) -> &str {
        match self {
            PatientFilterField::Name => &patient.name,
            PatientFilterField::OpNumber => patient.op_number.as_deref().unwrap_or(""),
            PatientFilterField::IpNumber => patient.ip_number.as_deref().unwrap_or(""),
            PatientFilterField::Phone => &patient.phone,
            PatientFilterField::Place => &patient.place,
            PatientFilterField::Room => patient.room.as_deref().unwrap_or(""),
        }
    }
}

impl FromStr for PatientFilterField {
    type Err = HmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "name" => Ok(PatientFilterField::Name),
            "op_number" | "op" => Ok(PatientFilterField::OpNumber),
            "ip_number" | "ip" => Ok(PatientFilterField::IpNumber),
            "phone" => Ok(PatientFilterField::Phone),
            "place" => Ok(PatientFilterField::Place),
            "room" => Ok(PatientFilterField::Room),
            other => Err(HmsError::InvalidInput(format!("cannot filter patients by {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectPatientScreen {
    patients: Vec<Patient>,
    pub field: PatientFilterField,
    pub term: String,
    selected: Option<i64>,
}

impl SelectPatientScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_patients(&mut self, patients: Vec<Patient>) {
        self.patients = patients;
        if let Some(id) = self.selected {
            if !self.patients.iter().any(|p| p.id == id) {
                self.selected = None;
            }
        }
    }

    /// Patients whose chosen field contains the term, ignoring case.
    pub fn filtered(&self) -> Vec<&Patient> {
        let term = self.term.trim().to_lowercase();
        self.patients
            .iter()
            .filter(|p| term.is_empty() || self.field.value(p).to_lowercase().contains(&term))
            .collect()
    }

    /// Marks a listed patient as selected.
    ///
    /// # Errors
    ///
    /// `HmsError::InvalidInput` if no loaded patient has `id`.
    pub fn select(&mut self, id: i64) -> HmsResult<()> {
        if !self.patients.iter().any(|p| p.id == id) {
            return Err(HmsError::InvalidInput(format!("no patient with id {id}")));
        }
        self.selected = Some(id);
        Ok(())
    }

    pub fn selected(&self) -> Option<&Patient> {
        self.selected
            .and_then(|id| self.patients.iter().find(|p| p.id == id))
    }

    /// Confirms the selection.
    ///
    /// # Errors
    ///
    /// `HmsError::NoPatientSelected` when nothing is selected.
    pub fn confirm(&self) -> HmsResult<(Patient, Notice)> {
        let patient = self.selected().cloned().ok_or(HmsError::NoPatientSelected)?;
        let notice = Notice::success(format!("Selected: {}", patient.name));
        Ok((patient, notice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> SelectPatientScreen {
        let mut s = SelectPatientScreen::new();
        s.apply_patients(vec![
            Patient {
                id: 1,
                name: "Anu Joseph".into(),
                op_number: Some("OP-202501-001".into()),
                place: "Kochi".into(),
                phone: "98470".into(),
                ..Patient::default()
            },
            Patient {
                id: 2,
                name: "Ravi".into(),
                ip_number: Some("IP-202501-000777".into()),
                room: Some("Ward 4".into()),
                place: "Thrissur".into(),
                is_ip: true,
                ..Patient::default()
            },
        ]);
        s
    }

    #[test]
    fn empty_term_shows_all() {
        assert_eq!(screen().filtered().len(), 2);
    }

    #[test]
    fn filters_by_selected_field() {
        let mut s = screen();
        s.term = "WARD".into();
        assert!(s.filtered().is_empty());
        s.field = PatientFilterField::Room;
        assert_eq!(s.filtered()[0].id, 2);
        s.field = "ip-number".parse().unwrap();
        s.term = "000777".into();
        assert_eq!(s.filtered().len(), 1);
        s.field = PatientFilterField::OpNumber;
        assert!(s.filtered().is_empty());
    }

    #[test]
    fn confirm_without_selection_is_an_error() {
        let mut s = screen();
        assert!(matches!(s.confirm(), Err(HmsError::NoPatientSelected)));
        s.select(2).unwrap();
        let (p, notice) = s.confirm().unwrap();
        assert_eq!(p.id, 2);
        assert_eq!(notice.message(), "Selected: Ravi");
        assert!(s.select(9).is_err());
    }

    #[test]
    fn reload_drops_vanished_selection() {
        let mut s = screen();
        s.select(1).unwrap();
        s.apply_patients(Vec::new());
        assert!(s.selected().is_none());
    }
}
