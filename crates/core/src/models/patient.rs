use super::null_as_default;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::HmsError;

/// Outpatient or inpatient classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientKind {
    Op,
    Ip,
}

impl PatientKind {
    /// Path segment used by the kind-specific endpoints (`/bills/op/...`).
    pub fn as_str(self) -> &'static str {
        match self {
            PatientKind::Op => "op",
            PatientKind::Ip => "ip",
        }
    }

    /// Upper-case label and identifier prefix (`OP`, `IP`).
    pub fn label(self) -> &'static str {
        match self {
            PatientKind::Op => "OP",
            PatientKind::Ip => "IP",
        }
    }

    pub fn is_ip(self) -> bool {
        matches!(self, PatientKind::Ip)
    }

    pub fn toggled(self) -> Self {
        match self {
            PatientKind::Op => PatientKind::Ip,
            PatientKind::Ip => PatientKind::Op,
        }
    }
}

impl FromStr for PatientKind {
    type Err = HmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "op" => Ok(PatientKind::Op),
            "ip" => Ok(PatientKind::Ip),
            other => Err(HmsError::InvalidInput(format!(
                "registration type must be op or ip, got {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for PatientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
    #[serde(other)]
    Other,
}

impl FromStr for Gender {
    type Err = HmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" | "o" => Ok(Gender::Other),
            other => Err(HmsError::InvalidInput(format!("unknown gender {other:?}"))),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        })
    }
}

/// A registered patient as returned by `/patients` and the search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Patient {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub op_number: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_number: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub patient_number: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub registration_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub age: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gender: Gender,
    #[serde(deserialize_with = "null_as_default")]
    pub complaint: String,
    #[serde(deserialize_with = "null_as_default")]
    pub house: String,
    #[serde(deserialize_with = "null_as_default")]
    pub street: String,
    #[serde(deserialize_with = "null_as_default")]
    pub place: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub doctor_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub doctor_name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub referred_by: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub room: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_ip: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub created_by: Option<String>,
}

impl Patient {
    pub fn kind(&self) -> PatientKind {
        if self.is_ip {
            PatientKind::Ip
        } else {
            PatientKind::Op
        }
    }

    /// The number shown to staff: the explicit patient number, else the kind's own number.
    pub fn display_number(&self) -> &str {
        let kind_number = match self.kind() {
            PatientKind::Ip => self.ip_number.as_deref(),
            PatientKind::Op => self.op_number.as_deref(),
        };
        self.patient_number
            .as_deref()
            .or(kind_number)
            .or(self.op_number.as_deref())
            .unwrap_or("")
    }

    /// House, street and place joined with commas, skipping blanks.
    pub fn address(&self) -> String {
        [&self.house, &self.street, &self.place]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Editable patient fields shared by registration and OP bill entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatientForm {
    pub name: String,
    pub age: String,
    pub gender: Gender,
    pub complaint: String,
    pub house: String,
    pub street: String,
    pub place: String,
    pub phone: String,
    pub email: String,
    pub doctor_id: i64,
    pub referred_by: String,
    pub room: String,
}

impl PatientForm {
    /// An empty form pointing at `doctor_id`.
    pub fn with_doctor(doctor_id: i64) -> Self {
        Self {
            doctor_id,
            ..Self::default()
        }
    }

    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            name: patient.name.clone(),
            age: patient.age.clone(),
            gender: patient.gender,
            complaint: patient.complaint.clone(),
            house: patient.house.clone(),
            street: patient.street.clone(),
            place: patient.place.clone(),
            phone: patient.phone.clone(),
            email: patient.email.clone().unwrap_or_default(),
            doctor_id: patient.doctor_id,
            referred_by: patient.referred_by.clone().unwrap_or_default(),
            room: patient.room.clone().unwrap_or_default(),
        }
    }

    /// Checks the fields every registration needs.
    pub fn validate_required(&self) -> crate::HmsResult<()> {
        crate::validation::require_fields(&[
            ("name", &self.name),
            ("age", &self.age),
            ("complaint", &self.complaint),
            ("phone", &self.phone),
        ])?;
        crate::validation::require_id("doctor", self.doctor_id)
    }
}

/// Body posted to `/patients`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientCreate {
    pub name: String,
    pub age: String,
    pub gender: Gender,
    pub complaint: String,
    pub house: String,
    pub street: String,
    pub place: String,
    pub phone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    pub doctor_id: i64,
    pub referred_by: String,
    pub room: String,
    pub is_ip: bool,
    pub patient_number: String,
    pub registration_date: String,
    pub registration_time: String,
}

impl PatientCreate {
    pub fn from_form(
        form: &PatientForm,
        kind: PatientKind,
        patient_number: String,
        now: chrono::NaiveDateTime,
    ) -> Self {
        Self {
            name: form.name.trim().to_string(),
            age: form.age.trim().to_string(),
            gender: form.gender,
            complaint: form.complaint.trim().to_string(),
            house: form.house.trim().to_string(),
            street: form.street.trim().to_string(),
            place: form.place.trim().to_string(),
            phone: form.phone.trim().to_string(),
            email: form.email.trim().to_string(),
            doctor_id: form.doctor_id,
            referred_by: form.referred_by.trim().to_string(),
            room: if kind.is_ip() {
                form.room.trim().to_string()
            } else {
                String::new()
            },
            is_ip: kind.is_ip(),
            patient_number,
            registration_date: now.format("%Y-%m-%d").to_string(),
            registration_time: now.format("%H:%M:%S").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn patient_tolerates_nulls_and_missing_fields() {
        let body = r#"{"id":7,"name":"Anu","ip_number":null,"room":null,"gender":"Female","is_ip":false,"op_number":"OP-202501-004"}"#;
        let p: Patient = serde_json::from_str(body).unwrap();
        assert_eq!(p.gender, Gender::Female);
        assert_eq!(p.ip_number, None);
        assert_eq!(p.display_number(), "OP-202501-004");
        assert_eq!(p.phone, "");
    }

    #[test]
    fn unknown_gender_maps_to_other() {
        let p: Patient = serde_json::from_str(r#"{"id":1,"gender":"Unspecified"}"#).unwrap();
        assert_eq!(p.gender, Gender::Other);
    }

    #[test]
    fn address_skips_blank_parts() {
        let p = Patient {
            house: "Rose Villa".into(),
            street: " ".into(),
            place: "Kochi".into(),
            ..Patient::default()
        };
        assert_eq!(p.address(), "Rose Villa, Kochi");
    }

    #[test]
    fn kind_parses_and_toggles() {
        assert_eq!("IP".parse::<PatientKind>().unwrap(), PatientKind::Ip);
        assert!("ward".parse::<PatientKind>().is_err());
        assert_eq!(PatientKind::Op.toggled(), PatientKind::Ip);
    }

    #[test]
    fn create_payload_drops_room_for_op() {
        let form = PatientForm {
            name: " Ravi ".into(),
            room: "ICU-2".into(),
            doctor_id: 3,
            ..PatientForm::default()
        };
        let now = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap();
        let body = PatientCreate::from_form(&form, PatientKind::Op, "OP-202503-010".into(), now);
        assert_eq!(body.name, "Ravi");
        assert_eq!(body.room, "");
        assert!(!body.is_ip);
        assert_eq!(body.registration_date, "2025-03-09");
        assert_eq!(body.registration_time, "14:05:00");
    }
}
