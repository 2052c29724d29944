use super::null_as_default;
use crate::constants::{
    DOCTOR_DEFAULT_FROM_TIME, DOCTOR_DEFAULT_MAX_TOKENS, DOCTOR_DEFAULT_OP_VALIDITY,
    DOCTOR_DEFAULT_TO_TIME,
};
use serde::{Deserialize, Serialize};

/// A doctor master record. The same shape is read from `/doctors` and posted back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Doctor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub qualification: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub specialty: String,
    #[serde(deserialize_with = "null_as_default")]
    pub department: String,
    #[serde(deserialize_with = "null_as_default")]
    pub op_validity: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub booking_code: String,
    #[serde(deserialize_with = "null_as_default")]
    pub max_tokens: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub doctor_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub hospital_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub doctor_revisit: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub hospital_revisit: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub from_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub to_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_resigned: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_discontinued: bool,
    #[serde(
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub resignation_date: Option<String>,
}

impl Default for Doctor {
    fn default() -> Self {
        Self {
            id: None,
            code: String::new(),
            name: String::new(),
            address: String::new(),
            qualification: String::new(),
            phone: String::new(),
            email: String::new(),
            specialty: String::new(),
            department: String::new(),
            op_validity: DOCTOR_DEFAULT_OP_VALIDITY,
            booking_code: String::new(),
            max_tokens: DOCTOR_DEFAULT_MAX_TOKENS,
            doctor_amount: 0.0,
            hospital_amount: 0.0,
            doctor_revisit: 0.0,
            hospital_revisit: 0.0,
            from_time: DOCTOR_DEFAULT_FROM_TIME.into(),
            to_time: DOCTOR_DEFAULT_TO_TIME.into(),
            is_resigned: false,
            is_discontinued: false,
            resignation_date: None,
        }
    }
}

impl Doctor {
    /// Neither resigned nor discontinued.
    pub fn is_active(&self) -> bool {
        !self.is_resigned && !self.is_discontinued
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_resigned {
            "Resigned"
        } else if self.is_discontinued {
            "Discontinued"
        } else {
            "Active"
        }
    }

    /// Consultation fee for a first visit (doctor share plus hospital share).
    pub fn first_visit_fee(&self) -> f64 {
        self.doctor_amount + self.hospital_amount
    }

    pub fn revisit_fee(&self) -> f64 {
        self.doctor_revisit + self.hospital_revisit
    }

    /// Case-insensitive match over name, code, specialty and department; phone is matched raw.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.code.to_lowercase().contains(&needle)
            || self.specialty.to_lowercase().contains(&needle)
            || self.department.to_lowercase().contains(&needle)
            || self.phone.contains(term)
    }
}
