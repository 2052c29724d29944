//! Wire types exchanged with the billing backend.
//!
//! The backend owns these records; the desk only reads them and posts create payloads. Every
//! response type tolerates missing and `null` fields, since different backend versions omit
//! different columns.

pub mod auth;
pub mod bill;
pub mod dashboard;
pub mod doctor;
pub mod patient;
pub mod report;
pub mod settings;

pub use auth::{LoginResponse, User};
pub use bill::{
    BillCreated, IpBillCreate, IpBillDetails, IpBillItemCreate, IpBillSummary, OpBillCreate,
    OpBillDetails, OpBillItemCreate, OpBillSummary, PartyRef,
};
pub use dashboard::DashboardStats;
pub use doctor::Doctor;
pub use patient::{Gender, Patient, PatientCreate, PatientForm, PatientKind};
pub use report::{
    bill_type_label, AppointmentRow, BillSummaryReport, ReportData, ReportKind, ReportMetrics,
    APPOINTMENT_STATUSES,
};
pub use settings::{Department, DepartmentCreate, Particular, ParticularCreate, SettingsStats};

use serde::{Deserialize, Deserializer};

/// Deserializes `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
