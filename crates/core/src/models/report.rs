use super::{null_as_default, IpBillSummary, OpBillSummary, Patient};
use crate::{HmsError, HmsResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The four report queries the backend offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    DailyOp,
    BillSummary,
    PatientList,
    AppointmentList,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::DailyOp,
        ReportKind::BillSummary,
        ReportKind::PatientList,
        ReportKind::AppointmentList,
    ];

    /// Slug used in the endpoint path and in export file names.
    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::DailyOp => "daily-op",
            ReportKind::BillSummary => "bill-summary",
            ReportKind::PatientList => "patient-list",
            ReportKind::AppointmentList => "appointment-list",
        }
    }

    pub fn path(self) -> String {
        format!("/reports/{}", self.slug())
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportKind::DailyOp => "Daily OP Report",
            ReportKind::BillSummary => "Bill Summary",
            ReportKind::PatientList => "Patient List",
            ReportKind::AppointmentList => "Appointment List",
        }
    }
}

impl FromStr for ReportKind {
    type Err = HmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == wanted)
            .ok_or_else(|| HmsError::InvalidInput(format!("unknown report {s:?}")))
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillSummaryReport {
    #[serde(deserialize_with = "null_as_default")]
    pub op_bills: Vec<OpBillSummary>,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_bills: Vec<IpBillSummary>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_op_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_ip_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentRow {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub appointment_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token_number: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub notes: Option<String>,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_specialty: Option<String>,
}

/// A decoded report body.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportData {
    DailyOp(Vec<OpBillSummary>),
    BillSummary(BillSummaryReport),
    PatientList(Vec<Patient>),
    AppointmentList(Vec<AppointmentRow>),
}

impl ReportData {
    /// Decodes the raw body of a `kind` report.
    ///
    /// # Errors
    ///
    /// Returns `HmsError::Deserialization` when the body does not have the report's shape.
    pub fn from_value(kind: ReportKind, value: serde_json::Value) -> HmsResult<Self> {
        let data = match kind {
            ReportKind::DailyOp => ReportData::DailyOp(
                serde_json::from_value(value).map_err(HmsError::Deserialization)?,
            ),
            ReportKind::BillSummary => ReportData::BillSummary(
                serde_json::from_value(value).map_err(HmsError::Deserialization)?,
            ),
            ReportKind::PatientList => ReportData::PatientList(
                serde_json::from_value(value).map_err(HmsError::Deserialization)?,
            ),
            ReportKind::AppointmentList => ReportData::AppointmentList(
                serde_json::from_value(value).map_err(HmsError::Deserialization)?,
            ),
        };
        Ok(data)
    }

    pub fn kind(&self) -> ReportKind {
        match self {
            ReportData::DailyOp(_) => ReportKind::DailyOp,
            ReportData::BillSummary(_) => ReportKind::BillSummary,
            ReportData::PatientList(_) => ReportKind::PatientList,
            ReportData::AppointmentList(_) => ReportKind::AppointmentList,
        }
    }
}

pub const APPOINTMENT_STATUSES: [&str; 4] = ["Scheduled", "Completed", "Cancelled", "No Show"];

/// Summary figures shown above a report table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportMetrics {
    pub total_revenue: f64,
    pub record_count: usize,
    /// Daily OP only.
    pub cash_bills: usize,
    pub insurance_bills: usize,
    /// Patient list only.
    pub op_patients: usize,
    pub ip_patients: usize,
    /// Appointment list only, in [`APPOINTMENT_STATUSES`] order.
    pub appointment_status: Vec<(&'static str, usize)>,
}

impl ReportData {
    pub fn metrics(&self) -> ReportMetrics {
        match self {
            ReportData::DailyOp(bills) => ReportMetrics {
                total_revenue: bills.iter().map(|b| b.net_amount).sum(),
                record_count: bills.len(),
                cash_bills: bills.iter().filter(|b| b.bill_type == "Cash").count(),
                insurance_bills: bills.iter().filter(|b| b.bill_type == "Insurance").count(),
                ..ReportMetrics::default()
            },
            ReportData::BillSummary(summary) => ReportMetrics {
                total_revenue: summary.total_amount,
                record_count: summary.op_bills.len() + summary.ip_bills.len(),
                ..ReportMetrics::default()
            },
            ReportData::PatientList(patients) => {
                let ip_patients = patients.iter().filter(|p| p.is_ip).count();
                ReportMetrics {
                    record_count: patients.len(),
                    op_patients: patients.len() - ip_patients,
                    ip_patients,
                    ..ReportMetrics::default()
                }
            }
            ReportData::AppointmentList(rows) => ReportMetrics {
                record_count: rows.len(),
                appointment_status: APPOINTMENT_STATUSES
                    .iter()
                    .map(|status| (*status, rows.iter().filter(|r| r.status == *status).count()))
                    .collect(),
                ..ReportMetrics::default()
            },
        }
    }
}

/// `OP` or `IP`, read from the bill number prefix.
pub fn bill_type_label(bill_number: &str) -> &'static str {
    if bill_number.starts_with("OP") {
        "OP"
    } else {
        "IP"
    }
}
