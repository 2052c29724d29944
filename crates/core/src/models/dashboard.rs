use super::null_as_default;
use serde::{Deserialize, Serialize};

/// Today's counters shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    #[serde(deserialize_with = "null_as_default")]
    pub total_patients_today: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_op_bills_today: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_ip_bills_today: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_revenue_today: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pending_appointments: i64,
}
