use super::null_as_default;
use crate::billing::{IpLineItem, LineItem, OpLineItem};
use serde::{Deserialize, Serialize};

/// Minimal view of a related patient or doctor embedded in report rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyRef {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub specialty: String,
}

/// OP bill header as listed by `/bills/op/{patientId}` and the reports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpBillSummary {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bill_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bill_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub patient_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub doctor_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bill_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub discount_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub total_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub discount_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub net_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub created_by: String,
    pub patient: Option<PartyRef>,
    pub doctor: Option<PartyRef>,
}

/// Response of `/bills/op/details/{billId}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpBillDetails {
    pub bill: OpBillSummary,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<OpLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpBillItemCreate {
    pub particular: String,
    pub doctor: String,
    pub department: String,
    pub unit: f64,
    pub rate: f64,
    pub discount_percent: f64,
}

impl From<&OpLineItem> for OpBillItemCreate {
    fn from(line: &OpLineItem) -> Self {
        Self {
            particular: line.particular.trim().to_string(),
            doctor: line.doctor.trim().to_string(),
            department: line.department.trim().to_string(),
            unit: line.unit(),
            rate: line.rate(),
            discount_percent: line.discount_percent(),
        }
    }
}

/// Body posted to `/bills/op`. The backend recomputes every amount from the items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpBillCreate {
    pub patient_id: i64,
    pub patient_number: String,
    pub bill_number: String,
    pub bill_type: String,
    pub category: String,
    pub payment_mode: String,
    pub doctor_id: i64,
    pub discount_type: String,
    pub items: Vec<OpBillItemCreate>,
}

/// IP bill header as listed by `/bills/ip/{patientId}` and the reports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IpBillSummary {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bill_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bill_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub patient_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub doctor_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_credit: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_insurance: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(deserialize_with = "null_as_default")]
    pub discount_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub room: String,
    #[serde(deserialize_with = "null_as_default")]
    pub admission_date: String,
    pub insurance_company: Option<String>,
    pub third_party: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub discount_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub service_tax: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub education_cess: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub she_education_cess: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub net_amount: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub created_by: String,
    pub patient: Option<PartyRef>,
    pub doctor: Option<PartyRef>,
}

/// Response of `/bills/ip/details/{billId}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IpBillDetails {
    pub bill: IpBillSummary,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<IpLineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpBillItemCreate {
    pub particular: String,
    pub department: String,
    pub amount: f64,
    pub discount_percent: f64,
}

impl From<&IpLineItem> for IpBillItemCreate {
    fn from(line: &IpLineItem) -> Self {
        Self {
            particular: line.particular.trim().to_string(),
            department: line.department.trim().to_string(),
            amount: line.amount(),
            discount_percent: line.discount_percent(),
        }
    }
}

/// Body posted to `/bills/ip`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IpBillCreate {
    pub patient_id: i64,
    pub is_credit: bool,
    pub is_insurance: bool,
    pub category: String,
    pub doctor_id: i64,
    pub discount_type: String,
    pub room: String,
    pub admission_date: String,
    pub insurance_company: Option<String>,
    pub third_party: Option<String>,
    pub service_tax: f64,
    pub education_cess: f64,
    pub she_education_cess: f64,
    pub items: Vec<IpBillItemCreate>,
}

/// Acknowledgement returned by both bill create endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillCreated {
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bill_number: String,
    pub bill_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_details_parse_items() {
        let body = r#"{
            "bill": {"id": 11, "bill_number": "OP20250102-0042", "bill_date": "2025-01-02T10:00:00",
                     "category": "General", "net_amount": 450.0, "patient_id": 5, "doctor_id": 2},
            "items": [{"particular": "Consultation", "department": "OPD", "unit": 1, "rate": 500,
                       "amount": 500, "discount_percent": 10, "discount_amount": 50, "total": 450}]
        }"#;
        let details: OpBillDetails = serde_json::from_str(body).unwrap();
        assert_eq!(details.bill.bill_number, "OP20250102-0042");
        assert_eq!(details.items.len(), 1);
        assert!(details.bill.patient.is_none());
    }

    #[test]
    fn ip_details_with_null_item_columns_still_load() {
        let body = r#"{
            "bill": {"id": 4, "bill_number": "IP20250103-0002", "net_amount": 2000},
            "items": [{"particular": "Room Charges", "department": null, "amount": 2000,
                       "discount_percent": null, "discount_amount": null, "total": 2000},
                      {"particular": "Nursing", "amount": null, "total": null}]
        }"#;
        let details: IpBillDetails = serde_json::from_str(body).unwrap();
        assert_eq!(details.items.len(), 2);
        assert_eq!(details.items[0].discount_percent(), 0.0);
        assert_eq!(details.items[1].particular, "Nursing");
    }

    #[test]
    fn ip_summary_keeps_null_insurance_as_none() {
        let body = r#"{"id": 3, "bill_number": "IP20250101-0001", "insurance_company": null,
                       "service_tax": null, "net_amount": 1000}"#;
        let bill: IpBillSummary = serde_json::from_str(body).unwrap();
        assert_eq!(bill.insurance_company, None);
        assert_eq!(bill.service_tax, 0.0);
    }

    #[test]
    fn item_payload_omits_derived_amounts() {
        let line = OpLineItem::priced(" ECG ", "Cardio", 1.0, 250.0, 0.0).unwrap();
        let json = serde_json::to_value(OpBillItemCreate::from(&line)).unwrap();
        assert_eq!(json["particular"], "ECG");
        assert!(json.get("total").is_none());
    }
}
