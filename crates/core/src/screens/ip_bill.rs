//! Inpatient bill entry.

use super::{Ticket, TicketCounter};
use crate::billing::{
    format_money, ip_template, unknown_particulars, BillLines, BillTotals, IpLineItem, Taxes,
};
use crate::constants::{DEFAULT_CATEGORY, DEFAULT_DISCOUNT_TYPE};
use crate::history::{BillHistory, DatedBill};
use crate::models::{
    Doctor, IpBillCreate, IpBillDetails, IpBillItemCreate, IpBillSummary, Particular, Patient,
};
use crate::notice::{confirmed, Confirm, Notice};
use crate::print::{ip_bill_document, BillHeading, PrintDocument};
use crate::validation::require_id;
use crate::{HmsError, HmsResult};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Header fields of an IP bill.
#[derive(Debug, Clone, PartialEq)]
pub struct IpBillForm {
    pub patient_id: i64,
    pub ip_number: String,
    pub is_credit: bool,
    pub is_insurance: bool,
    pub category: String,
    pub doctor_id: i64,
    pub discount_type: String,
    pub room: String,
    /// `yyyy-MM-dd`
    pub admission_date: String,
    pub insurance_company: String,
    pub third_party: String,
    taxes: Taxes,
}

impl IpBillForm {
    fn new(doctor_id: i64, today: NaiveDate) -> Self {
        Self {
            patient_id: 0,
            ip_number: String::new(),
            is_credit: false,
            is_insurance: false,
            category: DEFAULT_CATEGORY.into(),
            doctor_id,
            discount_type: DEFAULT_DISCOUNT_TYPE.into(),
            room: String::new(),
            admission_date: today.format("%Y-%m-%d").to_string(),
            insurance_company: String::new(),
            third_party: String::new(),
            taxes: Taxes::default(),
        }
    }

    pub fn taxes(&self) -> Taxes {
        self.taxes
    }

    /// Replaces the three tax fields.
    ///
    /// # Errors
    ///
    /// `HmsError::NegativeAmount` if any of them is negative; the form keeps its old taxes.
    pub fn set_taxes(&mut self, service_tax: f64, education_cess: f64, she_education_cess: f64) -> HmsResult<()> {
        self.taxes = Taxes::new(service_tax, education_cess, she_education_cess)?;
        Ok(())
    }

    /// Replaces only the tax fields that were given, keeping the others.
    ///
    /// An explicit zero clears a tax carried over from a loaded bill.
    ///
    /// # Errors
    ///
    /// `HmsError::NegativeAmount` if a given value is negative; the form keeps its old taxes.
    pub fn update_taxes(
        &mut self,
        service_tax: Option<f64>,
        education_cess: Option<f64>,
        she_education_cess: Option<f64>,
    ) -> HmsResult<()> {
        if service_tax.is_none() && education_cess.is_none() && she_education_cess.is_none() {
            return Ok(());
        }
        let current = self.taxes;
        self.set_taxes(
            service_tax.unwrap_or(current.service_tax),
            education_cess.unwrap_or(current.education_cess),
            she_education_cess.unwrap_or(current.she_education_cess),
        )
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone)]
pub struct IpBillScreen {
    patients: Vec<Patient>,
    selected: Option<Patient>,
    pub form: IpBillForm,
    lines: BillLines<IpLineItem>,
    particulars: Vec<Particular>,
    doctors: Vec<Doctor>,
    history: BillHistory<IpBillSummary>,
    tickets: TicketCounter,
    opened_on: NaiveDate,
}

impl IpBillScreen {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            patients: Vec::new(),
            selected: None,
            form: IpBillForm::new(0, today),
            lines: fresh_lines(&[]),
            particulars: Vec::new(),
            doctors: Vec::new(),
            history: BillHistory::default(),
            tickets: TicketCounter::default(),
            opened_on: today,
        }
    }

    pub fn lines(&self) -> &[IpLineItem] {
        self.lines.as_slice()
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn selected(&self) -> Option<&Patient> {
        self.selected.as_ref()
    }

    pub fn history(&self) -> &BillHistory<IpBillSummary> {
        &self.history
    }

    pub fn ticket(&self) -> Ticket {
        self.tickets.current()
    }

    pub fn totals(&self) -> BillTotals {
        self.lines.totals(self.form.taxes.sum())
    }

    fn first_doctor_id(&self) -> i64 {
        self.doctors.first().and_then(|d| d.id).unwrap_or(0)
    }

    pub fn apply_doctors(&mut self, doctors: Vec<Doctor>) {
        self.doctors = doctors;
        if self.form.doctor_id <= 0 {
            self.form.doctor_id = self.first_doctor_id();
        }
    }

    /// Stores the inpatient list used for IP number lookup.
    pub fn apply_patients(&mut self, patients: Vec<Patient>) {
        self.patients = patients;
    }

    pub fn apply_particulars(&mut self, particulars: Vec<Particular>) {
        let untouched =
            self.history.is_new() && self.lines.as_slice() == ip_template(&self.particulars).as_slice();
        self.particulars = particulars;
        if untouched {
            self.lines = fresh_lines(&self.particulars);
        }
    }

    /// Selects the inpatient whose IP number matches exactly.
    ///
    /// Returns the ticket the previous-bill fetch must carry.
    ///
    /// # Errors
    ///
    /// * `HmsError::MissingFields` - blank IP number.
    /// * `HmsError::InvalidInput` - no loaded patient has that number.
    pub fn find_patient(&mut self, ip_number: &str) -> HmsResult<Ticket> {
        crate::validation::require_fields(&[("IP number", ip_number)])?;
        let wanted = ip_number.trim();
        let patient = self
            .patients
            .iter()
            .find(|p| p.ip_number.as_deref() == Some(wanted))
            .cloned()
            .ok_or_else(|| {
                HmsError::InvalidInput("Patient not found. Please check IP number.".into())
            })?;
        Ok(self.select_patient(patient))
    }

    pub fn select_patient(&mut self, patient: Patient) -> Ticket {
        self.form.patient_id = patient.id;
        self.form.ip_number = patient.ip_number.clone().unwrap_or_default();
        self.form.room = patient.room.clone().unwrap_or_default();
        self.selected = Some(patient);
        self.history = BillHistory::default();
        self.tickets.issue()
    }

    pub fn apply_history(&mut self, ticket: Ticket, bills: Vec<IpBillSummary>) -> Option<Notice> {
        if !self.tickets.is_current(ticket) {
            return None;
        }
        self.history = BillHistory::new(bills);
        (!self.history.is_empty()).then(|| {
            Notice::info(format!(
                "Found {} previous bill(s) for this patient",
                self.history.len()
            ))
        })
    }

    pub fn request_next(&self, confirm: &mut impl Confirm) -> HmsResult<Option<(usize, i64)>> {
        match self.history.next_target() {
            Some(i) => Ok(Some((i, self.request_bill(i, confirm)?))),
            None => Ok(None),
        }
    }

    pub fn request_prev(&self, confirm: &mut impl Confirm) -> HmsResult<Option<(usize, i64)>> {
        match self.history.prev_target() {
            Some(i) => Ok(Some((i, self.request_bill(i, confirm)?))),
            None => Ok(None),
        }
    }

    pub fn request_bill(&self, index: usize, confirm: &mut impl Confirm) -> HmsResult<i64> {
        Ok(self.history.request(index, confirm)?.id())
    }

    /// Replaces the header and lines with a stored bill. The patient stays selected.
    ///
    /// Header fields the stored bill leaves blank fall back to the new-bill defaults, with the
    /// room taken from the selected patient.
    pub fn apply_bill(&mut self, ticket: Ticket, index: usize, details: IpBillDetails) -> Option<Notice> {
        if !self.tickets.is_current(ticket) {
            return None;
        }
        let unknown = unknown_particulars(&details.items, &self.particulars);
        if !unknown.is_empty() {
            warn!(bill = %details.bill.bill_number, ?unknown, "bill references unknown particulars");
        }

        let bill = &details.bill;
        self.history.loaded(index);
        self.form.is_credit = bill.is_credit;
        self.form.is_insurance = bill.is_insurance;
        self.form.category = non_blank_or(&bill.category, DEFAULT_CATEGORY);
        let defaults = IpBillForm::new(self.first_doctor_id(), self.opened_on);
        self.form.doctor_id = if bill.doctor_id > 0 {
            bill.doctor_id
        } else {
            defaults.doctor_id
        };
        self.form.discount_type = non_blank_or(&bill.discount_type, DEFAULT_DISCOUNT_TYPE);
        self.form.room = if bill.room.trim().is_empty() {
            self.selected
                .as_ref()
                .and_then(|p| p.room.clone())
                .unwrap_or_default()
        } else {
            bill.room.clone()
        };
        self.form.admission_date = match crate::history::parse_bill_date(&bill.admission_date) {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => defaults.admission_date,
        };
        self.form.insurance_company = bill.insurance_company.clone().unwrap_or_default();
        self.form.third_party = bill.third_party.clone().unwrap_or_default();
        // stored bills are trusted; negative taxes from the backend fall back to zero
        self.form.taxes = Taxes::new(bill.service_tax, bill.education_cess, bill.she_education_cess)
            .unwrap_or_default();

        let notice = Notice::success(format!("Bill {} loaded successfully", bill.bill_number));
        let template = ip_template(&self.particulars);
        self.lines.replace(details.items, template);
        Some(notice)
    }

    pub fn bill_failed(&mut self, ticket: Ticket) -> Option<Notice> {
        if !self.tickets.is_current(ticket) {
            return None;
        }
        self.history.reset();
        Some(Notice::error("Failed to load bill details"))
    }

    /// Starts a new bill for the selected patient, keeping patient, IP number and room.
    pub fn new_bill(&mut self, today: NaiveDate) -> Notice {
        self.history.reset();
        let mut form = IpBillForm::new(self.first_doctor_id(), today);
        form.patient_id = self.form.patient_id;
        form.ip_number = std::mem::take(&mut self.form.ip_number);
        form.room = std::mem::take(&mut self.form.room);
        self.form = form;
        self.lines = fresh_lines(&self.particulars);
        Notice::info("Ready to create new bill")
    }

    pub fn add_line(&mut self) {
        self.lines.push(IpLineItem::new("", crate::constants::IP_DEFAULT_DEPARTMENT));
    }

    pub fn remove_line(&mut self, index: usize) -> HmsResult<bool> {
        self.lines.remove(index)
    }

    pub fn line_mut(&mut self, index: usize) -> HmsResult<&mut IpLineItem> {
        self.lines.line_mut(index)
    }

    /// Validates the screen and builds the `/bills/ip` payload.
    ///
    /// # Errors
    ///
    /// * `HmsError::NoPatientSelected` - no patient.
    /// * `HmsError::MissingFields` - no treating doctor.
    /// * `HmsError::NonPositiveTotal` - the net amount is not above zero.
    pub fn prepare_save(&self) -> HmsResult<IpBillCreate> {
        if self.selected.is_none() || self.form.patient_id <= 0 {
            return Err(HmsError::NoPatientSelected);
        }
        require_id("doctor", self.form.doctor_id)?;
        if self.totals().net_amount <= 0.0 {
            return Err(HmsError::NonPositiveTotal);
        }

        let admission = NaiveDate::parse_from_str(self.form.admission_date.trim(), "%Y-%m-%d")
            .map_err(|_| HmsError::InvalidTimestamp(self.form.admission_date.clone()))?;
        let taxes = self.form.taxes;
        Ok(IpBillCreate {
            patient_id: self.form.patient_id,
            is_credit: self.form.is_credit,
            is_insurance: self.form.is_insurance,
            category: self.form.category.clone(),
            doctor_id: self.form.doctor_id,
            discount_type: self.form.discount_type.clone(),
            room: self.form.room.trim().to_string(),
            admission_date: format!("{}T00:00:00", admission.format("%Y-%m-%d")),
            insurance_company: optional(&self.form.insurance_company),
            third_party: optional(&self.form.third_party),
            service_tax: taxes.service_tax,
            education_cess: taxes.education_cess,
            she_education_cess: taxes.she_education_cess,
            items: self.lines.as_slice().iter().map(IpBillItemCreate::from).collect(),
        })
    }

    pub fn apply_saved(&mut self, bill_number: &str, today: NaiveDate) -> Notice {
        let net = self.totals().net_amount;
        info!(bill = bill_number, patient_id = self.form.patient_id, "IP bill saved");
        self.reset(today);
        Notice::success(format!(
            "IP Bill created successfully: {bill_number} ({})",
            format_money(net)
        ))
    }

    /// Clears the whole screen after confirmation.
    pub fn clear(&mut self, today: NaiveDate, confirm: &mut impl Confirm) -> HmsResult<Notice> {
        confirmed(confirm, "Are you sure you want to clear this bill?")?;
        self.reset(today);
        Ok(Notice::success("Bill cleared successfully"))
    }

    fn reset(&mut self, today: NaiveDate) {
        self.selected = None;
        self.history = BillHistory::default();
        self.tickets.issue();
        self.form = IpBillForm::new(self.first_doctor_id(), today);
        self.lines = fresh_lines(&self.particulars);
    }

    pub fn print_document(&self, today: NaiveDate) -> PrintDocument {
        let current = self.history.current();
        let doctor_name = self
            .doctors
            .iter()
            .find(|d| d.id == Some(self.form.doctor_id))
            .map(|d| d.name.clone())
            .unwrap_or_default();
        let mut extra = vec![
            ("Room".to_string(), self.form.room.clone()),
            ("Admission".to_string(), self.form.admission_date.clone()),
            ("Category".to_string(), self.form.category.clone()),
            ("Discount Type".to_string(), self.form.discount_type.clone()),
        ];
        if self.form.is_credit {
            extra.push(("Payment".into(), "Credit".into()));
        }
        if let Some(company) = optional(&self.form.insurance_company) {
            extra.push(("Insurance".into(), company));
        }
        let heading = BillHeading {
            bill_number: current.map(|b| b.bill_number.clone()).unwrap_or_default(),
            bill_date: current
                .map(|b| b.bill_date.clone())
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            patient_name: self.selected.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
            patient_number: self.form.ip_number.clone(),
            doctor_name,
            extra,
        };
        ip_bill_document(&heading, self.lines.as_slice(), &self.form.taxes, &self.totals())
    }
}

fn fresh_lines(particulars: &[Particular]) -> BillLines<IpLineItem> {
    BillLines::with_fallback(ip_template(particulars), IpLineItem::default)
}

fn non_blank_or(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::LineItem;
    use crate::constants::IP_DEFAULT_PARTICULAR;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }

    fn inpatient(id: i64, number: &str) -> Patient {
        Patient {
            id,
            name: format!("Patient {id}"),
            ip_number: Some(number.into()),
            room: Some("Ward 5".into()),
            is_ip: true,
            ..Patient::default()
        }
    }

    fn screen() -> IpBillScreen {
        let mut s = IpBillScreen::new(today());
        s.apply_doctors(vec![Doctor {
            id: Some(2),
            name: "Dr Joseph".into(),
            ..Doctor::default()
        }]);
        s.apply_patients(vec![inpatient(1, "IP-202507-000001"), inpatient(2, "IP-202507-000002")]);
        s
    }

    #[test]
    fn defaults() {
        let s = screen();
        assert_eq!(s.form.admission_date, "2025-07-10");
        assert_eq!(s.form.doctor_id, 2);
        assert_eq!(s.form.category, "General");
        assert_eq!(s.lines()[0].particular, IP_DEFAULT_PARTICULAR);
    }

    #[test]
    fn lookup_is_exact() {
        let mut s = screen();
        assert!(matches!(s.find_patient("IP-202507-00000"), Err(HmsError::InvalidInput(_))));
        assert!(s.find_patient(" ").is_err());
        s.find_patient("IP-202507-000002").unwrap();
        assert_eq!(s.form.patient_id, 2);
        assert_eq!(s.form.room, "Ward 5");
    }

    #[test]
    fn net_includes_taxes() {
        let mut s = screen();
        s.line_mut(0).unwrap().set_amount(1000.0).unwrap();
        s.line_mut(0).unwrap().set_discount_percent(10.0).unwrap();
        s.form.set_taxes(45.0, 0.9, 0.45).unwrap();
        let t = s.totals();
        assert_eq!(t.sub_total, 900.0);
        assert!((t.net_amount - 946.35).abs() < 1e-9);
        assert!(s.form.set_taxes(-1.0, 0.0, 0.0).is_err());
        assert_eq!(s.form.taxes().service_tax, 45.0);
    }

    #[test]
    fn save_validation_order() {
        let mut s = screen();
        assert!(matches!(s.prepare_save(), Err(HmsError::NoPatientSelected)));
        s.find_patient("IP-202507-000001").unwrap();
        assert!(matches!(s.prepare_save(), Err(HmsError::NonPositiveTotal)));
        s.line_mut(0).unwrap().set_amount(500.0).unwrap();
        s.form.insurance_company = "  ".into();
        s.form.third_party = "TPA One".into();
        let body = s.prepare_save().unwrap();
        assert_eq!(body.insurance_company, None);
        assert_eq!(body.third_party.as_deref(), Some("TPA One"));
        assert_eq!(body.admission_date, "2025-07-10T00:00:00");
        assert_eq!(body.items[0].amount, 500.0);
    }

    #[test]
    fn loading_a_bill_replaces_header_and_lines() {
        let mut s = screen();
        let ticket = s.find_patient("IP-202507-000001").unwrap();
        let stored = IpBillSummary {
            id: 40,
            bill_number: "IP20250701-0009".into(),
            bill_date: "2025-07-01T12:00:00".into(),
            is_insurance: true,
            category: "ICU".into(),
            room: "ICU-3".into(),
            admission_date: "2025-06-28T00:00:00".into(),
            insurance_company: Some("Star".into()),
            service_tax: 12.0,
            ..IpBillSummary::default()
        };
        s.apply_history(ticket, vec![stored.clone()]);
        let (index, id) = s.request_next(&mut |_: &str| true).unwrap().unwrap();
        assert_eq!(id, 40);
        let items = vec![IpLineItem::priced("ICU Charges", "ICU", 3000.0, 0.0).unwrap()];
        s.apply_bill(ticket, index, IpBillDetails { bill: stored, items: items.clone() });

        assert_eq!(s.lines(), items.as_slice());
        assert!(s.form.is_insurance);
        assert_eq!(s.form.category, "ICU");
        assert_eq!(s.form.room, "ICU-3");
        assert_eq!(s.form.admission_date, "2025-06-28");
        assert_eq!(s.form.insurance_company, "Star");
        assert_eq!(s.totals().net_amount, 3012.0);

        s.new_bill(today());
        assert!(s.history().is_new());
        assert_eq!(s.form.patient_id, 1);
        assert_eq!(s.form.taxes(), Taxes::default());
        assert_eq!(s.lines()[0].amount(), 0.0);
    }

    #[test]
    fn blank_stored_header_falls_back_to_defaults() {
        let mut s = screen();
        let ticket = s.find_patient("IP-202507-000001").unwrap();
        let first = IpBillSummary {
            id: 41,
            bill_number: "IP20250705-0011".into(),
            bill_date: "2025-07-05T09:00:00".into(),
            doctor_id: 7,
            room: "ICU-1".into(),
            admission_date: "2025-07-01T00:00:00".into(),
            ..IpBillSummary::default()
        };
        let second = IpBillSummary {
            id: 42,
            bill_number: "IP20250704-0010".into(),
            bill_date: "2025-07-04T09:00:00".into(),
            doctor_id: 0,
            room: " ".into(),
            admission_date: "not a date".into(),
            ..IpBillSummary::default()
        };
        s.apply_history(ticket, vec![first.clone(), second.clone()]);
        s.apply_bill(ticket, 0, IpBillDetails { bill: first, items: vec![] });
        assert_eq!(s.form.doctor_id, 7);
        assert_eq!(s.form.room, "ICU-1");

        s.apply_bill(ticket, 1, IpBillDetails { bill: second, items: vec![] });
        assert_eq!(s.form.doctor_id, 2);
        assert_eq!(s.form.room, "Ward 5");
        assert_eq!(s.form.admission_date, "2025-07-10");
    }

    #[test]
    fn given_taxes_replace_only_their_field() {
        let mut s = screen();
        s.form.set_taxes(45.0, 0.9, 0.45).unwrap();
        s.form.update_taxes(None, None, None).unwrap();
        assert_eq!(s.form.taxes().service_tax, 45.0);

        assert!(matches!(
            s.form.update_taxes(Some(-5.0), None, None),
            Err(HmsError::NegativeAmount { .. })
        ));
        assert_eq!(s.form.taxes().service_tax, 45.0);

        s.form.update_taxes(Some(0.0), None, Some(0.0)).unwrap();
        let taxes = s.form.taxes();
        assert_eq!(taxes.service_tax, 0.0);
        assert_eq!(taxes.education_cess, 0.9);
        assert_eq!(taxes.she_education_cess, 0.0);
    }

    #[test]
    fn clear_is_confirmed() {
        let mut s = screen();
        s.find_patient("IP-202507-000001").unwrap();
        assert!(s.clear(today(), &mut |_: &str| false).is_err());
        assert!(s.selected().is_some());
        s.clear(today(), &mut |_: &str| true).unwrap();
        assert!(s.selected().is_none());
        assert_eq!(s.form.patient_id, 0);
        assert_eq!(s.form.doctor_id, 2);
    }

    #[test]
    fn added_lines_default_to_general() {
        let mut s = screen();
        s.add_line();
        assert_eq!(s.lines()[1].department, "General");
        assert!(s.remove_line(1).unwrap());
        assert!(!s.remove_line(0).unwrap());
    }
}
