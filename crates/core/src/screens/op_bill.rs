//! Outpatient bill entry.
//!
//! The operator either searches for an existing OP patient or types a new patient's details,
//! edits the bill lines and saves. Selecting a patient also loads their previous bills for
//! read-back through [`BillHistory`].

use super::{Ticket, TicketCounter};
use crate::billing::{
    format_money, op_template, unknown_particulars, BillLines, BillTotals, OpLineItem,
};
use crate::constants::{DEFAULT_BILL_TYPE, DEFAULT_CATEGORY, DEFAULT_DISCOUNT_TYPE};
use crate::history::{BillHistory, DatedBill};
use crate::models::{
    Doctor, OpBillCreate, OpBillDetails, OpBillItemCreate, OpBillSummary, Particular, Patient,
    PatientCreate, PatientForm, PatientKind,
};
use crate::notice::{Confirm, Notice};
use crate::print::{op_bill_document, BillHeading, PrintDocument};
use crate::validation::require_fields;
use crate::{numbering, HmsError, HmsResult};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

/// Bill-level fields of the OP form.
#[derive(Debug, Clone, PartialEq)]
pub struct OpBillForm {
    pub bill_type: String,
    pub category: String,
    pub payment_mode: String,
}

impl Default for OpBillForm {
    fn default() -> Self {
        Self {
            bill_type: DEFAULT_BILL_TYPE.into(),
            category: DEFAULT_CATEGORY.into(),
            payment_mode: DEFAULT_BILL_TYPE.into(),
        }
    }
}

/// What a save has to send, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct OpSavePlan {
    /// Present when no existing patient is selected; must be created first.
    pub new_patient: Option<PatientCreate>,
    pub patient_id: Option<i64>,
    pub patient_number: String,
    pub bill_number: String,
    pub net_amount: f64,
    bill_type: String,
    category: String,
    payment_mode: String,
    doctor_id: i64,
    items: Vec<OpBillItemCreate>,
}

impl OpSavePlan {
    /// The bill payload for `patient_id` (the selected patient or the one just created).
    pub fn bill(&self, patient_id: i64, patient_number: Option<&str>) -> OpBillCreate {
        OpBillCreate {
            patient_id,
            patient_number: patient_number
                .filter(|n| !n.trim().is_empty())
                .unwrap_or(&self.patient_number)
                .to_string(),
            bill_number: self.bill_number.clone(),
            bill_type: self.bill_type.clone(),
            category: self.category.clone(),
            payment_mode: self.payment_mode.clone(),
            doctor_id: self.doctor_id,
            discount_type: DEFAULT_DISCOUNT_TYPE.into(),
            items: self.items.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpBillScreen {
    pub search_term: String,
    results: Vec<Patient>,
    selected: Option<Patient>,
    pub patient_form: PatientForm,
    pub bill_form: OpBillForm,
    lines: BillLines<OpLineItem>,
    particulars: Vec<Particular>,
    doctors: Vec<Doctor>,
    history: BillHistory<OpBillSummary>,
    tickets: TicketCounter,
}

impl Default for OpBillScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl OpBillScreen {
    pub fn new() -> Self {
        Self {
            search_term: String::new(),
            results: Vec::new(),
            selected: None,
            patient_form: PatientForm::default(),
            bill_form: OpBillForm::default(),
            lines: fresh_lines(&[]),
            particulars: Vec::new(),
            doctors: Vec::new(),
            history: BillHistory::default(),
            tickets: TicketCounter::default(),
        }
    }

    pub fn lines(&self) -> &[OpLineItem] {
        self.lines.as_slice()
    }

    pub fn results(&self) -> &[Patient] {
        &self.results
    }

    pub fn selected(&self) -> Option<&Patient> {
        self.selected.as_ref()
    }

    pub fn history(&self) -> &BillHistory<OpBillSummary> {
        &self.history
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    /// Ticket of the current patient selection.
    pub fn ticket(&self) -> Ticket {
        self.tickets.current()
    }

    pub fn totals(&self) -> BillTotals {
        self.lines.totals(0.0)
    }

    fn template(&self) -> Vec<OpLineItem> {
        op_template(&self.particulars)
    }

    fn first_doctor_id(&self) -> i64 {
        self.doctors.first().and_then(|d| d.id).unwrap_or(0)
    }

    pub fn apply_doctors(&mut self, doctors: Vec<Doctor>) {
        self.doctors = doctors;
        if self.patient_form.doctor_id <= 0 {
            self.patient_form.doctor_id = self.first_doctor_id();
        }
    }

    /// Stores the particulars lookup. An untouched new bill switches to the new template.
    pub fn apply_particulars(&mut self, particulars: Vec<Particular>) {
        let untouched = self.history.is_new() && self.lines.as_slice() == self.template().as_slice();
        self.particulars = particulars;
        if untouched {
            self.lines = fresh_lines(&self.particulars);
        }
    }

    /// # Errors
    ///
    /// `HmsError::MissingFields` when the search term is blank.
    pub fn prepare_search(&self) -> HmsResult<String> {
        require_fields(&[("search term", &self.search_term)])?;
        Ok(self.search_term.trim().to_string())
    }

    pub fn apply_search(&mut self, results: Vec<Patient>) -> Notice {
        let notice = Notice::success(format!("Found {} OP patients", results.len()));
        self.results = results;
        notice
    }

    pub fn search_failed(&mut self) -> Notice {
        self.results.clear();
        Notice::error("Failed to search patients")
    }

    /// Selects a patient and returns the ticket the previous-bill fetch must carry.
    pub fn select_patient(&mut self, patient: Patient) -> Ticket {
        self.patient_form = PatientForm::from_patient(&patient);
        self.patient_form.room.clear();
        self.selected = Some(patient);
        self.history = BillHistory::default();
        self.results.clear();
        self.search_term.clear();
        self.tickets.issue()
    }

    /// Installs the selected patient's previous bills. Stale responses are ignored.
    pub fn apply_history(&mut self, ticket: Ticket, bills: Vec<OpBillSummary>) -> Option<Notice> {
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

    /// Confirms moving to an older bill; returns the position and bill id to fetch.
    ///
    /// `Ok(None)` when there is no older bill.
    pub fn request_next(&self, confirm: &mut impl Confirm) -> HmsResult<Option<(usize, i64)>> {
        self.request_at(self.history.next_target(), confirm)
    }

    pub fn request_prev(&self, confirm: &mut impl Confirm) -> HmsResult<Option<(usize, i64)>> {
        self.request_at(self.history.prev_target(), confirm)
    }

    /// Confirms jumping to the bill at `index`.
    pub fn request_bill(&self, index: usize, confirm: &mut impl Confirm) -> HmsResult<i64> {
        Ok(self.history.request(index, confirm)?.id())
    }

    fn request_at(
        &self,
        target: Option<usize>,
        confirm: &mut impl Confirm,
    ) -> HmsResult<Option<(usize, i64)>> {
        match target {
            Some(index) => Ok(Some((index, self.request_bill(index, confirm)?))),
            None => Ok(None),
        }
    }

    /// Replaces the bill form and lines with a stored bill.
    pub fn apply_bill(&mut self, ticket: Ticket, index: usize, details: OpBillDetails) -> Option<Notice> {
        if !self.tickets.is_current(ticket) {
            return None;
        }
        let unknown = unknown_particulars(&details.items, &self.particulars);
        if !unknown.is_empty() {
            warn!(bill = %details.bill.bill_number, ?unknown, "bill references unknown particulars");
        }

        self.history.loaded(index);
        self.bill_form = OpBillForm {
            category: non_blank_or(&details.bill.category, DEFAULT_CATEGORY),
            ..OpBillForm::default()
        };
        if details.bill.doctor_id > 0 {
            self.patient_form.doctor_id = details.bill.doctor_id;
        }
        let template = self.template();
        self.lines.replace(details.items, template);
        Some(Notice::success(format!(
            "Bill {} loaded successfully",
            details.bill.bill_number
        )))
    }

    /// A failed detail fetch returns to entering a new bill; the form is left alone.
    pub fn bill_failed(&mut self, ticket: Ticket) -> Option<Notice> {
        if !self.tickets.is_current(ticket) {
            return None;
        }
        self.history.reset();
        Some(Notice::error("Failed to load bill details"))
    }

    /// Starts a new bill for the selected patient.
    pub fn new_bill(&mut self) -> Notice {
        self.history.reset();
        self.bill_form = OpBillForm::default();
        self.lines = fresh_lines(&self.particulars);
        Notice::info("Ready to create new bill")
    }

    pub fn add_line(&mut self) {
        self.lines.push(OpLineItem::default());
    }

    /// Removes a line; the last line stays.
    pub fn remove_line(&mut self, index: usize) -> HmsResult<bool> {
        self.lines.remove(index)
    }

    /// Mutable access to a line for text edits and validated numeric setters.
    pub fn line_mut(&mut self, index: usize) -> HmsResult<&mut OpLineItem> {
        self.lines.line_mut(index)
    }

    /// Validates the screen and builds the save plan.
    ///
    /// # Errors
    ///
    /// * `HmsError::MissingFields` - no patient selected and the patient form is incomplete.
    /// * `HmsError::NonPositiveTotal` - the net amount is not above zero.
    pub fn prepare_save(&self, now: NaiveDateTime) -> HmsResult<OpSavePlan> {
        if self.selected.is_none() {
            self.patient_form.validate_required()?;
        }
        let totals = self.totals();
        if totals.net_amount <= 0.0 {
            return Err(HmsError::NonPositiveTotal);
        }

        let today = now.date();
        let mut rng = rand::thread_rng();
        let (new_patient, patient_id, patient_number) = match &self.selected {
            Some(p) => (None, Some(p.id), p.display_number().to_string()),
            None => {
                let number = numbering::patient_number(PatientKind::Op, today, &mut rng);
                let body = PatientCreate::from_form(&self.patient_form, PatientKind::Op, number.clone(), now);
                (Some(body), None, number)
            }
        };

        Ok(OpSavePlan {
            new_patient,
            patient_id,
            patient_number,
            bill_number: numbering::bill_number(PatientKind::Op, today, &mut rng),
            net_amount: totals.net_amount,
            bill_type: self.bill_form.bill_type.clone(),
            category: self.bill_form.category.clone(),
            payment_mode: self.bill_form.payment_mode.clone(),
            doctor_id: self.patient_form.doctor_id,
            items: self.lines.as_slice().iter().map(OpBillItemCreate::from).collect(),
        })
    }

    /// Resets everything after a successful save.
    pub fn apply_saved(&mut self, plan: &OpSavePlan, bill_number: &str) -> Notice {
        info!(bill = bill_number, patient = %plan.patient_number, "OP bill saved");
        self.reset();
        Notice::success(format!(
            "OP Bill created successfully! Patient: {} Bill: {} Amount: {}",
            plan.patient_number,
            bill_number,
            format_money(plan.net_amount)
        ))
    }

    fn reset(&mut self) {
        self.selected = None;
        self.history = BillHistory::default();
        self.tickets.issue();
        self.patient_form = PatientForm::with_doctor(self.first_doctor_id());
        self.bill_form = OpBillForm::default();
        self.lines = fresh_lines(&self.particulars);
        self.search_term.clear();
        self.results.clear();
    }

    /// The printable form of the bill on screen.
    pub fn print_document(&self, today: NaiveDate) -> PrintDocument {
        let current = self.history.current();
        let doctor_name = self
            .doctors
            .iter()
            .find(|d| d.id == Some(self.patient_form.doctor_id))
            .map(|d| d.name.clone())
            .unwrap_or_default();
        let heading = BillHeading {
            bill_number: current.map(|b| b.bill_number.clone()).unwrap_or_default(),
            bill_date: current
                .map(|b| b.bill_date.clone())
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            patient_name: self.patient_form.name.clone(),
            patient_number: self
                .selected
                .as_ref()
                .map(|p| p.display_number().to_string())
                .unwrap_or_default(),
            doctor_name,
            extra: vec![
                ("Bill Type".into(), self.bill_form.bill_type.clone()),
                ("Category".into(), self.bill_form.category.clone()),
            ],
        };
        op_bill_document(&heading, self.lines.as_slice(), &self.totals())
    }
}

fn fresh_lines(particulars: &[Particular]) -> BillLines<OpLineItem> {
    BillLines::with_fallback(op_template(particulars), OpLineItem::default)
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
    use crate::constants::OP_DEFAULT_PARTICULAR;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(11, 15, 0).unwrap()
    }

    fn patient() -> Patient {
        Patient {
            id: 12,
            name: "Anu".into(),
            op_number: Some("OP-202506-123".into()),
            doctor_id: 3,
            room: Some("stale".into()),
            ..Patient::default()
        }
    }

    fn stored(id: i64, date: &str) -> OpBillSummary {
        OpBillSummary {
            id,
            bill_number: format!("OP-B{id}"),
            bill_date: date.into(),
            category: "Emergency".into(),
            doctor_id: 8,
            ..OpBillSummary::default()
        }
    }

    fn details(bill: OpBillSummary, items: Vec<OpLineItem>) -> OpBillDetails {
        OpBillDetails { bill, items }
    }

    #[test]
    fn starts_with_consultation_line() {
        let s = OpBillScreen::new();
        assert_eq!(s.lines().len(), 1);
        assert_eq!(s.lines()[0].particular, OP_DEFAULT_PARTICULAR);
        assert_eq!(s.bill_form.bill_type, "Cash");
    }

    #[test]
    fn loading_a_previous_bill_replaces_lines_and_header() {
        let mut s = OpBillScreen::new();
        let ticket = s.select_patient(patient());
        assert_eq!(s.patient_form.room, "");
        s.apply_history(ticket, vec![stored(1, "2025-01-01"), stored(2, "2025-05-01")]);
        s.bill_form.bill_type = "Card".into();
        s.add_line();

        let (index, id) = s.request_next(&mut |_: &str| true).unwrap().unwrap();
        assert_eq!((index, id), (0, 2));
        let items = vec![
            OpLineItem::priced("ECG", "Cardio", 1.0, 300.0, 0.0).unwrap(),
            OpLineItem::priced("X-RAY", "Radiology", 2.0, 150.0, 10.0).unwrap(),
        ];
        s.apply_bill(ticket, index, details(stored(2, "2025-05-01"), items.clone()))
            .unwrap();

        assert_eq!(s.lines(), items.as_slice());
        assert_eq!(s.bill_form.category, "Emergency");
        assert_eq!(s.bill_form.bill_type, "Cash");
        assert_eq!(s.patient_form.doctor_id, 8);
        assert_eq!(s.history().index(), Some(0));
    }

    #[test]
    fn empty_stored_items_restore_template() {
        let mut s = OpBillScreen::new();
        let ticket = s.select_patient(patient());
        s.apply_history(ticket, vec![stored(1, "2025-01-01")]);
        s.add_line();
        s.apply_bill(ticket, 0, details(stored(1, "2025-01-01"), Vec::new()));
        assert_eq!(s.lines().len(), 1);
        assert_eq!(s.lines()[0].particular, OP_DEFAULT_PARTICULAR);
    }

    #[test]
    fn new_bill_keeps_patient() {
        let mut s = OpBillScreen::new();
        let ticket = s.select_patient(patient());
        s.apply_history(ticket, vec![stored(1, "2025-01-01")]);
        s.apply_bill(ticket, 0, details(stored(1, "2025-01-01"), vec![OpLineItem::new("ECG", "")]));
        s.new_bill();
        assert!(s.history().is_new());
        assert_eq!(s.lines()[0].particular, OP_DEFAULT_PARTICULAR);
        assert_eq!(s.selected().map(|p| p.id), Some(12));
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut s = OpBillScreen::new();
        let old = s.select_patient(patient());
        let current = s.select_patient(Patient { id: 13, ..patient() });
        assert!(s.apply_history(old, vec![stored(1, "2025-01-01")]).is_none());
        assert!(s.history().is_empty());
        assert!(s.apply_bill(old, 0, details(stored(1, "2025-01-01"), Vec::new())).is_none());
        assert!(s.apply_history(current, vec![stored(5, "2025-01-01")]).is_some());
    }

    #[test]
    fn failed_fetch_resets_cursor_and_keeps_form() {
        let mut s = OpBillScreen::new();
        let ticket = s.select_patient(patient());
        s.apply_history(ticket, vec![stored(1, "2025-01-01"), stored(2, "2024-01-01")]);
        s.apply_bill(ticket, 0, details(stored(1, "2025-01-01"), vec![OpLineItem::new("ECG", "")]));
        let lines = s.lines().to_vec();
        let notice = s.bill_failed(ticket).unwrap();
        assert!(notice.is_error());
        assert!(s.history().is_new());
        assert_eq!(s.lines(), lines.as_slice());
    }

    #[test]
    fn declined_navigation_changes_nothing() {
        let mut s = OpBillScreen::new();
        let ticket = s.select_patient(patient());
        s.apply_history(ticket, vec![stored(1, "2025-01-01")]);
        assert!(matches!(s.request_next(&mut |_: &str| false), Err(HmsError::Declined)));
        assert!(s.history().is_new());
        assert_eq!(s.request_prev(&mut |_: &str| true).unwrap(), None);
    }

    #[test]
    fn save_requires_positive_total() {
        let mut s = OpBillScreen::new();
        s.select_patient(patient());
        assert!(matches!(s.prepare_save(now()), Err(HmsError::NonPositiveTotal)));
    }

    #[test]
    fn save_for_new_patient_creates_patient_first() {
        let mut s = OpBillScreen::new();
        s.apply_doctors(vec![Doctor {
            id: Some(4),
            ..Doctor::default()
        }]);
        assert!(matches!(s.prepare_save(now()), Err(HmsError::MissingFields(_))));

        s.patient_form.name = "New".into();
        s.patient_form.age = "22".into();
        s.patient_form.complaint = "Cough".into();
        s.patient_form.phone = "123".into();
        s.line_mut(0).unwrap().set_rate(200.0).unwrap();

        let plan = s.prepare_save(now()).unwrap();
        let patient = plan.new_patient.as_ref().unwrap();
        assert!(!patient.is_ip);
        assert!(patient.patient_number.starts_with("OP-202506-"));
        assert!(plan.bill_number.starts_with("OP20250602-"));

        let bill = plan.bill(77, None);
        assert_eq!(bill.patient_id, 77);
        assert_eq!(bill.patient_number, plan.patient_number);
        assert_eq!(bill.doctor_id, 4);
        assert_eq!(bill.items.len(), 1);

        s.apply_saved(&plan, &plan.bill_number);
        assert_eq!(s.patient_form, PatientForm::with_doctor(4));
        assert_eq!(s.totals().net_amount, 0.0);
    }

    #[test]
    fn search_validation() {
        let mut s = OpBillScreen::new();
        assert!(s.prepare_search().is_err());
        s.search_term = "anu".into();
        assert_eq!(s.prepare_search().unwrap(), "anu");
        s.apply_search(vec![patient()]);
        assert_eq!(s.results().len(), 1);
        assert!(s.search_failed().is_error());
        assert!(s.results().is_empty());
    }

    #[test]
    fn particulars_replace_untouched_template() {
        let mut s = OpBillScreen::new();
        s.apply_particulars(vec![Particular {
            id: 1,
            name: "Registration Fee".into(),
            rate: Some(50.0),
            default_op: true,
            ..Particular::default()
        }]);
        assert_eq!(s.lines()[0].particular, "Registration Fee");
        assert_eq!(s.totals().net_amount, 50.0);
    }
}
