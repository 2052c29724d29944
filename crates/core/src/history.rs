//! Navigation through a patient's previous bills.
//!
//! The list is fetched once per patient selection and ordered newest first. The cursor is
//! `None` while a new bill is being entered; "next" walks towards older bills.

use crate::models::{IpBillSummary, OpBillSummary};
use crate::notice::{confirmed, Confirm};
use crate::{HmsError, HmsResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use tracing::warn;

/// Header fields the navigator needs from a stored bill.
pub trait DatedBill {
    fn id(&self) -> i64;
    fn bill_number(&self) -> &str;
    fn bill_date(&self) -> &str;
}

impl DatedBill for OpBillSummary {
    fn id(&self) -> i64 {
        self.id
    }
    fn bill_number(&self) -> &str {
        &self.bill_number
    }
    fn bill_date(&self) -> &str {
        &self.bill_date
    }
}

impl DatedBill for IpBillSummary {
    fn id(&self) -> i64 {
        self.id
    }
    fn bill_number(&self) -> &str {
        &self.bill_number
    }
    fn bill_date(&self) -> &str {
        &self.bill_date
    }
}

/// Parses the timestamp formats the backend emits for bill dates.
pub fn parse_bill_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `dd/MM/yyyy` for display, or the raw text when it does not parse.
pub fn display_bill_date(raw: &str) -> String {
    parse_bill_date(raw)
        .map(|dt| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillHistory<B> {
    bills: Vec<B>,
    index: Option<usize>,
}

impl<B> Default for BillHistory<B> {
    fn default() -> Self {
        Self {
            bills: Vec::new(),
            index: None,
        }
    }
}

impl<B: DatedBill> BillHistory<B> {
    /// Orders `bills` newest first; bills whose date does not parse go last.
    pub fn new(mut bills: Vec<B>) -> Self {
        for bill in &bills {
            if parse_bill_date(bill.bill_date()).is_none() {
                warn!(
                    bill_number = bill.bill_number(),
                    bill_date = bill.bill_date(),
                    "unparseable bill date"
                );
            }
        }
        bills.sort_by(|a, b| {
            match (parse_bill_date(a.bill_date()), parse_bill_date(b.bill_date())) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        Self { bills, index: None }
    }

    pub fn bills(&self) -> &[B] {
        &self.bills
    }

    pub fn len(&self) -> usize {
        self.bills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bills.is_empty()
    }

    /// `None` while entering a new bill.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_new(&self) -> bool {
        self.index.is_none()
    }

    pub fn current(&self) -> Option<&B> {
        self.index.and_then(|i| self.bills.get(i))
    }

    /// The next older bill, or the newest one when entering a new bill.
    pub fn next_target(&self) -> Option<usize> {
        let target = self.index.map_or(0, |i| i + 1);
        (target < self.bills.len()).then_some(target)
    }

    /// The next newer bill. There is none from a new bill or the newest one.
    pub fn prev_target(&self) -> Option<usize> {
        self.index.and_then(|i| i.checked_sub(1))
    }

    /// Asks to replace the form with the bill at `index` and returns the bill to fetch.
    ///
    /// The cursor is not moved; call [`BillHistory::loaded`] once the details arrived.
    ///
    /// # Errors
    ///
    /// * `HmsError::InvalidInput` - no bill at `index`.
    /// * `HmsError::Declined` - the operator declined; nothing changes.
    pub fn request(&self, index: usize, confirm: &mut impl Confirm) -> HmsResult<&B> {
        let bill = self
            .bills
            .get(index)
            .ok_or_else(|| HmsError::InvalidInput(format!("no previous bill at {}", index + 1)))?;
        let prompt = format!(
            "Load bill {} from {}?\nThis will replace your current bill items.",
            bill.bill_number(),
            display_bill_date(bill.bill_date())
        );
        confirmed(confirm, &prompt)?;
        Ok(bill)
    }

    /// Records that the bill at `index` is now shown.
    pub fn loaded(&mut self, index: usize) {
        if index < self.bills.len() {
            self.index = Some(index);
        }
    }

    /// Returns to entering a new bill; also used after a failed detail fetch.
    pub fn reset(&mut self) {
        self.index = None;
    }

    /// `New`, or `k of n` while viewing a stored bill.
    pub fn position_label(&self) -> String {
        match self.index {
            None => "New".to_string(),
            Some(i) => format!("{} of {}", i + 1, self.bills.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill(id: i64, date: &str) -> OpBillSummary {
        OpBillSummary {
            id,
            bill_number: format!("OP-{id}"),
            bill_date: date.into(),
            ..OpBillSummary::default()
        }
    }

    fn history() -> BillHistory<OpBillSummary> {
        BillHistory::new(vec![
            bill(1, "2025-01-01T09:00:00"),
            bill(2, "garbage"),
            bill(3, "2025-03-01T09:00:00.123456"),
            bill(4, "2025-02-01"),
        ])
    }

    #[test]
    fn sorts_newest_first_with_bad_dates_last() {
        let ids: Vec<i64> = history().bills().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
    }

    #[test]
    fn next_and_prev_walk_the_list() {
        let mut h = history();
        assert_eq!(h.prev_target(), None);
        assert_eq!(h.next_target(), Some(0));
        h.loaded(0);
        assert_eq!(h.prev_target(), None);
        assert_eq!(h.next_target(), Some(1));
        h.loaded(3);
        assert_eq!(h.next_target(), None);
        assert_eq!(h.prev_target(), Some(2));
        assert_eq!(h.position_label(), "4 of 4");
    }

    #[test]
    fn declining_leaves_cursor() {
        let mut h = history();
        h.loaded(1);
        let err = h.request(2, &mut |_: &str| false).unwrap_err();
        assert!(matches!(err, HmsError::Declined));
        assert_eq!(h.index(), Some(1));
    }

    #[test]
    fn request_names_the_bill() {
        let h = history();
        let mut prompt = String::new();
        let picked = h
            .request(0, &mut |p: &str| {
                prompt = p.to_string();
                true
            })
            .unwrap();
        assert_eq!(picked.id, 3);
        assert!(prompt.starts_with("Load bill OP-3 from 01/03/2025?"));
    }

    #[test]
    fn reset_returns_to_new() {
        let mut h = history();
        h.loaded(2);
        h.reset();
        assert!(h.is_new());
        assert_eq!(h.position_label(), "New");
        assert!(h.current().is_none());
    }

    #[test]
    fn empty_history_has_no_targets() {
        let h: BillHistory<IpBillSummary> = BillHistory::new(Vec::new());
        assert_eq!(h.next_target(), None);
        assert!(h.request(0, &mut |_: &str| true).is_err());
    }
}
