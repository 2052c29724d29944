//! Parameterised report queries with summary figures, printing and JSON export.

use super::{Ticket, TicketCounter};
use crate::models::{ReportData, ReportKind, ReportMetrics};
use crate::notice::Notice;
use crate::print::{report_document, PrintDocument};
use crate::{HmsError, HmsResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Report filters. Every date defaults to today.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFilters {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub doctor_id: Option<i64>,
}

impl ReportFilters {
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            start_date: day,
            end_date: day,
            doctor_id: None,
        }
    }

    /// Query parameters `kind` expects.
    pub fn query(&self, kind: ReportKind) -> Vec<(&'static str, String)> {
        let day = |d: NaiveDate| d.format("%Y-%m-%d").to_string();
        match kind {
            ReportKind::DailyOp => vec![("report_date", day(self.start_date))],
            ReportKind::BillSummary | ReportKind::PatientList => vec![
                ("start_date", day(self.start_date)),
                ("end_date", day(self.end_date)),
            ],
            ReportKind::AppointmentList => {
                let mut q = vec![("appointment_date", day(self.start_date))];
                if let Some(id) = self.doctor_id.filter(|id| *id > 0) {
                    q.push(("doctor_id", id.to_string()));
                }
                q
            }
        }
    }

    /// Human-readable period for printed reports.
    pub fn period(&self, kind: ReportKind) -> String {
        let day = |d: NaiveDate| d.format("%d/%m/%Y").to_string();
        match kind {
            ReportKind::DailyOp | ReportKind::AppointmentList => day(self.start_date),
            ReportKind::BillSummary | ReportKind::PatientList => {
                format!("{} to {}", day(self.start_date), day(self.end_date))
            }
        }
    }
}

/// A query ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub ticket: Ticket,
    pub kind: ReportKind,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone)]
pub struct ReportsScreen {
    kind: ReportKind,
    pub filters: ReportFilters,
    raw: Option<Value>,
    data: Option<ReportData>,
    tickets: TicketCounter,
}

impl ReportsScreen {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            kind: ReportKind::DailyOp,
            filters: ReportFilters::for_day(today),
            raw: None,
            data: None,
            tickets: TicketCounter::default(),
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn data(&self) -> Option<&ReportData> {
        self.data.as_ref()
    }

    /// Switches the active report; its previous data no longer applies.
    pub fn select(&mut self, kind: ReportKind) {
        if kind != self.kind {
            self.kind = kind;
            self.raw = None;
            self.data = None;
        }
    }

    /// Builds the query for the active report. Any earlier query still in flight is superseded.
    ///
    /// # Errors
    ///
    /// `HmsError::InvalidInput` when the end date precedes the start date of a range report.
    pub fn prepare_fetch(&mut self) -> HmsResult<ReportRequest> {
        if matches!(self.kind, ReportKind::BillSummary | ReportKind::PatientList)
            && self.filters.end_date < self.filters.start_date
        {
            return Err(HmsError::InvalidInput(
                "end date cannot be before start date".into(),
            ));
        }
        Ok(ReportRequest {
            ticket: self.tickets.issue(),
            kind: self.kind,
            path: self.kind.path(),
            query: self.filters.query(self.kind),
        })
    }

    /// Installs a report body. Stale responses are ignored; a malformed body clears the data.
    pub fn apply_report(&mut self, request: &ReportRequest, body: Value) -> Option<Notice> {
        if !self.tickets.is_current(request.ticket) || request.kind != self.kind {
            return None;
        }
        match ReportData::from_value(request.kind, body.clone()) {
            Ok(data) => {
                self.data = Some(data);
                self.raw = Some(body);
                None
            }
            Err(e) => {
                warn!(report = %request.kind, error = %e, "unexpected report body");
                self.data = None;
                self.raw = None;
                Some(Notice::error("Failed to fetch report"))
            }
        }
    }

    pub fn fetch_failed(&mut self, request: &ReportRequest) -> Option<Notice> {
        if !self.tickets.is_current(request.ticket) {
            return None;
        }
        self.data = None;
        self.raw = None;
        Some(Notice::error("Failed to fetch report"))
    }

    /// Summary figures; all zero while no report is loaded.
    pub fn metrics(&self) -> ReportMetrics {
        self.data.as_ref().map(ReportData::metrics).unwrap_or_default()
    }

    /// Writes the raw report JSON, pretty-printed, to `<kind>-<yyyy-MM-dd>.json` in `dir`.
    ///
    /// Returns `Ok(None)` when there is nothing to export.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot be written.
    pub fn export(&self, dir: &Path, today: NaiveDate) -> HmsResult<Option<PathBuf>> {
        let Some(raw) = &self.raw else {
            return Ok(None);
        };
        fs::create_dir_all(dir).map_err(HmsError::DirCreation)?;
        let path = dir.join(format!("{}-{}.json", self.kind.slug(), today.format("%Y-%m-%d")));
        let json = serde_json::to_string_pretty(raw).map_err(HmsError::Serialization)?;
        fs::write(&path, json).map_err(HmsError::FileWrite)?;
        info!(path = %path.display(), "report exported");
        Ok(Some(path))
    }

    pub fn print_document(&self, generated_at: NaiveDateTime) -> Option<PrintDocument> {
        self.data
            .as_ref()
            .map(|data| report_document(data, &self.filters.period(self.kind), generated_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    #[test]
    fn query_parameters_per_kind() {
        let mut f = ReportFilters::for_day(day(5));
        assert_eq!(f.query(ReportKind::DailyOp), vec![("report_date", "2025-08-05".to_string())]);
        f.end_date = day(9);
        assert_eq!(f.query(ReportKind::PatientList)[1], ("end_date", "2025-08-09".to_string()));
        assert_eq!(f.query(ReportKind::AppointmentList).len(), 1);
        f.doctor_id = Some(3);
        assert_eq!(f.query(ReportKind::AppointmentList)[1], ("doctor_id", "3".to_string()));
    }

    #[test]
    fn stale_report_is_ignored() {
        let mut s = ReportsScreen::new(day(1));
        let first = s.prepare_fetch().unwrap();
        let second = s.prepare_fetch().unwrap();
        assert!(s.apply_report(&first, json!([{"id": 1, "net_amount": 10.0}])).is_none());
        assert!(s.data().is_none());
        s.apply_report(&second, json!([{"id": 2, "net_amount": 20.0}]));
        assert_eq!(s.metrics().total_revenue, 20.0);
    }

    #[test]
    fn failure_clears_data() {
        let mut s = ReportsScreen::new(day(1));
        let req = s.prepare_fetch().unwrap();
        s.apply_report(&req, json!([]));
        assert!(s.data().is_some());
        let req = s.prepare_fetch().unwrap();
        assert!(s.fetch_failed(&req).unwrap().is_error());
        assert!(s.data().is_none());
        assert_eq!(s.metrics(), ReportMetrics::default());
    }

    #[test]
    fn malformed_body_is_an_error_notice() {
        let mut s = ReportsScreen::new(day(1));
        s.select(ReportKind::BillSummary);
        let req = s.prepare_fetch().unwrap();
        let notice = s.apply_report(&req, json!("nope")).unwrap();
        assert!(notice.is_error());
    }

    #[test]
    fn range_must_be_ordered() {
        let mut s = ReportsScreen::new(day(10));
        s.select(ReportKind::BillSummary);
        s.filters.end_date = day(2);
        assert!(s.prepare_fetch().is_err());
    }

    #[test]
    fn export_writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let mut s = ReportsScreen::new(day(1));
        assert_eq!(s.export(dir.path(), day(1)).unwrap(), None);

        s.select(ReportKind::PatientList);
        let req = s.prepare_fetch().unwrap();
        s.apply_report(&req, json!([{"id": 4, "name": "Anu", "is_ip": false}]));
        let path = s.export(&dir.path().join("out"), day(12)).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "patient-list-2025-08-12.json");
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\n  {"));
        let back: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(back[0]["name"], "Anu");
    }

    #[test]
    fn print_needs_data() {
        let mut s = ReportsScreen::new(day(1));
        let at = day(1).and_hms_opt(9, 0, 0).unwrap();
        assert!(s.print_document(at).is_none());
        let req = s.prepare_fetch().unwrap();
        s.apply_report(&req, json!([]));
        assert_eq!(s.print_document(at).unwrap().meta[0].1, "01/08/2025");
    }
}
