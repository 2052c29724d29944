//! Printable documents.
//!
//! Every document is a single HTML string with inline CSS and no external assets, so it can be
//! written to a file and opened by any browser for printing. All text coming from users or the
//! backend passes through [`escape_html`].

use crate::billing::{format_money, BillTotals, IpLineItem, LineItem, OpLineItem, Taxes};
use crate::config::HospitalInfo;
use crate::history::display_bill_date;
use crate::models::{bill_type_label, ReportData};
use crate::{HmsError, HmsResult};
use chrono::NaiveDateTime;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const STYLE: &str = "body{font-family:Arial,Helvetica,sans-serif;margin:24px;color:#111}\
header{text-align:center;border-bottom:2px solid #333;padding-bottom:8px;margin-bottom:16px}\
header h1{margin:0;font-size:22px}header p{margin:2px 0;font-size:12px}\
h2{text-align:center;font-size:18px;margin:12px 0}\
table{width:100%;border-collapse:collapse;font-size:12px}\
th,td{border:1px solid #999;padding:4px 6px;text-align:left}th{background:#eee}\
.meta td{border:none;padding:2px 6px}.num{text-align:right}\
.totals{margin-top:12px;margin-left:auto;width:40%}\
.totals td{border:none}.totals tr:last-child td{font-weight:bold;border-top:1px solid #333}\
footer{margin-top:32px;font-size:11px;text-align:center;color:#555}\
@media print{body{margin:0}}";

/// Escapes the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// File name for a printed document: `<kind>-<identifier>.html`, with path-hostile
/// characters in the identifier replaced.
pub fn file_name(kind: &str, identifier: &str) -> String {
    let id: String = identifier
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let id = if id.is_empty() { "draft".to_string() } else { id };
    format!("{kind}-{id}.html")
}

/// Column headers plus rows of already-formatted cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrintDocument {
    pub title: String,
    pub meta: Vec<(String, String)>,
    pub table: Table,
    pub totals: Vec<(String, String)>,
    pub footer: String,
}

impl PrintDocument {
    /// Renders the complete document under the hospital header.
    pub fn render(&self, hospital: &HospitalInfo) -> String {
        let mut html = String::new();
        // writing into a String cannot fail
        let _ = write!(
            html,
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title><style>{}</style></head><body>",
            escape_html(&self.title),
            STYLE
        );
        let _ = write!(
            html,
            "<header><h1>{}</h1><p>{}</p><p>Phone: {}</p></header><h2>{}</h2>",
            escape_html(&hospital.name),
            escape_html(&hospital.address),
            escape_html(&hospital.phone),
            escape_html(&self.title)
        );

        if !self.meta.is_empty() {
            html.push_str("<table class=\"meta\">");
            for pair in self.meta.chunks(2) {
                html.push_str("<tr>");
                for (label, value) in pair {
                    let _ = write!(
                        html,
                        "<td><strong>{}:</strong> {}</td>",
                        escape_html(label),
                        escape_html(value)
                    );
                }
                html.push_str("</tr>");
            }
            html.push_str("</table><br>");
        }

        html.push_str("<table><thead><tr>");
        for header in &self.table.headers {
            let _ = write!(html, "<th>{}</th>", escape_html(header));
        }
        html.push_str("</tr></thead><tbody>");
        for row in &self.table.rows {
            html.push_str("<tr>");
            for cell in row {
                let _ = write!(html, "<td>{}</td>", escape_html(cell));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table>");

        if !self.totals.is_empty() {
            html.push_str("<table class=\"totals\">");
            for (label, value) in &self.totals {
                let _ = write!(
                    html,
                    "<tr><td>{}</td><td class=\"num\">{}</td></tr>",
                    escape_html(label),
                    escape_html(value)
                );
            }
            html.push_str("</table>");
        }

        let _ = write!(
            html,
            "<footer>{}</footer></body></html>",
            escape_html(&self.footer)
        );
        html
    }

    /// Renders the document into `dir/<kind>-<identifier>.html` and returns the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file cannot be written.
    pub fn write(
        &self,
        hospital: &HospitalInfo,
        dir: &Path,
        kind: &str,
        identifier: &str,
    ) -> HmsResult<PathBuf> {
        fs::create_dir_all(dir).map_err(HmsError::DirCreation)?;
        let path = dir.join(file_name(kind, identifier));
        fs::write(&path, self.render(hospital)).map_err(HmsError::FileWrite)?;
        info!(path = %path.display(), "document written");
        Ok(path)
    }
}

/// Header fields printed above a bill's line items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BillHeading {
    pub bill_number: String,
    pub bill_date: String,
    pub patient_name: String,
    pub patient_number: String,
    pub doctor_name: String,
    /// Kind-specific rows such as bill type or room.
    pub extra: Vec<(String, String)>,
}

impl BillHeading {
    fn meta(&self) -> Vec<(String, String)> {
        let mut meta = vec![
            ("Bill No".to_string(), self.bill_number.clone()),
            ("Date".to_string(), display_bill_date(&self.bill_date)),
            ("Patient".to_string(), self.patient_name.clone()),
            ("Patient No".to_string(), self.patient_number.clone()),
            ("Doctor".to_string(), self.doctor_name.clone()),
        ];
        meta.extend(self.extra.iter().cloned());
        meta
    }
}

fn totals_rows(totals: &BillTotals) -> Vec<(String, String)> {
    vec![
        ("Total Amount".into(), format_money(totals.total_amount)),
        ("Discount".into(), format_money(totals.total_discount)),
    ]
}

const BILL_FOOTER: &str = "Thank you. Wish you a speedy recovery.";

pub fn op_bill_document(heading: &BillHeading, lines: &[OpLineItem], totals: &BillTotals) -> PrintDocument {
    let mut table = Table::new(&[
        "#",
        "Particular",
        "Doctor",
        "Department",
        "Unit",
        "Rate",
        "Amount",
        "Disc %",
        "Discount",
        "Total",
    ]);
    for (i, line) in lines.iter().enumerate() {
        table.rows.push(vec![
            (i + 1).to_string(),
            line.particular.clone(),
            line.doctor.clone(),
            line.department.clone(),
            line.unit().to_string(),
            format_money(line.rate()),
            format_money(line.amount()),
            format!("{}", line.discount_percent()),
            format_money(line.discount_amount()),
            format_money(line.total()),
        ]);
    }

    let mut rows = totals_rows(totals);
    rows.push(("Net Amount".into(), format_money(totals.net_amount)));
    PrintDocument {
        title: "OUTPATIENT BILL".into(),
        meta: heading.meta(),
        table,
        totals: rows,
        footer: BILL_FOOTER.into(),
    }
}

pub fn ip_bill_document(
    heading: &BillHeading,
    lines: &[IpLineItem],
    taxes: &Taxes,
    totals: &BillTotals,
) -> PrintDocument {
    let mut table = Table::new(&["#", "Particular", "Department", "Amount", "Disc %", "Discount", "Total"]);
    for (i, line) in lines.iter().enumerate() {
        table.rows.push(vec![
            (i + 1).to_string(),
            line.particular.clone(),
            line.department.clone(),
            format_money(line.amount()),
            format!("{}", line.discount_percent()),
            format_money(line.discount_amount()),
            format_money(line.total()),
        ]);
    }

    let mut rows = totals_rows(totals);
    rows.push(("Sub Total".into(), format_money(totals.sub_total)));
    rows.push(("Service Tax".into(), format_money(taxes.service_tax)));
    rows.push(("Education Cess".into(), format_money(taxes.education_cess)));
    rows.push(("SHE Education Cess".into(), format_money(taxes.she_education_cess)));
    rows.push(("Net Amount".into(), format_money(totals.net_amount)));
    PrintDocument {
        title: "INPATIENT BILL".into(),
        meta: heading.meta(),
        table,
        totals: rows,
        footer: BILL_FOOTER.into(),
    }
}

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("N/A")
        .to_string()
}

/// The tabular part of a report, shared by printing and terminal output.
pub fn report_table(data: &ReportData) -> Table {
    match data {
        ReportData::DailyOp(bills) => {
            let mut table = Table::new(&[
                "Bill No", "Patient", "Doctor", "Type", "Amount", "Discount", "Net",
            ]);
            for bill in bills {
                table.rows.push(vec![
                    bill.bill_number.clone(),
                    or_na(bill.patient.as_ref().map(|p| p.name.as_str())),
                    or_na(bill.doctor.as_ref().map(|d| d.name.as_str())),
                    bill.bill_type.clone(),
                    format_money(bill.total_amount),
                    format_money(bill.discount_amount),
                    format_money(bill.net_amount),
                ]);
            }
            table
        }
        ReportData::BillSummary(summary) => {
            let mut table = Table::new(&["Bill No", "Type", "Patient", "Date", "Net"]);
            let op = summary.op_bills.iter().map(|b| {
                (&b.bill_number, b.patient.as_ref(), &b.bill_date, b.net_amount)
            });
            let ip = summary.ip_bills.iter().map(|b| {
                (&b.bill_number, b.patient.as_ref(), &b.bill_date, b.net_amount)
            });
            for (number, patient, date, net) in op.chain(ip) {
                table.rows.push(vec![
                    number.clone(),
                    bill_type_label(number).to_string(),
                    or_na(patient.map(|p| p.name.as_str())),
                    display_bill_date(date),
                    format_money(net),
                ]);
            }
            table
        }
        ReportData::PatientList(patients) => {
            let mut table = Table::new(&[
                "Patient No", "Name", "Age/Gender", "Phone", "Address", "Registered", "Type",
            ]);
            for p in patients {
                let number = if p.is_ip { &p.ip_number } else { &p.op_number };
                table.rows.push(vec![
                    number.clone().unwrap_or_default(),
                    p.name.clone(),
                    format!("{} / {}", p.age, p.gender),
                    p.phone.clone(),
                    p.address(),
                    display_bill_date(&p.registration_date),
                    if p.is_ip { "INPATIENT" } else { "OUTPATIENT" }.to_string(),
                ]);
            }
            table
        }
        ReportData::AppointmentList(rows) => {
            let mut table = Table::new(&["Token", "Patient", "Phone", "Doctor", "Date", "Status", "Notes"]);
            for a in rows {
                table.rows.push(vec![
                    a.token_number.to_string(),
                    or_na(a.patient_name.as_deref()),
                    a.patient_phone.clone().unwrap_or_default(),
                    or_na(a.doctor_name.as_deref()),
                    display_bill_date(&a.appointment_date),
                    a.status.clone(),
                    a.notes.clone().unwrap_or_default(),
                ]);
            }
            table
        }
    }
}

/// A printable report with its summary figures.
///
/// `period` describes the filters, e.g. `2025-01-01 to 2025-01-31`.
pub fn report_document(data: &ReportData, period: &str, generated_at: NaiveDateTime) -> PrintDocument {
    let kind = data.kind();
    let metrics = data.metrics();
    let mut totals = vec![("Records".to_string(), metrics.record_count.to_string())];
    match data {
        ReportData::DailyOp(_) | ReportData::BillSummary(_) => {
            totals.push(("Total Revenue".into(), format_money(metrics.total_revenue)));
        }
        ReportData::PatientList(_) => {
            totals.push(("Outpatients".into(), metrics.op_patients.to_string()));
            totals.push(("Inpatients".into(), metrics.ip_patients.to_string()));
        }
        ReportData::AppointmentList(_) => {
            for (status, count) in &metrics.appointment_status {
                totals.push((status.to_string(), count.to_string()));
            }
        }
    }

    PrintDocument {
        title: kind.label().to_uppercase(),
        meta: vec![("Period".into(), period.to_string())],
        table: report_table(data),
        totals,
        footer: format!(
            "Report generated on {} at {}",
            generated_at.format("%d %B %Y"),
            generated_at.format("%I:%M %p")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OpBillSummary, Patient};
    use chrono::NaiveDate;

    fn hospital() -> HospitalInfo {
        HospitalInfo {
            name: "City <Nursing> Home".into(),
            address: "North & South".into(),
            phone: "123".into(),
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"A" & 'B'</b>"#),
            "&lt;b&gt;&quot;A&quot; &amp; &#39;B&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn op_bill_renders_escaped_self_contained_html() {
        let heading = BillHeading {
            bill_number: "OP20250101-0001".into(),
            bill_date: "2025-01-01T10:00:00".into(),
            patient_name: "<script>alert(1)</script>".into(),
            ..BillHeading::default()
        };
        let lines = vec![OpLineItem::priced("Consultation", "OPD", 1.0, 300.0, 10.0).unwrap()];
        let totals = BillTotals::compute(&lines, 0.0);
        let html = op_bill_document(&heading, &lines, &totals).render(&hospital());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<style>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("City &lt;Nursing&gt; Home"));
        assert!(html.contains("01/01/2025"));
        assert!(html.contains("₹270.00"));
        assert!(!html.contains("http://") && !html.contains("https://"));
    }

    #[test]
    fn ip_bill_lists_taxes() {
        let lines = vec![IpLineItem::priced("Room Charges", "General", 1000.0, 0.0).unwrap()];
        let taxes = Taxes::new(50.0, 1.0, 0.5).unwrap();
        let totals = BillTotals::compute(&lines, taxes.sum());
        let doc = ip_bill_document(&BillHeading::default(), &lines, &taxes, &totals);
        let labels: Vec<&str> = doc.totals.iter().map(|(l, _)| l.as_str()).collect();
        assert!(labels.contains(&"Service Tax"));
        assert_eq!(doc.totals.last().unwrap().1, "₹1051.50");
    }

    #[test]
    fn report_document_summarises() {
        let data = ReportData::DailyOp(vec![OpBillSummary {
            bill_number: "OP1".into(),
            bill_type: "Cash".into(),
            net_amount: 120.0,
            ..OpBillSummary::default()
        }]);
        let at = NaiveDate::from_ymd_opt(2025, 5, 4).unwrap().and_hms_opt(15, 30, 0).unwrap();
        let doc = report_document(&data, "2025-05-04", at);
        assert_eq!(doc.title, "DAILY OP REPORT");
        assert_eq!(doc.table.rows[0][1], "N/A");
        assert!(doc.totals.contains(&("Total Revenue".to_string(), "₹120.00".to_string())));
        assert_eq!(doc.footer, "Report generated on 04 May 2025 at 03:30 PM");
    }

    #[test]
    fn patient_table_uses_kind_number() {
        let data = ReportData::PatientList(vec![Patient {
            is_ip: true,
            ip_number: Some("IP-202501-000001".into()),
            op_number: Some("OP-202501-001".into()),
            ..Patient::default()
        }]);
        let table = report_table(&data);
        assert_eq!(table.rows[0][0], "IP-202501-000001");
        assert_eq!(table.rows[0][6], "INPATIENT");
    }

    #[test]
    fn file_names_are_path_safe() {
        assert_eq!(file_name("op-bill", "OP20250101-0001"), "op-bill-OP20250101-0001.html");
        assert_eq!(file_name("report", "a/b c"), "report-a_b_c.html");
        assert_eq!(file_name("ip-bill", ""), "ip-bill-draft.html");
    }

    #[test]
    fn write_creates_output_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let doc = PrintDocument {
            title: "T".into(),
            ..PrintDocument::default()
        };
        let path = doc
            .write(&hospital(), &dir.path().join("prints"), "report", "daily-op")
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "report-daily-op.html");
        assert!(std::fs::read_to_string(path).unwrap().ends_with("</html>"));
    }
}
