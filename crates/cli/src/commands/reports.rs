use super::Ctx;
use crate::output;
use api_client::ApiResult;
use chrono::NaiveDate;
use clap::Args;
use hms_core::billing::format_money;
use hms_core::models::ReportKind;
use hms_core::print::report_table;
use hms_core::screens::ReportsScreen;
use hms_core::Route;
use tracing::warn;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// daily-op, bill-summary, patient-list or appointment-list
    pub kind: ReportKind,
    /// Report day for daily-op and appointment-list (yyyy-mm-dd); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Range start for bill-summary and patient-list
    #[arg(long)]
    pub start: Option<NaiveDate>,
    /// Range end for bill-summary and patient-list
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// Doctor filter for appointment-list
    #[arg(long)]
    pub doctor: Option<i64>,
    /// Save the raw report JSON to the output directory
    #[arg(long)]
    pub export: bool,
    /// Write a printable HTML copy to the output directory
    #[arg(long)]
    pub print: bool,
}

fn metric_rows(screen: &ReportsScreen) -> Vec<(String, String)> {
    let m = screen.metrics();
    let mut rows = vec![("Records".to_string(), m.record_count.to_string())];
    match screen.kind() {
        ReportKind::DailyOp => {
            rows.push(("Total revenue".into(), format_money(m.total_revenue)));
            rows.push(("Cash bills".into(), m.cash_bills.to_string()));
            rows.push(("Insurance bills".into(), m.insurance_bills.to_string()));
        }
        ReportKind::BillSummary => {
            rows.push(("Total revenue".into(), format_money(m.total_revenue)));
        }
        ReportKind::PatientList => {
            rows.push(("OP patients".into(), m.op_patients.to_string()));
            rows.push(("IP patients".into(), m.ip_patients.to_string()));
        }
        ReportKind::AppointmentList => {
            rows.extend(
                m.appointment_status
                    .iter()
                    .map(|(status, count)| (status.to_string(), count.to_string())),
            );
        }
    }
    rows
}

pub async fn run(ctx: &mut Ctx, args: ReportArgs) -> ApiResult<()> {
    ctx.open(Route::Reports)?;
    let today = ctx.today();
    let mut screen = ReportsScreen::new(today);
    screen.select(args.kind);

    let filters = &mut screen.filters;
    match args.kind {
        ReportKind::DailyOp | ReportKind::AppointmentList => {
            let day = args.date.unwrap_or(today);
            filters.start_date = day;
            filters.end_date = day;
        }
        ReportKind::BillSummary | ReportKind::PatientList => {
            filters.start_date = args.start.unwrap_or(today);
            filters.end_date = args.end.unwrap_or(today);
        }
    }
    filters.doctor_id = args.doctor;

    let request = screen.prepare_fetch()?;
    let body = ctx.desk.client().report(request.kind, &request.query).await;
    match ctx.desk.guard(body) {
        Ok(body) => output::maybe_notice(screen.apply_report(&request, body)),
        Err(e) if e.is_unauthorized() => return Err(e),
        Err(e) => {
            warn!(report = %request.kind, error = %e, "report request failed");
            output::maybe_notice(screen.fetch_failed(&request));
            return Err(e);
        }
    }

    let Some(data) = screen.data() else {
        return Ok(());
    };
    println!("{} ({})", args.kind.label(), screen.filters.period(args.kind));
    output::pairs(&metric_rows(&screen));
    println!();
    output::table(&report_table(data));

    if args.export {
        if let Some(path) = screen.export(ctx.config.output_dir(), today)? {
            println!("Exported to {}", path.display());
        }
    }
    if args.print {
        if let Some(doc) = screen.print_document(ctx.now()) {
            ctx.print(&doc, "report", args.kind.slug())?;
        }
    }
    Ok(())
}
