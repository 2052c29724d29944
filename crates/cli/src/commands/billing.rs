use super::patients::{patient_table, PatientArgs};
use super::{fields, invalid, number, Ctx};
use crate::output;
use api_client::ApiResult;
use clap::Args;
use hms_core::billing::format_money;
use hms_core::history::{display_bill_date, BillHistory, DatedBill};
use hms_core::models::PatientKind;
use hms_core::print::{PrintDocument, Table};
use hms_core::screens::{IpBillScreen, OpBillScreen};
use hms_core::{HmsError, Route};
use std::str::FromStr;
use tracing::warn;

/// `particular:unit:rate[:discount%[:department[:doctor]]]`
#[derive(Debug, Clone)]
pub struct OpLineArg {
    particular: String,
    unit: f64,
    rate: f64,
    discount: f64,
    department: Option<String>,
    doctor: Option<String>,
}

impl FromStr for OpLineArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let f = fields(s, 3, 6, "particular:unit:rate[:discount[:department[:doctor]]]")?;
        Ok(Self {
            particular: f[0].clone(),
            unit: number(&f[1], "unit")?,
            rate: number(&f[2], "rate")?,
            discount: f.get(3).map(|d| number(d, "discount")).transpose()?.unwrap_or(0.0),
            department: f.get(4).cloned().filter(|d| !d.is_empty()),
            doctor: f.get(5).cloned().filter(|d| !d.is_empty()),
        })
    }
}

/// `particular:amount[:discount%[:department]]`
#[derive(Debug, Clone)]
pub struct IpLineArg {
    particular: String,
    amount: f64,
    discount: f64,
    department: Option<String>,
}

impl FromStr for IpLineArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let f = fields(s, 2, 4, "particular:amount[:discount[:department]]")?;
        Ok(Self {
            particular: f[0].clone(),
            amount: number(&f[1], "amount")?,
            discount: f.get(2).map(|d| number(d, "discount")).transpose()?.unwrap_or(0.0),
            department: f.get(3).cloned().filter(|d| !d.is_empty()),
        })
    }
}

/// Options shared by both bill screens.
#[derive(Args, Debug)]
pub struct BillActions {
    /// Load the stored bill at this position (0 is the latest)
    #[arg(long)]
    pub load: Option<usize>,
    /// Bill line; repeat for several lines. Replaces the default lines
    #[arg(long = "line")]
    pub lines: Vec<String>,
    /// Write a printable HTML copy to the output directory
    #[arg(long)]
    pub print: bool,
    /// Save the bill
    #[arg(long)]
    pub save: bool,
}

#[derive(Args, Debug)]
pub struct OpBillArgs {
    /// Search existing OP patients
    #[arg(long)]
    pub search: Option<String>,
    /// Patient id from the search results
    #[arg(long, requires = "search")]
    pub pick: Option<i64>,
    /// Cash, Card, UPI, Cheque or Insurance
    #[arg(long)]
    pub bill_type: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[command(flatten)]
    pub actions: BillActions,
    /// New patient details, used when no patient is picked
    #[command(flatten)]
    pub patient: PatientArgs,
}

#[derive(Args, Debug)]
pub struct IpBillArgs {
    /// Exact IP number of the patient
    #[arg(long)]
    pub ip_number: Option<String>,
    #[arg(long)]
    pub credit: bool,
    #[arg(long)]
    pub insurance: bool,
    /// General, Emergency, ICU, Surgery or Maternity
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub doctor: Option<i64>,
    #[arg(long)]
    pub discount_type: Option<String>,
    #[arg(long)]
    pub room: Option<String>,
    /// yyyy-mm-dd
    #[arg(long)]
    pub admission_date: Option<String>,
    #[arg(long)]
    pub insurance_company: Option<String>,
    #[arg(long)]
    pub third_party: Option<String>,
    /// Omitted taxes keep their current value; 0 clears one
    #[arg(long, allow_negative_numbers = true)]
    pub service_tax: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub education_cess: Option<f64>,
    #[arg(long, allow_negative_numbers = true)]
    pub she_education_cess: Option<f64>,
    #[command(flatten)]
    pub actions: BillActions,
}

fn history_table<B: DatedBill>(history: &BillHistory<B>, net: impl Fn(&B) -> f64) -> Table {
    Table {
        headers: vec!["#".into(), "Bill No".into(), "Date".into(), "Net".into()],
        rows: history
            .bills()
            .iter()
            .enumerate()
            .map(|(i, b)| {
                vec![
                    i.to_string(),
                    b.bill_number().to_string(),
                    display_bill_date(b.bill_date()),
                    format_money(net(b)),
                ]
            })
            .collect(),
    }
}

fn show(doc: &PrintDocument, position: &str) {
    println!("{} [{position}]", doc.title);
    output::pairs(&doc.meta);
    output::table(&doc.table);
    output::pairs(&doc.totals);
}

fn parse_lines<T: FromStr<Err = String>>(raw: &[String]) -> ApiResult<Vec<T>> {
    raw.iter()
        .map(|l| l.parse::<T>().map_err(invalid))
        .collect()
}

pub async fn op_bill(ctx: &mut Ctx, args: OpBillArgs) -> ApiResult<()> {
    ctx.open(Route::OpBilling)?;
    let lines: Vec<OpLineArg> = parse_lines(&args.actions.lines)?;
    let mut screen = OpBillScreen::new();

    let client = ctx.desk.client();
    let lookups = tokio::try_join!(client.doctors(), client.particulars());
    let (doctors, particulars) = ctx.desk.guard(lookups)?;
    screen.apply_doctors(doctors);
    screen.apply_particulars(particulars);

    if let Some(term) = &args.search {
        screen.search_term = term.clone();
        let query = screen.prepare_search()?;
        let found = ctx.desk.client().search_patients_of(PatientKind::Op, &query).await;
        match ctx.desk.guard(found) {
            Ok(results) => output::notice(&screen.apply_search(results)),
            Err(e) => {
                output::notice(&screen.search_failed());
                return Err(e);
            }
        }
        output::table(&patient_table(&screen.results().iter().collect::<Vec<_>>()));

        let chosen = match (args.pick, screen.results()) {
            (Some(id), results) => results
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| invalid(format!("patient {id} is not in the search results")))?,
            (None, [only]) => only.clone(),
            (None, []) => return Ok(()),
            (None, _) => {
                println!("Several patients match; choose one with --pick <id>");
                return Ok(());
            }
        };

        let patient_id = chosen.id;
        let ticket = screen.select_patient(chosen);
        let bills = ctx.desk.client().op_bills(patient_id).await;
        match ctx.desk.guard(bills) {
            Ok(bills) => output::maybe_notice(screen.apply_history(ticket, bills)),
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => warn!(error = %e, "previous bills unavailable"),
        }
        if !screen.history().is_empty() {
            output::table(&history_table(screen.history(), |b| b.net_amount));
        }

        if let Some(index) = args.actions.load {
            let bill_id = screen.request_bill(index, &mut output::confirmer(ctx.assume_yes))?;
            let details = ctx.desk.client().op_bill_details(bill_id).await;
            match ctx.desk.guard(details) {
                Ok(details) => output::maybe_notice(screen.apply_bill(ticket, index, details)),
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => {
                    warn!(error = %e, bill_id, "bill details unavailable");
                    output::maybe_notice(screen.bill_failed(ticket));
                }
            }
        }
    } else if args.actions.load.is_some() {
        return Err(invalid("--load needs a patient; use --search"));
    }

    if screen.selected().is_none() {
        args.patient.apply(&mut screen.patient_form);
    }
    if let Some(bill_type) = &args.bill_type {
        screen.bill_form.bill_type = bill_type.clone();
        screen.bill_form.payment_mode = bill_type.clone();
    }
    if let Some(category) = &args.category {
        screen.bill_form.category = category.clone();
    }
    if !lines.is_empty() {
        for (i, arg) in lines.iter().enumerate() {
            if i >= screen.lines().len() {
                screen.add_line();
            }
            let line = screen.line_mut(i)?;
            line.particular = arg.particular.clone();
            if let Some(department) = &arg.department {
                line.department = department.clone();
            }
            if let Some(doctor) = &arg.doctor {
                line.doctor = doctor.clone();
            }
            line.set_unit(arg.unit)?;
            line.set_rate(arg.rate)?;
            line.set_discount_percent(arg.discount)?;
        }
        while screen.lines().len() > lines.len() {
            screen.remove_line(screen.lines().len() - 1)?;
        }
    }

    let today = ctx.today();
    let doc = screen.print_document(today);
    show(&doc, &screen.history().position_label());
    if args.actions.print {
        let id = screen
            .history()
            .current()
            .map(|b| b.bill_number.clone())
            .unwrap_or_default();
        ctx.print(&doc, "op-bill", &id)?;
    }

    if args.actions.save {
        let plan = screen.prepare_save(ctx.now())?;
        let (patient_id, patient_number) = match (&plan.new_patient, plan.patient_id) {
            (Some(body), _) => {
                let created = ctx.desk.client().create_patient(body).await;
                let patient = ctx.desk.guard(created)?;
                (patient.id, Some(patient.display_number().to_string()))
            }
            (None, Some(id)) => (id, None),
            (None, None) => return Err(HmsError::NoPatientSelected.into()),
        };
        let bill = plan.bill(patient_id, patient_number.as_deref());
        let created = ctx.desk.client().create_op_bill(&bill).await;
        let created = ctx.desk.guard(created)?;
        let bill_number = if created.bill_number.trim().is_empty() {
            plan.bill_number.clone()
        } else {
            created.bill_number
        };
        output::notice(&screen.apply_saved(&plan, &bill_number));
    }
    Ok(())
}

pub async fn ip_bill(ctx: &mut Ctx, args: IpBillArgs) -> ApiResult<()> {
    ctx.open(Route::IpBilling)?;
    let lines: Vec<IpLineArg> = parse_lines(&args.actions.lines)?;
    let today = ctx.today();
    let mut screen = IpBillScreen::new(today);

    let client = ctx.desk.client();
    let lookups = tokio::try_join!(client.doctors(), client.patients(Some(true)), client.particulars());
    let (doctors, patients, particulars) = ctx.desk.guard(lookups)?;
    screen.apply_doctors(doctors);
    screen.apply_patients(patients);
    screen.apply_particulars(particulars);

    if let Some(ip_number) = &args.ip_number {
        let ticket = screen.find_patient(ip_number)?;
        let patient_id = screen.form.patient_id;
        if let Some(patient) = screen.selected() {
            println!("Patient: {} ({})", patient.name, patient.display_number());
        }
        let bills = ctx.desk.client().ip_bills(patient_id).await;
        match ctx.desk.guard(bills) {
            Ok(bills) => output::maybe_notice(screen.apply_history(ticket, bills)),
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => warn!(error = %e, "previous bills unavailable"),
        }
        if !screen.history().is_empty() {
            output::table(&history_table(screen.history(), |b| b.net_amount));
        }

        if let Some(index) = args.actions.load {
            let bill_id = screen.request_bill(index, &mut output::confirmer(ctx.assume_yes))?;
            let details = ctx.desk.client().ip_bill_details(bill_id).await;
            match ctx.desk.guard(details) {
                Ok(details) => output::maybe_notice(screen.apply_bill(ticket, index, details)),
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => {
                    warn!(error = %e, bill_id, "bill details unavailable");
                    output::maybe_notice(screen.bill_failed(ticket));
                }
            }
        }
    } else if args.actions.load.is_some() {
        return Err(invalid("--load needs a patient; use --ip-number"));
    }

    let form = &mut screen.form;
    form.is_credit |= args.credit;
    form.is_insurance |= args.insurance;
    let text = [
        (&args.category, &mut form.category),
        (&args.discount_type, &mut form.discount_type),
        (&args.room, &mut form.room),
        (&args.admission_date, &mut form.admission_date),
        (&args.insurance_company, &mut form.insurance_company),
        (&args.third_party, &mut form.third_party),
    ];
    for (arg, field) in text {
        if let Some(value) = arg {
            *field = value.clone();
        }
    }
    if let Some(doctor) = args.doctor {
        form.doctor_id = doctor;
    }
    form.update_taxes(args.service_tax, args.education_cess, args.she_education_cess)?;
    if !lines.is_empty() {
        for (i, arg) in lines.iter().enumerate() {
            if i >= screen.lines().len() {
                screen.add_line();
            }
            let line = screen.line_mut(i)?;
            line.particular = arg.particular.clone();
            if let Some(department) = &arg.department {
                line.department = department.clone();
            }
            line.set_amount(arg.amount)?;
            line.set_discount_percent(arg.discount)?;
        }
        while screen.lines().len() > lines.len() {
            screen.remove_line(screen.lines().len() - 1)?;
        }
    }

    let doc = screen.print_document(today);
    show(&doc, &screen.history().position_label());
    if args.actions.print {
        let id = screen
            .history()
            .current()
            .map(|b| b.bill_number.clone())
            .unwrap_or_default();
        ctx.print(&doc, "ip-bill", &id)?;
    }

    if args.actions.save {
        let bill = screen.prepare_save()?;
        let created = ctx.desk.client().create_ip_bill(&bill).await;
        let created = ctx.desk.guard(created)?;
        output::notice(&screen.apply_saved(&created.bill_number, today));
    }
    Ok(())
}
