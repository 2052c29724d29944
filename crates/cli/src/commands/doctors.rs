use super::Ctx;
use crate::output;
use api_client::ApiResult;
use clap::{Args, Subcommand};
use hms_core::billing::format_money;
use hms_core::models::Doctor;
use hms_core::print::Table;
use hms_core::screens::{DoctorMasterScreen, DoctorSave};
use hms_core::Route;

#[derive(Subcommand, Debug)]
pub enum DoctorCommand {
    /// List doctors, optionally filtered by name, code, specialty or department
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a doctor. A blank code is generated
    Add(DoctorArgs),
    /// Edit the listed doctor with this id
    Edit {
        id: i64,
        #[command(flatten)]
        doctor: DoctorArgs,
    },
    Delete { id: i64 },
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub qualification: Option<String>,
    #[arg(long)]
    pub specialty: Option<String>,
    #[arg(long)]
    pub department: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub booking_code: Option<String>,
    #[arg(long)]
    pub op_validity: Option<i64>,
    #[arg(long)]
    pub max_tokens: Option<i64>,
    #[arg(long)]
    pub doctor_amount: Option<f64>,
    #[arg(long)]
    pub hospital_amount: Option<f64>,
    #[arg(long)]
    pub doctor_revisit: Option<f64>,
    #[arg(long)]
    pub hospital_revisit: Option<f64>,
    /// HH:MM
    #[arg(long)]
    pub from_time: Option<String>,
    /// HH:MM
    #[arg(long)]
    pub to_time: Option<String>,
    #[arg(long)]
    pub resigned: Option<bool>,
    #[arg(long)]
    pub discontinued: Option<bool>,
    #[arg(long)]
    pub resignation_date: Option<String>,
}

impl DoctorArgs {
    fn apply(&self, form: &mut Doctor) {
        let text = [
            (&self.code, &mut form.code),
            (&self.name, &mut form.name),
            (&self.qualification, &mut form.qualification),
            (&self.specialty, &mut form.specialty),
            (&self.department, &mut form.department),
            (&self.address, &mut form.address),
            (&self.phone, &mut form.phone),
            (&self.email, &mut form.email),
            (&self.booking_code, &mut form.booking_code),
            (&self.from_time, &mut form.from_time),
            (&self.to_time, &mut form.to_time),
        ];
        for (arg, field) in text {
            if let Some(value) = arg {
                *field = value.clone();
            }
        }
        let amounts = [
            (self.doctor_amount, &mut form.doctor_amount),
            (self.hospital_amount, &mut form.hospital_amount),
            (self.doctor_revisit, &mut form.doctor_revisit),
            (self.hospital_revisit, &mut form.hospital_revisit),
        ];
        for (arg, field) in amounts {
            if let Some(value) = arg {
                *field = value;
            }
        }
        if let Some(v) = self.op_validity {
            form.op_validity = v;
        }
        if let Some(v) = self.max_tokens {
            form.max_tokens = v;
        }
        if let Some(v) = self.resigned {
            form.is_resigned = v;
        }
        if let Some(v) = self.discontinued {
            form.is_discontinued = v;
        }
        if let Some(v) = &self.resignation_date {
            form.resignation_date = Some(v.clone());
        }
    }
}

fn doctor_table(doctors: &[&Doctor]) -> Table {
    Table {
        headers: ["ID", "Code", "Name", "Specialty", "Department", "First visit", "Revisit", "Status"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: doctors
            .iter()
            .map(|d| {
                vec![
                    d.id.map(|id| id.to_string()).unwrap_or_default(),
                    d.code.clone(),
                    d.name.clone(),
                    d.specialty.clone(),
                    d.department.clone(),
                    format_money(d.first_visit_fee()),
                    format_money(d.revisit_fee()),
                    d.status_label().to_string(),
                ]
            })
            .collect(),
    }
}

async fn reload(ctx: &mut Ctx, screen: &mut DoctorMasterScreen) -> ApiResult<()> {
    let doctors = ctx.desk.client().doctors().await;
    screen.apply_doctors(ctx.desk.guard(doctors)?);
    Ok(())
}

fn show(screen: &DoctorMasterScreen) {
    let counts = screen.counts();
    println!(
        "Total {}  Active {}  Departments {}",
        counts.total, counts.active, counts.departments
    );
    output::table(&doctor_table(&screen.filtered()));
}

pub async fn run(ctx: &mut Ctx, command: DoctorCommand) -> ApiResult<()> {
    ctx.open(Route::DoctorMaster)?;
    let mut screen = DoctorMasterScreen::new();
    reload(ctx, &mut screen).await?;

    match command {
        DoctorCommand::List { search } => {
            screen.search_term = search.unwrap_or_default();
            show(&screen);
        }
        DoctorCommand::Add(args) => {
            screen.start_new();
            args.apply(&mut screen.form);
            save(ctx, &mut screen).await?;
        }
        DoctorCommand::Edit { id, doctor } => {
            screen.start_edit(id)?;
            doctor.apply(&mut screen.form);
            save(ctx, &mut screen).await?;
        }
        DoctorCommand::Delete { id } => {
            let id = screen.request_delete(id, &mut output::confirmer(ctx.assume_yes))?;
            let deleted = ctx.desk.client().delete_doctor(id).await;
            ctx.desk.guard(deleted)?;
            output::notice(&screen.apply_deleted(id));
            show(&screen);
        }
    }
    Ok(())
}

async fn save(ctx: &mut Ctx, screen: &mut DoctorMasterScreen) -> ApiResult<()> {
    let save = screen.prepare_save()?;
    let result = match &save {
        DoctorSave::Create(doctor) => ctx.desk.client().create_doctor(doctor).await,
        DoctorSave::Update(id, doctor) => ctx.desk.client().update_doctor(*id, doctor).await,
    };
    ctx.desk.guard(result)?;
    output::notice(&screen.apply_saved(&save));
    reload(ctx, screen).await?;
    show(screen);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_given_fields_change() {
        let mut form = Doctor {
            name: "Dr. Rao".into(),
            department: "Cardiology".into(),
            ..Doctor::default()
        };
        let args = DoctorArgs {
            department: Some("Neurology".into()),
            doctor_amount: Some(300.0),
            resigned: Some(true),
            ..DoctorArgs::default()
        };
        args.apply(&mut form);
        assert_eq!(form.name, "Dr. Rao");
        assert_eq!(form.department, "Neurology");
        assert_eq!(form.doctor_amount, 300.0);
        assert!(form.is_resigned);
        assert_eq!(form.max_tokens, Doctor::default().max_tokens);
    }
}
