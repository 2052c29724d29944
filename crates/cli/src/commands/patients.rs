use super::{invalid, Ctx};
use crate::output;
use api_client::{ApiError, ApiResult};
use clap::Args;
use hms_core::models::{Gender, Patient, PatientForm, PatientKind};
use hms_core::print::Table;
use hms_core::screens::registration::failure_message;
use hms_core::screens::{PatientFilterField, RegistrationScreen, SelectPatientScreen};
use hms_core::Route;

/// Patient form fields. Only the fields given on the command line are changed.
#[derive(Args, Debug, Default)]
pub struct PatientArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub age: Option<String>,
    /// male, female or other
    #[arg(long)]
    pub gender: Option<Gender>,
    #[arg(long)]
    pub complaint: Option<String>,
    #[arg(long)]
    pub house: Option<String>,
    #[arg(long)]
    pub street: Option<String>,
    #[arg(long)]
    pub place: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Doctor id; defaults to the first doctor
    #[arg(long)]
    pub doctor: Option<i64>,
    #[arg(long)]
    pub referred_by: Option<String>,
    /// Required for inpatients
    #[arg(long)]
    pub room: Option<String>,
}

impl PatientArgs {
    pub fn apply(&self, form: &mut PatientForm) {
        let text = [
            (&self.name, &mut form.name),
            (&self.age, &mut form.age),
            (&self.complaint, &mut form.complaint),
            (&self.house, &mut form.house),
            (&self.street, &mut form.street),
            (&self.place, &mut form.place),
            (&self.phone, &mut form.phone),
            (&self.email, &mut form.email),
            (&self.referred_by, &mut form.referred_by),
            (&self.room, &mut form.room),
        ];
        for (arg, field) in text {
            if let Some(value) = arg {
                *field = value.clone();
            }
        }
        if let Some(gender) = self.gender {
            form.gender = gender;
        }
        if let Some(doctor) = self.doctor {
            form.doctor_id = doctor;
        }
    }
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// op or ip
    #[arg(long, default_value = "ip")]
    pub kind: PatientKind,
    /// Look for existing patients before registering
    #[arg(long)]
    pub search: Option<String>,
    /// Copy the found patient with this id into the form
    #[arg(long, requires = "search")]
    pub copy: Option<i64>,
    /// Only search; do not register
    #[arg(long)]
    pub dry_run: bool,
    #[command(flatten)]
    pub patient: PatientArgs,
}

pub fn patient_table(patients: &[&Patient]) -> Table {
    Table {
        headers: ["ID", "Number", "Name", "Age", "Gender", "Phone", "Place", "Room"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: patients
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.display_number().to_string(),
                    p.name.clone(),
                    p.age.clone(),
                    p.gender.to_string(),
                    p.phone.clone(),
                    p.place.clone(),
                    p.room.clone().unwrap_or_default(),
                ]
            })
            .collect(),
    }
}

pub async fn register(ctx: &mut Ctx, args: RegisterArgs) -> ApiResult<()> {
    ctx.open(Route::PatientRegistration(args.kind))?;
    let today = ctx.today();
    let mut screen = RegistrationScreen::new(args.kind, today);

    let doctors = ctx.desk.client().doctors().await;
    screen.apply_doctors(ctx.desk.guard(doctors)?);
    println!(
        "{} registration, number {}",
        screen.kind().label(),
        screen.candidate_number()
    );

    if let Some(term) = &args.search {
        screen.search.term = term.clone();
        let query = screen.prepare_search()?;
        let results = ctx.desk.client().search_patients(&query).await;
        let notice = screen.apply_search(ctx.desk.guard(results)?);
        output::notice(&notice);
        output::table(&patient_table(&screen.search.results.iter().collect::<Vec<_>>()));

        if let Some(id) = args.copy {
            let found = screen
                .search
                .results
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or_else(|| invalid(format!("patient {id} is not in the search results")))?;
            output::notice(&screen.select_patient(found));
        }
    }
    if args.dry_run {
        return Ok(());
    }

    args.patient.apply(&mut screen.form);
    let body = screen.prepare_submit(ctx.now())?;
    let created = ctx.desk.client().create_patient(&body).await;
    match ctx.desk.guard(created) {
        Ok(_) => {
            output::notice(&screen.apply_submitted(today));
            Ok(())
        }
        Err(ApiError::Status { status, detail }) => Err(ApiError::Status {
            status,
            detail: Some(failure_message(status, detail.as_deref())),
        }),
        Err(e) => Err(e),
    }
}

pub async fn select(
    ctx: &mut Ctx,
    field: PatientFilterField,
    term: Option<String>,
    pick: Option<i64>,
) -> ApiResult<()> {
    ctx.open(Route::SelectPatient)?;
    let mut screen = SelectPatientScreen::new();
    screen.field = field;
    screen.term = term.unwrap_or_default();

    let patients = ctx.desk.client().patients(None).await;
    screen.apply_patients(ctx.desk.guard(patients)?);
    output::table(&patient_table(&screen.filtered()));

    if let Some(id) = pick {
        screen.select(id)?;
        let (patient, notice) = screen.confirm()?;
        output::notice(&notice);
        println!("{} {}", patient.display_number(), patient.address());
    }
    Ok(())
}
