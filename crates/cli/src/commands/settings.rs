use super::Ctx;
use crate::output;
use api_client::ApiResult;
use clap::Subcommand;
use hms_core::billing::format_money;
use hms_core::print::Table;
use hms_core::screens::SettingsScreen;
use hms_core::Route;

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Show departments, particulars and their counts
    List,
    AddDepartment { name: String },
    AddParticular {
        name: String,
        /// Department id; omit for a particular without department
        #[arg(long)]
        department: Option<i64>,
        #[arg(long)]
        rate: Option<f64>,
    },
    DeleteDepartment { id: i64 },
    DeleteParticular { id: i64 },
}

async fn reload(ctx: &mut Ctx, screen: &mut SettingsScreen) -> ApiResult<()> {
    let loaded = ctx.desk.client().settings().await;
    let (departments, particulars, stats) = ctx.desk.guard(loaded)?;
    screen.apply_loaded(departments, particulars, stats);
    Ok(())
}

fn show(screen: &SettingsScreen) {
    let stats = screen.stats();
    println!(
        "Departments {}  Particulars {}",
        stats.total_departments, stats.total_particulars
    );
    println!();
    output::table(&Table {
        headers: vec!["ID".into(), "Department".into()],
        rows: screen
            .departments()
            .iter()
            .map(|d| vec![d.id.to_string(), d.name.clone()])
            .collect(),
    });
    println!();
    output::table(&Table {
        headers: vec!["ID".into(), "Particular".into(), "Department".into(), "Rate".into()],
        rows: screen
            .particulars()
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.name.clone(),
                    p.department_name.clone().unwrap_or_default(),
                    p.rate.map(format_money).unwrap_or_default(),
                ]
            })
            .collect(),
    });
}

pub async fn run(ctx: &mut Ctx, command: SettingsCommand) -> ApiResult<()> {
    ctx.open(Route::Settings)?;
    let mut screen = SettingsScreen::new();
    reload(ctx, &mut screen).await?;

    let notice = match command {
        SettingsCommand::List => None,
        SettingsCommand::AddDepartment { name } => {
            let body = screen.prepare_add_department(&name)?;
            let created = ctx.desk.client().create_department(&body).await;
            ctx.desk.guard(created)?;
            Some(screen.department_added())
        }
        SettingsCommand::AddParticular { name, department, rate } => {
            let body = screen.prepare_add_particular(&name, department, rate)?;
            let created = ctx.desk.client().create_particular(&body).await;
            ctx.desk.guard(created)?;
            Some(screen.particular_added())
        }
        SettingsCommand::DeleteDepartment { id } => {
            let id = screen.request_delete_department(id, &mut output::confirmer(ctx.assume_yes))?;
            let deleted = ctx.desk.client().delete_department(id).await;
            ctx.desk.guard(deleted)?;
            Some(screen.department_deleted())
        }
        SettingsCommand::DeleteParticular { id } => {
            let id = screen.request_delete_particular(id, &mut output::confirmer(ctx.assume_yes))?;
            let deleted = ctx.desk.client().delete_particular(id).await;
            ctx.desk.guard(deleted)?;
            Some(screen.particular_deleted())
        }
    };

    if let Some(notice) = notice {
        output::notice(&notice);
        reload(ctx, &mut screen).await?;
    }
    show(&screen);
    Ok(())
}
