mod commands;
mod output;

use api_client::{ApiError, Desk, Restore};
use clap::{Parser, Subcommand};
use commands::billing::{IpBillArgs, OpBillArgs};
use commands::doctors::DoctorCommand;
use commands::patients::RegisterArgs;
use commands::reports::ReportArgs;
use commands::settings::SettingsCommand;
use commands::{auth, billing, doctors, patients, reports, settings, Ctx};
use hms_core::screens::PatientFilterField;
use hms_core::{DeskConfig, Notice};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hms")]
#[command(about = "Hospital billing and patient registration desk")]
struct Cli {
    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show the navigation menu
    Menu,
    /// Resolve a path such as /billing/op against the current session
    Open { path: String },
    /// Today's figures and quick actions
    Dashboard,
    /// Register an OP or IP patient
    Register(RegisterArgs),
    /// List patients filtered by one field
    SelectPatient {
        /// name, op-number, ip-number, phone, place or room
        #[arg(long, default_value = "name")]
        field: PatientFilterField,
        term: Option<String>,
        /// Select the patient with this id
        #[arg(long)]
        pick: Option<i64>,
    },
    /// Enter, review or save an outpatient bill
    OpBill(OpBillArgs),
    /// Enter, review or save an inpatient bill
    IpBill(IpBillArgs),
    /// Doctor master
    Doctors {
        #[command(subcommand)]
        command: DoctorCommand,
    },
    /// Run a report
    Report(ReportArgs),
    /// Departments and particulars
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommand>,
    },
}

/// Info-level logging for the desk crates, added on top of `RUST_LOG`.
const LOG_DIRECTIVES: [&str; 2] = ["hms=info", "api_client=info"];

fn log_filter(base: EnvFilter) -> anyhow::Result<EnvFilter> {
    let mut filter = base;
    for directive in LOG_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter(EnvFilter::from_default_env())?)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = DeskConfig::resolve(|key| std::env::var(key).ok())?;
    let mut desk = Desk::new(&config)?;

    let command = cli.command.unwrap_or(Commands::Dashboard);
    if !matches!(command, Commands::Login { .. }) {
        match desk.restore().await? {
            Restore::Expired => output::notice(&Notice::error(ApiError::Unauthorized.user_message())),
            Restore::Unverified(e) => tracing::warn!(error = %e, "continuing with unverified session"),
            Restore::Missing | Restore::Verified => {}
        }
    }

    let mut ctx = Ctx {
        config,
        desk,
        assume_yes: cli.yes,
    };
    match dispatch(&mut ctx, command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            output::notice(&Notice::error(e.user_message()));
            if e.is_unauthorized() || matches!(e, ApiError::NotLoggedIn) {
                println!("Run `hms login <username>` to sign in.");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn dispatch(ctx: &mut Ctx, command: Commands) -> api_client::ApiResult<()> {
    match command {
        Commands::Login { username, password } => auth::login(ctx, &username, password).await,
        Commands::Logout => auth::logout(ctx),
        Commands::Whoami => auth::whoami(ctx),
        Commands::Menu => {
            ctx.open(hms_core::Route::Dashboard)?;
            auth::show_chrome(ctx);
            Ok(())
        }
        Commands::Open { path } => auth::open(ctx, &path),
        Commands::Dashboard => auth::dashboard(ctx).await,
        Commands::Register(args) => patients::register(ctx, args).await,
        Commands::SelectPatient { field, term, pick } => patients::select(ctx, field, term, pick).await,
        Commands::OpBill(args) => billing::op_bill(ctx, args).await,
        Commands::IpBill(args) => billing::ip_bill(ctx, args).await,
        Commands::Doctors { command } => doctors::run(ctx, command).await,
        Commands::Report(args) => reports::run(ctx, args).await,
        Commands::Settings { command } => {
            settings::run(ctx, command.unwrap_or(SettingsCommand::List)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_requests_are_logged_by_default() {
        let shown = log_filter(EnvFilter::new("warn")).unwrap().to_string();
        assert!(shown.contains("hms=info"));
        assert!(shown.contains("api_client=info"));
    }
}
