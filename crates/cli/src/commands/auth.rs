use super::{invalid, Ctx};
use crate::output;
use api_client::ApiResult;
use chrono::Local;
use hms_core::routes::{self, header_line, MENU};
use hms_core::screens::{DashboardScreen, QUICK_ACTIONS};
use hms_core::Route;

pub async fn login(ctx: &mut Ctx, username: &str, password: Option<String>) -> ApiResult<()> {
    let password = match password {
        Some(p) => p,
        None => output::read_line("Password: ")
            .map_err(|e| invalid(format!("cannot read password: {e}")))?,
    };
    let notice = ctx.desk.login(username, &password).await?;
    output::notice(&notice);
    show_chrome(ctx);
    Ok(())
}

pub fn logout(ctx: &mut Ctx) -> ApiResult<()> {
    let notice = ctx.desk.logout()?;
    output::notice(&notice);
    Ok(())
}

pub fn whoami(ctx: &Ctx) -> ApiResult<()> {
    ctx.open(Route::Dashboard)?;
    if let Some(session) = ctx.desk.session() {
        let user = &session.user;
        println!("{} ({}), role {}", user.full_name, user.username, user.role);
        println!(
            "Signed in {}",
            session.login_time.with_timezone(&Local).format("%d/%m/%Y %H:%M")
        );
    }
    Ok(())
}

/// Greeting and menu shown above every signed-in screen.
pub fn show_chrome(ctx: &Ctx) {
    if let Some(user) = ctx.desk.user() {
        println!("{}", header_line(user, Local::now().time()));
    }
    for item in MENU.iter() {
        println!("  {:<22} {:<24} {}", item.label, item.description, item.route.path());
    }
}

/// Resolves `path` through the session guard and reports where it lands.
pub fn open(ctx: &Ctx, path: &str) -> ApiResult<()> {
    let route = routes::navigate(path, ctx.desk.is_signed_in())?;
    println!("{} ({})", route.title(), route.path());
    Ok(())
}

pub async fn dashboard(ctx: &mut Ctx) -> ApiResult<()> {
    ctx.open(Route::Dashboard)?;
    let mut screen = DashboardScreen::new();
    let result = ctx.desk.client().dashboard_stats().await;
    match ctx.desk.guard(result) {
        Ok(stats) => screen.apply_stats(stats),
        Err(e) if e.is_unauthorized() => return Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "dashboard stats unavailable");
            output::notice(&screen.load_failed());
        }
    }

    show_chrome(ctx);
    println!();
    let cards: Vec<(String, String)> = screen
        .cards()
        .into_iter()
        .map(|(label, value)| (label.to_string(), value))
        .collect();
    output::pairs(&cards);
    println!();
    println!("Quick actions:");
    for action in QUICK_ACTIONS.iter() {
        println!("  {:<14} {}", action.label, action.route.path());
    }
    Ok(())
}
