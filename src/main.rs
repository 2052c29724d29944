use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{Instant, sleep};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api_client::{ApiClient, Desk, Restore};
use hms_core::DeskConfig;
use hms_core::screens::{DashboardScreen, QUICK_ACTIONS};

const ENV_BACKEND_CMD: &str = "HMS_BACKEND_CMD";
const ENV_BACKEND_STARTUP_SECS: &str = "HMS_BACKEND_STARTUP_SECS";
const DEFAULT_BACKEND_STARTUP_SECS: u64 = 2;
const HEALTH_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Info-level logging for the desk crates, added on top of `RUST_LOG`.
const LOG_DIRECTIVES: [&str; 2] = ["hms=info", "api_client=info"];

fn log_filter(base: EnvFilter) -> anyhow::Result<EnvFilter> {
    let mut filter = base;
    for directive in LOG_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

/// Launcher-only settings, read once next to the desk configuration.
#[derive(Debug, Clone, PartialEq)]
struct LaunchConfig {
    backend_cmd: Option<Vec<String>>,
    startup: Duration,
}

impl LaunchConfig {
    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let backend_cmd = lookup(ENV_BACKEND_CMD)
            .map(|cmd| cmd.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());
        let startup = match lookup(ENV_BACKEND_STARTUP_SECS) {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                anyhow::anyhow!("{ENV_BACKEND_STARTUP_SECS} must be a whole number of seconds, got {raw:?}")
            })?),
            None => Duration::from_secs(DEFAULT_BACKEND_STARTUP_SECS),
        };
        Ok(Self { backend_cmd, startup })
    }
}

/// Starts the backend process. It is killed when the returned handle is dropped.
fn spawn_backend(parts: &[String]) -> anyhow::Result<Child> {
    let (program, args) = parts
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("{ENV_BACKEND_CMD} is empty"))?;
    tracing::info!("++ Starting backend: {}", parts.join(" "));
    let child = Command::new(program).args(args).kill_on_drop(true).spawn()?;
    Ok(child)
}

/// Polls `/health` until it answers or `within` has passed.
async fn wait_for_backend(client: &ApiClient, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    loop {
        match client.health().await {
            Ok(()) => return true,
            Err(e) if Instant::now() >= deadline => {
                tracing::warn!(error = %e, "backend did not become healthy");
                return false;
            }
            Err(_) => sleep(HEALTH_POLL_INTERVAL).await,
        }
    }
}

async fn show_dashboard(desk: &mut Desk) {
    let Some(user) = desk.user() else {
        println!("Not signed in. Run `hms login <username>` to start.");
        return;
    };
    println!("Welcome, {}", user.full_name);

    let mut screen = DashboardScreen::new();
    let stats = desk.client().dashboard_stats().await;
    match desk.guard(stats) {
        Ok(stats) => screen.apply_stats(stats),
        Err(e) if e.is_unauthorized() => {
            println!("{}", e.user_message());
            return;
        }
        Err(e) => {
            tracing::warn!(error = %e, "dashboard stats unavailable");
            println!("{}", screen.load_failed());
        }
    }
    for (label, value) in screen.cards() {
        println!("  {label:<20} {value}");
    }
    let actions: Vec<&str> = QUICK_ACTIONS.iter().map(|a| a.label).collect();
    println!("  Quick actions: {}", actions.join(", "));
}

/// Desktop-shell entry point for the billing desk.
///
/// Optionally starts the backend (`HMS_BACKEND_CMD`), waits up to
/// `HMS_BACKEND_STARTUP_SECS` for its health check, restores the stored session and shows
/// the dashboard. A backend started here runs until Ctrl-C and is stopped on exit.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(log_filter(EnvFilter::from_default_env())?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let lookup = |key: &str| std::env::var(key).ok();
    let config = DeskConfig::resolve(lookup)?;
    let launch = LaunchConfig::resolve(lookup)?;

    let mut backend = launch.backend_cmd.as_deref().map(spawn_backend).transpose()?;
    let mut desk = Desk::new(&config)?;

    tracing::info!("++ Waiting for backend at {}", config.backend_url());
    if !wait_for_backend(desk.client(), launch.startup).await {
        println!("Cannot reach the server at {}.", config.backend_url());
    }

    match desk.restore().await? {
        Restore::Expired => println!("Session expired. Please login again."),
        Restore::Unverified(e) => tracing::warn!(error = %e, "session kept without verification"),
        Restore::Missing | Restore::Verified => {}
    }
    show_dashboard(&mut desk).await;

    if let Some(child) = backend.as_mut() {
        println!("Backend running. Press Ctrl-C to stop.");
        let interrupted = tokio::select! {
            status = child.wait() => {
                tracing::warn!("backend exited: {:?}", status?);
                false
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                true
            }
        };
        if interrupted {
            tracing::info!("-- Stopping backend");
            child.kill().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn client_requests_are_logged_by_default() {
        let shown = log_filter(EnvFilter::new("warn")).unwrap().to_string();
        assert!(shown.contains("hms=info"));
        assert!(shown.contains("api_client=info"));
    }

    #[test]
    fn launch_defaults() {
        let cfg = LaunchConfig::resolve(lookup(&[])).unwrap();
        assert_eq!(cfg.backend_cmd, None);
        assert_eq!(cfg.startup, Duration::from_secs(2));
    }

    #[test]
    fn backend_command_is_split_on_whitespace() {
        let cfg = LaunchConfig::resolve(lookup(&[
            (ENV_BACKEND_CMD, "  uvicorn app.main:app --port 8000 "),
            (ENV_BACKEND_STARTUP_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(
            cfg.backend_cmd.unwrap(),
            ["uvicorn", "app.main:app", "--port", "8000"]
        );
        assert_eq!(cfg.startup, Duration::from_secs(5));
    }

    #[test]
    fn blank_command_means_no_backend() {
        let cfg = LaunchConfig::resolve(lookup(&[(ENV_BACKEND_CMD, "   ")])).unwrap();
        assert!(cfg.backend_cmd.is_none());
    }

    #[test]
    fn bad_startup_seconds_rejected() {
        assert!(LaunchConfig::resolve(lookup(&[(ENV_BACKEND_STARTUP_SECS, "soon")])).is_err());
    }
}
