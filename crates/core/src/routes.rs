//! Screen routes, the session guard and the shared page chrome.

use crate::models::{PatientKind, User};
use crate::{HmsError, HmsResult};
use chrono::{NaiveTime, Timelike};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    PatientRegistration(PatientKind),
    DoctorMaster,
    OpBilling,
    IpBilling,
    Reports,
    Settings,
    SelectPatient,
}

impl Route {
    /// Canonical path, including the registration type query.
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".into(),
            Route::Dashboard => "/dashboard".into(),
            Route::PatientRegistration(kind) => {
                format!("/patient/registration?type={}", kind.as_str())
            }
            Route::DoctorMaster => "/doctor/master".into(),
            Route::OpBilling => "/billing/op".into(),
            Route::IpBilling => "/billing/ip".into(),
            Route::Reports => "/reports".into(),
            Route::Settings => "/settings".into(),
            Route::SelectPatient => "/select-patient".into(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Dashboard => "Dashboard",
            Route::PatientRegistration(_) => "Patient Registration",
            Route::DoctorMaster => "Doctor Master",
            Route::OpBilling => "OP Billing",
            Route::IpBilling => "IP Billing",
            Route::Reports => "Reports",
            Route::Settings => "Settings",
            Route::SelectPatient => "Select Patient",
        }
    }

    pub fn requires_session(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl FromStr for Route {
    type Err = HmsError;

    /// Parses an application path. `/` is the dashboard; a registration path without a valid
    /// `type` query opens inpatient registration.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, query) = s.trim().split_once('?').unwrap_or((s.trim(), ""));
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        let route = match path {
            "/" | "/dashboard" => Route::Dashboard,
            "/login" => Route::Login,
            "/patient/registration" => {
                let kind = query
                    .split('&')
                    .filter_map(|pair| pair.split_once('='))
                    .find(|(k, _)| *k == "type")
                    .and_then(|(_, v)| v.parse::<PatientKind>().ok())
                    .unwrap_or(PatientKind::Ip);
                Route::PatientRegistration(kind)
            }
            "/doctor/master" => Route::DoctorMaster,
            "/billing/op" => Route::OpBilling,
            "/billing/ip" => Route::IpBilling,
            "/reports" => Route::Reports,
            "/settings" => Route::Settings,
            "/select-patient" => Route::SelectPatient,
            other => return Err(HmsError::UnknownRoute(other.to_string())),
        };
        Ok(route)
    }
}

/// Resolves where navigation to `requested` actually lands.
///
/// Without a session every screen redirects to login; with one, login redirects to the
/// dashboard.
pub fn guard(requested: Route, signed_in: bool) -> Route {
    match (requested.requires_session(), signed_in) {
        (true, false) => Route::Login,
        (false, true) => Route::Dashboard,
        _ => requested,
    }
}

/// Parses `path` and applies [`guard`].
///
/// # Errors
///
/// Returns `HmsError::UnknownRoute` for paths outside the application.
pub fn navigate(path: &str, signed_in: bool) -> HmsResult<Route> {
    Ok(guard(path.parse()?, signed_in))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub description: &'static str,
    pub route: Route,
}

pub const MENU: [MenuItem; 7] = [
    MenuItem {
        label: "Dashboard",
        description: "Overview & analytics",
        route: Route::Dashboard,
    },
    MenuItem {
        label: "OP Billing",
        description: "Outpatient billing",
        route: Route::OpBilling,
    },
    MenuItem {
        label: "IP Billing",
        description: "Inpatient billing",
        route: Route::IpBilling,
    },
    MenuItem {
        label: "Patient Registration",
        description: "OP & IP registration",
        route: Route::PatientRegistration(PatientKind::Ip),
    },
    MenuItem {
        label: "Doctor Master",
        description: "Manage doctors",
        route: Route::DoctorMaster,
    },
    MenuItem {
        label: "Reports",
        description: "Analytics & reports",
        route: Route::Reports,
    },
    MenuItem {
        label: "Settings",
        description: "Particulars & Departments",
        route: Route::Settings,
    },
];

pub fn greeting(time: NaiveTime) -> &'static str {
    match time.hour() {
        h if h < 12 => "Good Morning",
        h if h < 18 => "Good Afternoon",
        _ => "Good Evening",
    }
}

/// Header line shown above every signed-in screen, e.g. `Good Morning, Meera`.
pub fn header_line(user: &User, time: NaiveTime) -> String {
    format!("{}, {}", greeting(time), user.first_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_goes_to_dashboard() {
        assert_eq!("/".parse::<Route>().unwrap(), Route::Dashboard);
        assert_eq!("/reports/".parse::<Route>().unwrap(), Route::Reports);
    }

    #[test]
    fn registration_type_query() {
        assert_eq!(
            "/patient/registration?type=op".parse::<Route>().unwrap(),
            Route::PatientRegistration(PatientKind::Op)
        );
        assert_eq!(
            "/patient/registration".parse::<Route>().unwrap(),
            Route::PatientRegistration(PatientKind::Ip)
        );
        let route = Route::PatientRegistration(PatientKind::Op);
        assert_eq!(route.path().parse::<Route>().unwrap(), route);
    }

    #[test]
    fn unknown_path_is_an_error() {
        assert!(matches!(
            "/pharmacy".parse::<Route>(),
            Err(HmsError::UnknownRoute(p)) if p == "/pharmacy"
        ));
    }

    #[test]
    fn guard_redirects_without_session() {
        for item in MENU {
            assert_eq!(guard(item.route, false), Route::Login);
            assert_eq!(guard(item.route, true), item.route);
        }
        assert_eq!(guard(Route::Login, false), Route::Login);
        assert_eq!(navigate("/login", true).unwrap(), Route::Dashboard);
    }

    #[test]
    fn greeting_boundaries() {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        assert_eq!(greeting(at(11)), "Good Morning");
        assert_eq!(greeting(at(12)), "Good Afternoon");
        assert_eq!(greeting(at(17)), "Good Afternoon");
        assert_eq!(greeting(at(18)), "Good Evening");
    }

    #[test]
    fn header_uses_first_name() {
        let user = User {
            full_name: "Meera Nair".into(),
            ..User::default()
        };
        let morning = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(header_line(&user, morning), "Good Morning, Meera");
    }
}
