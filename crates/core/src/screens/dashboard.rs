use crate::billing::format_money;
use crate::models::DashboardStats;
use crate::notice::Notice;
use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub label: &'static str,
    pub route: Route,
}

pub const QUICK_ACTIONS: [QuickAction; 4] = [
    QuickAction {
        label: "OP Billing",
        route: Route::OpBilling,
    },
    QuickAction {
        label: "IP Billing",
        route: Route::IpBilling,
    },
    QuickAction {
        label: "Doctor Master",
        route: Route::DoctorMaster,
    },
    QuickAction {
        label: "Reports",
        route: Route::Reports,
    },
];

/// Today's counters. Stays zeroed until the first successful fetch.
#[derive(Debug, Clone, Default)]
pub struct DashboardScreen {
    stats: DashboardStats,
    loaded: bool,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DashboardStats {
        self.stats
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn apply_stats(&mut self, stats: DashboardStats) {
        self.stats = stats;
        self.loaded = true;
    }

    pub fn load_failed(&self) -> Notice {
        Notice::error("Failed to load dashboard stats")
    }

    /// Label and value pairs for the stat cards.
    pub fn cards(&self) -> [(&'static str, String); 5] {
        let s = &self.stats;
        [
            ("Patients Today", s.total_patients_today.to_string()),
            ("OP Bills Today", s.total_op_bills_today.to_string()),
            ("IP Bills Today", s.total_ip_bills_today.to_string()),
            ("Revenue Today", format_money(s.total_revenue_today)),
            ("Pending Appointments", s.pending_appointments.to_string()),
        ]
    }
}
