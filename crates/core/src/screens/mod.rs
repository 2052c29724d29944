//! Screen state machines.
//!
//! Each screen owns its form state and exposes two kinds of operations: `prepare_*` methods
//! that validate the form and build a request payload, and `apply_*` methods that fold a
//! backend response into the state. The front end performs the HTTP call in between, so a
//! failed call simply never reaches an `apply_*` method and the screen keeps its
//! pre-failure state.

pub mod dashboard;
pub mod doctor_master;
pub mod ip_bill;
pub mod op_bill;
pub mod registration;
pub mod reports;
pub mod select_patient;
pub mod settings;

pub use dashboard::{DashboardScreen, QuickAction, QUICK_ACTIONS};
pub use doctor_master::{DoctorMasterScreen, DoctorSave};
pub use ip_bill::IpBillScreen;
pub use op_bill::{OpBillScreen, OpSavePlan};
pub use registration::RegistrationScreen;
pub use reports::{ReportFilters, ReportsScreen};
pub use select_patient::{PatientFilterField, SelectPatientScreen};
pub use settings::SettingsScreen;

/// Generation number of the latest request a screen issued.
///
/// Screens hand one out with every patient selection or report query. A response carrying
/// an older ticket belongs to a superseded request and is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Default)]
pub(crate) struct TicketCounter {
    current: u64,
}

impl TicketCounter {
    pub(crate) fn issue(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    pub(crate) fn current(&self) -> Ticket {
        Ticket(self.current)
    }

    pub(crate) fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }
}
