//! Constants used throughout the desk core crate.
//!
//! Defaults for configuration and the fixed values the screens fall back to when the backend
//! provides nothing better.

/// Backend used when `HMS_BACKEND_URL` is not set.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

pub const DEFAULT_HOSPITAL_NAME: &str = "CITY NURSING HOME";
pub const DEFAULT_HOSPITAL_ADDRESS: &str = "NORTH KOTACHERY";
pub const DEFAULT_HOSPITAL_PHONE: &str = "202842, 202574, 2218153";

/// Location of the durable session file relative to the working directory.
pub const DEFAULT_SESSION_FILE: &str = ".hms/session.json";

/// Directory receiving printed documents and report exports.
pub const DEFAULT_OUTPUT_DIR: &str = "hms_output";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for the lightweight session check against `/auth/me`.
pub const SESSION_VERIFY_TIMEOUT_SECS: u64 = 5;

/// First line of a fresh OP bill when no particular is flagged for OP.
pub const OP_DEFAULT_PARTICULAR: &str = "Consultation";
pub const OP_DEFAULT_DEPARTMENT: &str = "OPD";

/// First line of a fresh IP bill when no particular is flagged for IP.
pub const IP_DEFAULT_PARTICULAR: &str = "Room Charges";
pub const IP_DEFAULT_DEPARTMENT: &str = "General";

pub const DEFAULT_CATEGORY: &str = "General";
pub const DEFAULT_BILL_TYPE: &str = "Cash";
pub const DEFAULT_DISCOUNT_TYPE: &str = "None";

pub const OP_BILL_TYPES: &[&str] = &["Cash", "Card", "UPI", "Cheque", "Insurance"];
pub const IP_CATEGORIES: &[&str] = &["General", "Emergency", "ICU", "Surgery", "Maternity"];
pub const DISCOUNT_TYPES: &[&str] = &["None", "Senior Citizen", "Insurance", "Staff", "Government"];

pub const DOCTOR_DEFAULT_OP_VALIDITY: i64 = 30;
pub const DOCTOR_DEFAULT_MAX_TOKENS: i64 = 50;
pub const DOCTOR_DEFAULT_FROM_TIME: &str = "09:00";
pub const DOCTOR_DEFAULT_TO_TIME: &str = "17:00";
