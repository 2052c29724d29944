#[derive(Debug, thiserror::Error)]
pub enum HmsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("please fill required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{0}")]
    InvalidText(#[from] hms_types::TextError),
    #[error("{0}")]
    InvalidPercent(#[from] hms_types::PercentError),
    #[error("{field} cannot be negative")]
    NegativeAmount { field: &'static str },
    #[error("line {0} does not exist")]
    NoSuchLine(usize),
    #[error("total amount must be greater than 0")]
    NonPositiveTotal,
    #[error("no patient selected")]
    NoPatientSelected,
    #[error("action cancelled")]
    Declined,

    #[error("unknown route: {0}")]
    UnknownRoute(String),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to create directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to serialize: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize: {0}")]
    Deserialization(serde_json::Error),
}

pub type HmsResult<T> = std::result::Result<T, HmsError>;
