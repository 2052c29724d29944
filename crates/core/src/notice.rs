//! User-facing feedback and confirmation prompts.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient message for the operator, produced by screen operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    level: NoticeLevel,
    message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn level(&self) -> NoticeLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Answers a yes/no question before a destructive or state-replacing action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Asks `confirm`, turning a refusal into `HmsError::Declined`.
pub(crate) fn confirmed(confirm: &mut impl Confirm, prompt: &str) -> crate::HmsResult<()> {
    if confirm.confirm(prompt) {
        Ok(())
    } else {
        Err(crate::HmsError::Declined)
    }
}
