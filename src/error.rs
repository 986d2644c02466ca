use thiserror::Error;

/// Failures a command can report back to the caller. Missing ledger entries
/// and empty undo stacks are not errors; those commands answer "not applied".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0}")]
    Validation(String),
    #[error("course not found: {0}")]
    CourseNotFound(String),
    #[error("student not found: {0}")]
    StudentNotFound(String),
    #[error("grade not found: {0}")]
    GradeNotFound(String),
}

impl CommandError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Stable code used on the IPC wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "bad_params",
            Self::CourseNotFound(_) | Self::StudentNotFound(_) | Self::GradeNotFound(_) => {
                "not_found"
            }
        }
    }
}
