use presensi_core::PresensiError;

/// Failure modes of a workflow handler.
///
/// A handler that returns `Err` must leave the participant's stage exactly
/// as it found it, so the participant can retry the same step. Every variant
/// maps to one user-facing reply via [`FlowError::user_reply`].
#[derive(Debug)]
pub enum FlowError {
    /// The input did not match what the current stage accepts.
    InvalidSelection(String),
    /// A referenced entity (teacher, schedule, roster) is missing.
    EntityNotFound(String),
    /// A shared location failed geocoding or the distance check.
    LocationRejected(String),
    /// The participant lacks the role the operation requires.
    RoleViolation(String),
    /// A gateway or renderer failure. The detail is logged, not shown.
    Persistence(String),
}

pub type FlowResult<T> = Result<T, FlowError>;

impl FlowError {
    /// The reply sent to the participant for this failure.
    pub fn user_reply(&self) -> String {
        match self {
            Self::InvalidSelection(msg)
            | Self::EntityNotFound(msg)
            | Self::LocationRejected(msg)
            | Self::RoleViolation(msg) => msg.clone(),
            Self::Persistence(_) => {
                "Terjadi kesalahan pada sistem. Silakan coba lagi.".to_string()
            }
        }
    }
}

impl From<PresensiError> for FlowError {
    fn from(err: PresensiError) -> Self {
        Self::Persistence(err.to_string())
    }
}
