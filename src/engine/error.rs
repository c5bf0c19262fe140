use thiserror::Error;

use crate::models::CheckStatus;

/// Why a fix request was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixRejection {
    /// Index past the end of the report
    OutOfRange { len: usize },
    /// Only failing entries can be fixed
    NotFailing { status: CheckStatus },
    /// The entry offers no instant fix
    NotFixable,
    /// The ledger already holds a fix for this entry
    AlreadyFixed,
}

impl std::fmt::Display for FixRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixRejection::OutOfRange { len } => {
                write!(f, "report only has {} entries", len)
            }
            FixRejection::NotFailing { status } => {
                write!(f, "entry has status '{}', only failures can be fixed", status)
            }
            FixRejection::NotFixable => write!(f, "entry offers no instant fix"),
            FixRejection::AlreadyFixed => write!(f, "entry was already fixed"),
        }
    }
}

/// Operations the engine refuses to perform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid fix request for entry {index}: {reason}")]
    InvalidFixRequest { index: usize, reason: FixRejection },
}

impl EngineError {
    pub(crate) fn invalid_fix(index: usize, reason: FixRejection) -> Self {
        Self::InvalidFixRequest { index, reason }
    }
}
