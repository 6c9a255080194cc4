use thiserror::Error;

/// Everything the ledger can reject. Repository I/O failures are not part of
/// this set, they travel as opaque [anyhow::Error]s with operation context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("hours must be greater than 0")]
    InvalidHours,
    #[error("record is not {expected}, can't {action}")]
    InvalidTransition {
        expected: &'static str,
        action: &'static str,
    },
    #[error("record is empty")]
    EmptyRecord,
    #[error("record already started")]
    AlreadyWorking,
    #[error("record not started")]
    NotWorking,
    #[error("wrong date, change back to today")]
    WrongDate,
    #[error("amount must be greater than 1")]
    InvalidAmount,
    #[error("amount already committed")]
    AlreadyCommitted,
    #[error("wrong duration format")]
    InvalidFormat,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid status")]
    InvalidStatus,
}
