use thiserror::Error;

/// Error returned by a guarded call
///
/// `Open` is synthesized by the breaker without running the call; `Failed`
/// carries the call's own error untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BreakerError<E> {
    #[error("circuit breaker '{name}' is open")]
    Open { name: String },

    #[error("{0}")]
    Failed(E),
}

impl<E> BreakerError<E> {
    /// True when the call was short-circuited rather than attempted
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }

    /// The dependency's error, if the call actually ran
    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Open { .. } => None,
            BreakerError::Failed(e) => Some(e),
        }
    }
}
