/// Errors produced by the analysis core.
///
/// Every public operation returns [`Result`]; the core never panics on a
/// caller-triggerable condition and never logs an error on the caller's
/// behalf. Panics are reserved for invariants the core itself guarantees.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("scenario '{scenario}' is not rate-balanced (repetition vector is zero)")]
    Inconsistent { scenario: String },

    #[error("deadlock in scenario '{scenario}': no actor fireable (state {state_digest:016x})")]
    Deadlock { scenario: String, state_digest: u64 },

    #[error("scenario graph for '{scenario}' is not weakly consistent: {reason}")]
    InconsistentScenarioGraph { scenario: String, reason: String },

    #[error("dimension mismatch in {op}: {lhs:?} vs {rhs:?}")]
    DimensionMismatch {
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    #[error("persistent-token set of scenario '{scenario}' does not match the canonical set")]
    PersistentTokenMismatch { scenario: String },

    #[error("port/channel invariant violated: {0}")]
    PortChannelViolation(String),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
}

pub type Result<T> = std::result::Result<T, Error>;
