use thiserror::Error;

/// Misuse of a [`RegisterBank`](super::RegisterBank).
///
/// The first two come from the signed entry points: registers are addressed
/// from 0 and only ever hold non-negative integers. `BeyondLimit` is raised
/// before a run whose registers would exceed
/// [`VmConfig::max_registers`](super::VmConfig::max_registers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("invalid register index {0}: indices start at 0")]
    InvalidIndex(i64),

    #[error("invalid value {value} for register {index}: registers hold non-negative integers")]
    InvalidValue { index: usize, value: i64 },

    #[error("register {index} is beyond the limit of {limit} registers")]
    BeyondLimit { index: usize, limit: usize },
}
