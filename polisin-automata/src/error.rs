//! Automata error types.

use thiserror::Error;

/// Errors raised while assembling or steering automata.
///
/// Rejecting an input symbol is not an error: runners report it through
/// their boolean return values.
#[derive(Debug, Error)]
pub enum AutomataError {
    #[error("machine set is empty")]
    NoMachines,

    #[error("machine not found: {machine}")]
    UnknownMachine { machine: String },

    #[error("duplicate machine name: {machine}")]
    DuplicateMachine { machine: String },

    #[error("state not found: {machine}:{state}")]
    UnknownState { machine: String, state: String },

    #[error("machine '{machine}' calls unknown machine '{callee}' from state '{state}'")]
    DanglingCall {
        machine: String,
        state: String,
        callee: String,
    },

    #[error(
        "condition collision in {machine}:{state}: '{symbol}' is both a terminal and a machine call"
    )]
    ConditionCollision {
        machine: String,
        state: String,
        symbol: String,
    },
}

impl AutomataError {
    /// Returns a stable error code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            AutomataError::NoMachines => "NO_MACHINES",
            AutomataError::UnknownMachine { .. } => "UNKNOWN_MACHINE",
            AutomataError::DuplicateMachine { .. } => "DUPLICATE_MACHINE",
            AutomataError::UnknownState { .. } => "UNKNOWN_STATE",
            AutomataError::DanglingCall { .. } => "DANGLING_CALL",
            AutomataError::ConditionCollision { .. } => "CONDITION_COLLISION",
        }
    }
}
