use thiserror::Error;

use super::events::{ResponseOutcome, StatusStep};

/// Errors raised while deriving or applying print request transitions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateMachineError {
    #[error("Undefined statusStep [{step}] and status [{outcome}] combination")]
    UndefinedStatusCombination {
        step: StatusStep,
        outcome: ResponseOutcome,
    },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
