use crate::cause::SweepCause;
use crate::state::SweepState;

#[derive(Debug, PartialEq, Eq)]
pub enum TransitionError {
    IllegalTransition {
        from: SweepState,
        cause: SweepCause,
    },
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::IllegalTransition { from, cause } => {
                write!(f, "illegal sweep transition: {:?} --({:?})", from, cause)
            }
        }
    }
}

impl std::error::Error for TransitionError {}

pub fn transition(state: SweepState, cause: SweepCause) -> Result<SweepState, TransitionError> {
    let next = match (state, cause) {
        // --- Idle -----------------------------------------------------------
        (SweepState::Idle, SweepCause::Started) => SweepState::Running,

        // --- Running --------------------------------------------------------
        (SweepState::Running, SweepCause::RowsFinished) => SweepState::Done,

        // --- Done -----------------------------------------------------------
        (SweepState::Done, SweepCause::Reset) => SweepState::Idle,

        // --- Illegal --------------------------------------------------------
        _ => return Err(TransitionError::IllegalTransition { from: state, cause }),
    };

    Ok(next)
}
