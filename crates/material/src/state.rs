use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};

/// Temporal slots of the predictor-corrector time integration
///
/// Every material keeps one temperature and one row of precursor data per
/// state. The working cross sections only ever hold data for the most
/// recently synchronised state.
///
/// The ordinal of each variant is fixed and is used directly as an index
/// into per-state arrays.
///
/// | State          | Ordinal |
/// | -------------- | ------- |
/// | `Previous`     | 0       |
/// | `PreviousConv` | 1       |
/// | `Current`      | 2       |
/// | `Forward`      | 3       |
/// | `ForwardPrev`  | 4       |
/// | `Shape`        | 5       |
///
/// ```rust
/// # use ktools_material::State;
/// assert_eq!(State::Current.index(), 2);
/// assert_eq!(State::try_from(5).unwrap(), State::Shape);
/// assert!(State::try_from(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum State {
    /// Start of the current time step
    Previous = 0,
    /// Converged values at the start of the time step
    PreviousConv = 1,
    /// Intermediate point inside the time step
    Current = 2,
    /// End of the current time step
    Forward = 3,
    /// Previous iterate of the end of time step
    ForwardPrev = 4,
    /// Shape function evaluation point
    Shape = 5,
}

impl State {
    /// Number of state slots
    pub const COUNT: usize = 6;

    /// Every state in ordinal order
    pub const ALL: [State; State::COUNT] = [
        State::Previous,
        State::PreviousConv,
        State::Current,
        State::Forward,
        State::ForwardPrev,
        State::Shape,
    ];

    /// Ordinal used to index per-state storage
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for State {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self> {
        State::ALL
            .get(index)
            .copied()
            .ok_or(Error::OutOfRange {
                quantity: "state",
                index,
                bound: State::COUNT,
            })
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            Self::Previous => "PREVIOUS",
            Self::PreviousConv => "PREVIOUS_CONV",
            Self::Current => "CURRENT",
            Self::Forward => "FORWARD",
            Self::ForwardPrev => "FORWARD_PREV",
            Self::Shape => "SHAPE",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_match_all() {
        for (i, state) in State::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
            assert_eq!(State::try_from(i).unwrap(), *state);
        }
    }

    #[test]
    fn out_of_range_ordinal() {
        let err = State::try_from(State::COUNT).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfRange {
                index: 6,
                bound: 6,
                ..
            }
        ));
    }

    #[test]
    fn display_names() {
        assert_eq!(State::ForwardPrev.to_string(), "FORWARD_PREV");
        assert_eq!(State::Shape.to_string(), "SHAPE");
    }
}
