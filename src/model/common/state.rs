use mongodb::bson::{to_bson, Bson};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phases in the group lifecycle. A group only ever moves forward through these.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupState {
    /// Participants are proposing candidates.
    Suggestion,
    /// Participants are voting on the candidates.
    Voting,
    /// Voting has closed; scores and ranks are read-only.
    Results,
}

/// An attempted transition that would move a group backwards or skip a phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("Illegal phase transition from {from:?} to {to:?}")]
pub struct PhaseError {
    pub from: GroupState,
    pub to: GroupState,
}

impl GroupState {
    /// The phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Suggestion => Some(Self::Voting),
            Self::Voting => Some(Self::Results),
            Self::Results => None,
        }
    }

    /// Move to `to`. Re-entering the current phase is a no-op that returns `Ok(false)`;
    /// moving to the immediately following phase returns `Ok(true)`.
    pub fn advance_to(&mut self, to: Self) -> Result<bool, PhaseError> {
        if *self == to {
            Ok(false)
        } else if self.next() == Some(to) {
            *self = to;
            Ok(true)
        } else {
            Err(PhaseError { from: *self, to })
        }
    }
}

impl From<GroupState> for Bson {
    fn from(state: GroupState) -> Self {
        to_bson(&state).expect("Serialisation is infallible")
    }
}
