//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Datetimes are serialised as RFC 3339 strings.
//! - Anonymous groups never expose who voted for what.

mod group;
mod results;

pub use group::{
    CandidateAdded, CandidateSpec, GroupDesc, GroupSpec, GroupSummary, JoinRequest,
    ParticipantJoined, SuggestCompleted,
};
pub use results::{BestPairDesc, RankedCandidate, ResultsDesc, VoteComplete, VoteQueued};
