//! Types shared between the DB and API representations.

mod choice;
mod state;

pub use choice::Choice;
pub use state::{GroupState, PhaseError};

/// Group IDs are random alphanumeric strings.
pub type GroupId = String;
/// Candidate IDs take the form `candidate_<n>`.
pub type CandidateId = String;
/// Participant IDs are random alphanumeric strings.
pub type ParticipantId = String;

/// Length of randomly generated group and participant IDs.
pub const RANDOM_ID_LENGTH: usize = 20;

/// Generate a random alphanumeric identifier.
pub fn random_id() -> String {
    use rand::{distributions::Alphanumeric, Rng};

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_ID_LENGTH)
        .map(char::from)
        .collect()
}
