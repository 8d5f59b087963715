//! Transitions of the group lifecycle: `suggestion → voting → results`.
//!
//! Callers must hold the group's lock and save the group afterwards.

use chrono::{DateTime, Utc};

use crate::model::{
    common::{GroupState, PhaseError},
    db::Group,
};

/// Start voting in a timer-mode group whose suggestion time is up.
/// Everyone's suggestions are marked complete. Returns whether anything changed.
pub fn expire_suggestion(group: &mut Group, now: DateTime<Utc>) -> bool {
    if !group.timer_mode
        || group.state != GroupState::Suggestion
        || now < group.voting_starts_at()
    {
        return false;
    }
    for participant in group.participants.values_mut() {
        participant.suggest_complete = true;
    }
    group.state = GroupState::Voting;
    true
}

/// Mark one participant's suggestions as complete. A group not on a timer starts
/// voting as soon as every participant is done.
///
/// Returns `None` for an unknown participant, otherwise whether the group started voting.
pub fn complete_suggestion(group: &mut Group, participant_id: &str) -> Option<bool> {
    group.participants.get_mut(participant_id)?.suggest_complete = true;
    let everyone_done = group.participants.values().all(|p| p.suggest_complete);
    if group.timer_mode || group.state != GroupState::Suggestion || !everyone_done {
        return Some(false);
    }
    group.state = GroupState::Voting;
    Some(true)
}

/// Close voting. Finishing an already finished group changes nothing.
pub fn finish_voting(group: &mut Group) -> Result<bool, PhaseError> {
    group.state.advance_to(GroupState::Results)
}

/// Whether vote submissions may still be applied to the group.
pub fn accepts_votes(group: &Group) -> bool {
    group.state != GroupState::Results
}
