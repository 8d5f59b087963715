use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rocket::serde::json::Value;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CandidateId, GroupId, GroupState, ParticipantId},
    db::{Candidate, Group, Participant, VoteMap},
};

/// A group specification, as submitted when creating a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub delivery: bool,
    #[serde(default)]
    pub delivery_time: Option<u32>,
    pub offline: bool,
    #[serde(default)]
    pub radius: Option<u32>,
    /// Minutes from creation until a timer-mode group starts voting.
    #[serde(alias = "start_votingtime")]
    pub start_voting_minutes: u32,
    #[serde(default)]
    pub timer_mode: bool,
    #[serde(default)]
    pub anonymous_mode: bool,
    pub x: f64,
    pub y: f64,
}

impl GroupSpec {
    /// Check the options that depend on each other.
    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        if self.delivery && self.delivery_time.is_none() {
            errors.push("delivery_time is required when delivery is true");
        }
        if self.offline && self.radius.is_none() {
            errors.push("radius is required when offline is true");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join(" / "))
        }
    }

    /// Convert this spec into a fresh group in the suggestion phase.
    pub fn into_group(self, id: GroupId, creation_time: DateTime<Utc>) -> Group {
        Group {
            id,
            version: 0,
            state: GroupState::Suggestion,
            timer_mode: self.timer_mode,
            creation_time,
            start_voting_minutes: self.start_voting_minutes,
            anonymous_mode: self.anonymous_mode,
            delivery: self.delivery,
            delivery_time: self.delivery_time,
            offline: self.offline,
            radius: self.radius,
            x: self.x,
            y: self.y,
            candidates: BTreeMap::new(),
            participants: BTreeMap::new(),
            votes: VoteMap::new(),
        }
    }
}

/// API-friendly view of a whole group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDesc {
    pub id: GroupId,
    pub version: i64,
    pub state: GroupState,
    pub timer_mode: bool,
    pub creation_time: DateTime<Utc>,
    pub start_voting_minutes: u32,
    pub voting_starts_at: DateTime<Utc>,
    pub anonymous_mode: bool,
    pub delivery: bool,
    pub delivery_time: Option<u32>,
    pub offline: bool,
    pub radius: Option<u32>,
    pub x: f64,
    pub y: f64,
    pub candidates: BTreeMap<CandidateId, Candidate>,
    pub participants: BTreeMap<ParticipantId, Participant>,
    /// Omitted entirely for anonymous groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<VoteMap>,
}

impl From<Group> for GroupDesc {
    fn from(group: Group) -> Self {
        let voting_starts_at = group.voting_starts_at();
        let votes = (!group.anonymous_mode).then_some(group.votes);
        Self {
            id: group.id,
            version: group.version,
            state: group.state,
            timer_mode: group.timer_mode,
            creation_time: group.creation_time,
            start_voting_minutes: group.start_voting_minutes,
            voting_starts_at,
            anonymous_mode: group.anonymous_mode,
            delivery: group.delivery,
            delivery_time: group.delivery_time,
            offline: group.offline,
            radius: group.radius,
            x: group.x,
            y: group.y,
            candidates: group.candidates,
            participants: group.participants,
            votes,
        }
    }
}

/// A short summary of a group, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: GroupId,
    pub state: GroupState,
    pub timer_mode: bool,
    pub creation_time: DateTime<Utc>,
    pub candidates: usize,
    pub participants: usize,
}

impl From<&Group> for GroupSummary {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            state: group.state,
            timer_mode: group.timer_mode,
            creation_time: group.creation_time,
            candidates: group.candidates.len(),
            participants: group.participants.len(),
        }
    }
}

/// A candidate proposed by a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub added_by: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub detail: Value,
}

impl From<CandidateSpec> for Candidate {
    fn from(spec: CandidateSpec) -> Self {
        Candidate::new(spec.added_by, spec.name, spec.kind, spec.detail)
    }
}

/// Request to join a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    pub nickname: String,
}

/// Response to adding a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAdded {
    pub candidate_id: CandidateId,
    pub data: GroupDesc,
}

/// Response to joining a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantJoined {
    pub participant_id: ParticipantId,
    pub data: GroupDesc,
}

/// Response to marking a participant's suggestions as complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestCompleted {
    pub participant_id: ParticipantId,
    /// The group's phase after the update.
    pub state: GroupState,
}
