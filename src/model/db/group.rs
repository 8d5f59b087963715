use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rocket::serde::json::Value;
use serde::{Deserialize, Serialize};

use crate::model::common::{CandidateId, Choice, GroupId, GroupState, ParticipantId};

/// Prefix of every candidate ID; the suffix is a sequence number.
const CANDIDATE_ID_PREFIX: &str = "candidate_";

/// Each participant's votes, keyed by participant then candidate.
pub type VoteMap = BTreeMap<ParticipantId, BTreeMap<CandidateId, Choice>>;

/// A voting group, exactly as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: GroupId,
    /// Incremented on every successful save; used to detect concurrent writers.
    #[serde(default)]
    pub version: i64,
    /// Current phase.
    pub state: GroupState,
    /// Whether the suggestion phase ends on a timer rather than when everyone is done.
    pub timer_mode: bool,
    /// When the group was created.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub creation_time: DateTime<Utc>,
    /// Minutes after creation at which a timer-mode group starts voting.
    pub start_voting_minutes: u32,
    /// Hide who voted for what.
    #[serde(default)]
    pub anonymous_mode: bool,
    /// Whether delivery restaurants are considered.
    pub delivery: bool,
    /// Maximum acceptable delivery time in minutes.
    pub delivery_time: Option<u32>,
    /// Whether dine-in restaurants are considered.
    pub offline: bool,
    /// Search radius in metres for dine-in restaurants.
    pub radius: Option<u32>,
    /// Latitude of the meeting point.
    pub x: f64,
    /// Longitude of the meeting point.
    pub y: f64,
    #[serde(default)]
    pub candidates: BTreeMap<CandidateId, Candidate>,
    #[serde(default)]
    pub participants: BTreeMap<ParticipantId, Participant>,
    #[serde(default)]
    pub votes: VoteMap,
}

impl Group {
    /// The instant at which a timer-mode group leaves the suggestion phase.
    pub fn voting_starts_at(&self) -> DateTime<Utc> {
        self.creation_time + Duration::minutes(i64::from(self.start_voting_minutes))
    }

    /// The ID the next added candidate should receive.
    pub fn next_candidate_id(&self) -> CandidateId {
        let next = self
            .candidates
            .keys()
            .filter_map(|id| id.strip_prefix(CANDIDATE_ID_PREFIX))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .map_or(1, |max| max + 1);
        format!("{CANDIDATE_ID_PREFIX}{next}")
    }

    /// Display name for a participant, if they are known.
    pub fn nickname(&self, participant_id: &str) -> Option<&str> {
        self.participants
            .get(participant_id)
            .map(|p| p.nickname.as_str())
    }
}

/// A restaurant proposed to the group, along with its vote tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Participant who proposed it.
    pub added_by: String,
    pub name: String,
    /// Where the candidate came from, e.g. `kakao`, `yogiyo` or `custom`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Source-specific details, stored as given.
    #[serde(default)]
    pub detail: Value,
    #[serde(default)]
    pub good: u32,
    #[serde(default)]
    pub soso: u32,
    #[serde(default)]
    pub bad: u32,
    #[serde(default)]
    pub never: u32,
    /// Position in the ranking, starting at 1. `None` until first ranked.
    #[serde(default)]
    pub rank: Option<u32>,
}

impl Candidate {
    /// A candidate with no votes yet.
    pub fn new(added_by: String, name: String, kind: String, detail: Value) -> Self {
        Self {
            added_by,
            name,
            kind,
            detail,
            good: 0,
            soso: 0,
            bad: 0,
            never: 0,
            rank: None,
        }
    }

    /// Number of votes of the given kind.
    pub fn tally(&self, choice: Choice) -> u32 {
        match choice {
            Choice::Good => self.good,
            Choice::Soso => self.soso,
            Choice::Bad => self.bad,
            Choice::Never => self.never,
        }
    }

    /// Count one more vote of the given kind.
    pub fn record(&mut self, choice: Choice) {
        let tally = match choice {
            Choice::Good => &mut self.good,
            Choice::Soso => &mut self.soso,
            Choice::Bad => &mut self.bad,
            Choice::Never => &mut self.never,
        };
        *tally += 1;
    }

    /// Zero all tallies.
    pub fn clear_tallies(&mut self) {
        self.good = 0;
        self.soso = 0;
        self.bad = 0;
        self.never = 0;
    }

    /// Ranking score: the weighted sum of all tallies.
    pub fn score(&self) -> i64 {
        [Choice::Good, Choice::Soso, Choice::Bad, Choice::Never]
            .into_iter()
            .map(|choice| i64::from(self.tally(choice)) * choice.rank_weight())
            .sum()
    }
}

/// A member of the group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub nickname: String,
    /// Whether they have finished proposing candidates.
    #[serde(default)]
    pub suggest_complete: bool,
    /// How many candidates they have voted on.
    #[serde(default)]
    pub voted_count: u32,
}

impl Participant {
    pub fn new(nickname: String) -> Self {
        Self {
            nickname,
            suggest_complete: false,
            voted_count: 0,
        }
    }
}
