use serde::{Deserialize, Serialize};

use crate::model::{
    common::{CandidateId, ParticipantId},
    db::{Candidate, Group},
};

/// Number of candidates singled out at the top of the results.
const TOP_COUNT: usize = 3;

/// One candidate's standing in the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub id: CandidateId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rank: Option<u32>,
    pub score: i64,
    pub good: u32,
    pub soso: u32,
    pub bad: u32,
    pub never: u32,
}

impl RankedCandidate {
    fn new(id: &CandidateId, candidate: &Candidate) -> Self {
        Self {
            id: id.clone(),
            name: candidate.name.clone(),
            kind: candidate.kind.clone(),
            rank: candidate.rank,
            score: candidate.score(),
            good: candidate.good,
            soso: candidate.soso,
            bad: candidate.bad,
            never: candidate.never,
        }
    }
}

/// Voting results, best first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsDesc {
    /// The best three candidates, regardless of any `never` votes.
    pub top3: Vec<RankedCandidate>,
    pub all_results: Vec<RankedCandidate>,
}

impl ResultsDesc {
    /// Build the results from a group whose ranks are up to date.
    pub fn from_ranked(group: &Group) -> Self {
        let mut all_results: Vec<_> = group
            .candidates
            .iter()
            .map(|(id, candidate)| RankedCandidate::new(id, candidate))
            .collect();
        all_results.sort_by_key(|c| c.rank.unwrap_or(u32::MAX));
        let top3 = all_results.iter().take(TOP_COUNT).cloned().collect();
        Self { top3, all_results }
    }
}

/// The two participants whose votes agree the most.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BestPairDesc {
    /// Nicknames of the pair; empty if there is no pair.
    pub best_couple: Vec<String>,
    pub best_couple_ids: Vec<ParticipantId>,
    pub max_inner_product: Option<i64>,
}

/// Whether a participant has voted on every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteComplete {
    pub vote_complete: bool,
}

/// Acknowledgement that a vote was queued for processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteQueued {
    pub message: String,
    /// Number of submissions waiting ahead of the worker, including this one.
    pub queue_length: usize,
}
