use crate::model::{api::BestPairDesc, common::ParticipantId, db::Group};

/// The two participants whose votes agree the most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestPair {
    pub first: ParticipantId,
    pub second: ParticipantId,
    /// Inner product of their vote vectors.
    pub score: i64,
}

impl BestPair {
    /// Describe the pair using the participants' nicknames where known.
    pub fn describe(self, group: &Group) -> BestPairDesc {
        let name = |id: &str| group.nickname(id).unwrap_or(id).to_string();
        BestPairDesc {
            best_couple: vec![name(&self.first), name(&self.second)],
            best_couple_ids: vec![self.first, self.second],
            max_inner_product: Some(self.score),
        }
    }
}

/// Find the pair of voters with the highest inner product between their vote vectors.
///
/// Only voters who have voted on every candidate are considered, and at least two
/// candidates are needed. Among equal scores the first pair in ID order wins.
pub fn best_pair(group: &Group) -> Option<BestPair> {
    if group.candidates.len() < 2 {
        return None;
    }
    let vectors: Vec<(&ParticipantId, Vec<i64>)> = group
        .votes
        .iter()
        .filter_map(|(participant_id, votes)| {
            let vector = group
                .candidates
                .keys()
                .map(|candidate_id| votes.get(candidate_id).map(|c| c.affinity_weight()))
                .collect::<Option<Vec<_>>>()?;
            Some((participant_id, vector))
        })
        .collect();

    let mut best: Option<BestPair> = None;
    for (i, (first, a)) in vectors.iter().enumerate() {
        for (second, b) in &vectors[i + 1..] {
            let score = a.iter().zip(b).map(|(x, y)| x * y).sum();
            if best.as_ref().map_or(true, |best| score > best.score) {
                best = Some(BestPair {
                    first: (*first).clone(),
                    second: (*second).clone(),
                    score,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{
        common::Choice::{self, *},
        db::{Candidate, Participant},
    };

    fn three_candidates() -> Group {
        let mut group = Group::example();
        group
            .candidates
            .insert("candidate_3".to_string(), Candidate::example("Jjajangmyeon"));
        group
    }

    /// Record `choices` for the group's candidates in ID order.
    fn vote(group: &mut Group, participant: &str, choices: &[Choice]) {
        group
            .participants
            .entry(participant.to_string())
            .or_insert_with(|| Participant::new(participant.to_uppercase()));
        let ballot = group
            .candidates
            .keys()
            .cloned()
            .zip(choices.iter().copied())
            .collect();
        group.votes.insert(participant.to_string(), ballot);
    }

    #[test]
    fn identical_voters_score_the_maximum() {
        let mut group = three_candidates();
        vote(&mut group, "p1", &[Good, Never, Good]);
        vote(&mut group, "p2", &[Bad, Soso, Good]);
        vote(&mut group, "p3", &[Good, Never, Good]);
        let pair = best_pair(&group).unwrap();
        assert_eq!((pair.first.as_str(), pair.second.as_str()), ("p1", "p3"));
        // Every component is ±3, so equal vectors give 9 per candidate.
        assert_eq!(pair.score, 27);
    }

    #[test]
    fn partial_voters_are_ignored() {
        let mut group = three_candidates();
        vote(&mut group, "p1", &[Good, Good, Good]);
        vote(&mut group, "p2", &[Good, Good]);
        vote(&mut group, "p3", &[Soso, Bad, Good]);
        let pair = best_pair(&group).unwrap();
        assert_eq!((pair.first.as_str(), pair.second.as_str()), ("p1", "p3"));
        assert_eq!(pair.score, 3 - 3 + 9);
    }

    #[test]
    fn equal_scores_keep_the_first_pair() {
        let mut group = three_candidates();
        vote(&mut group, "p1", &[Good, Good, Good]);
        vote(&mut group, "p2", &[Good, Good, Good]);
        vote(&mut group, "p3", &[Good, Good, Good]);
        let pair = best_pair(&group).unwrap();
        assert_eq!((pair.first.as_str(), pair.second.as_str()), ("p1", "p2"));
    }

    #[test]
    fn pairs_need_two_complete_voters_and_two_candidates() {
        let mut group = three_candidates();
        vote(&mut group, "p1", &[Good, Good, Good]);
        vote(&mut group, "p2", &[Good]);
        assert_eq!(best_pair(&group), None);

        let mut group = Group::example();
        group.candidates.retain(|id, _| id == "candidate_1");
        vote(&mut group, "p1", &[Good]);
        vote(&mut group, "p2", &[Good]);
        assert_eq!(best_pair(&group), None);
    }

    #[test]
    fn description_uses_nicknames() {
        let mut group = three_candidates();
        vote(&mut group, "p1", &[Good, Good, Good]);
        vote(&mut group, "ghost", &[Good, Good, Good]);
        group.participants.remove("ghost");
        let desc = best_pair(&group).unwrap().describe(&group);
        assert_eq!(desc.best_couple_ids, vec!["ghost".to_string(), "p1".to_string()]);
        assert_eq!(desc.best_couple, vec!["ghost".to_string(), "Minji".to_string()]);
        assert_eq!(desc.max_inner_product, Some(27));
    }
}
