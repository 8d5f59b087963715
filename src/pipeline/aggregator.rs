use crate::model::db::Group;

use super::{ranking::compute_ranks, Batch, VoteSubmission};

/// Label used in logs for votes from participants the group doesn't know about.
pub const UNKNOWN_PARTICIPANT: &str = "unknown participant";

/// What happened to the individual choices in a batch.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Choices merged into the group's votes.
    pub applied: usize,
    /// Choices naming a candidate the group doesn't have.
    pub skipped: usize,
    /// Submissions carrying no choices at all.
    pub empty: usize,
}

/// Merge every submission of `batch` into `group`, in order.
pub fn apply_batch(group: &mut Group, batch: &Batch) -> BatchReport {
    let mut report = BatchReport::default();
    for submission in &batch.submissions {
        apply_submission(group, submission, &mut report);
    }
    report
}

/// Merge one submission, then bring tallies, ranks and the voter's count up to date.
fn apply_submission(group: &mut Group, submission: &VoteSubmission, report: &mut BatchReport) {
    if submission.choices.is_empty() {
        warn!(
            "Ignoring empty vote submission from {} for group {}",
            submission.participant_id, group.id
        );
        report.empty += 1;
        return;
    }

    let nickname = group
        .nickname(&submission.participant_id)
        .unwrap_or(UNKNOWN_PARTICIPANT)
        .to_string();
    let participant_votes = group
        .votes
        .entry(submission.participant_id.clone())
        .or_default();
    for (candidate_id, &choice) in &submission.choices {
        if !group.candidates.contains_key(candidate_id) {
            warn!(
                "{nickname}({}) voted on unknown candidate {candidate_id} in group {}, skipping",
                submission.participant_id, group.id
            );
            report.skipped += 1;
            continue;
        }
        info!(
            "Vote recorded: {nickname}({}) voted {choice} on {candidate_id} in group {}",
            submission.participant_id, group.id
        );
        participant_votes.insert(candidate_id.clone(), choice);
        report.applied += 1;
    }
    if participant_votes.is_empty() {
        // Nothing valid was ever recorded for them.
        group.votes.remove(&submission.participant_id);
    }

    recount_tallies(group);
    compute_ranks(&mut group.candidates);
    update_voted_count(group, &submission.participant_id);
}

/// Rebuild every candidate's tallies from the full vote map.
pub fn recount_tallies(group: &mut Group) {
    for candidate in group.candidates.values_mut() {
        candidate.clear_tallies();
    }
    for participant_votes in group.votes.values() {
        for (candidate_id, &choice) in participant_votes {
            if let Some(candidate) = group.candidates.get_mut(candidate_id) {
                candidate.record(choice);
            }
        }
    }
}

/// Set a participant's `voted_count` from their vote map.
fn update_voted_count(group: &mut Group, participant_id: &str) {
    let count = group.votes.get(participant_id).map_or(0, |votes| votes.len());
    if let Some(participant) = group.participants.get_mut(participant_id) {
        participant.voted_count = u32::try_from(count).unwrap_or(u32::MAX);
        debug!("{participant_id} has now voted on {count} candidates");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use crate::model::{
        common::Choice::{self, *},
        db::Candidate,
    };

    fn vote(participant: &str, candidate: &str, choice: Choice) -> VoteSubmission {
        VoteSubmission::single("group1", participant, candidate, choice)
    }

    fn batch(submissions: Vec<VoteSubmission>) -> Batch {
        Batch {
            group_id: "group1".to_string(),
            submissions,
        }
    }

    fn tallies(group: &Group, candidate: &str) -> [u32; 4] {
        let c = &group.candidates[candidate];
        [c.good, c.soso, c.bad, c.never]
    }

    #[test]
    fn two_voters_two_candidates() {
        let mut group = Group::example();
        apply_batch(
            &mut group,
            &batch(vec![
                vote("p1", "candidate_1", Good),
                vote("p1", "candidate_2", Bad),
                vote("p2", "candidate_1", Good),
                vote("p2", "candidate_2", Never),
            ]),
        );

        assert_eq!(tallies(&group, "candidate_1"), [2, 0, 0, 0]);
        assert_eq!(tallies(&group, "candidate_2"), [0, 0, 1, 1]);
        assert_eq!(group.candidates["candidate_1"].score(), 2);
        assert_eq!(group.candidates["candidate_2"].score(), -102);
        assert_eq!(group.candidates["candidate_1"].rank, Some(1));
        assert_eq!(group.candidates["candidate_2"].rank, Some(2));
        assert_eq!(group.participants["p1"].voted_count, 2);
        assert_eq!(group.participants["p2"].voted_count, 2);
    }

    #[test]
    fn later_choices_overwrite_only_their_candidate() {
        let mut group = Group::example();
        apply_batch(
            &mut group,
            &batch(vec![
                vote("p1", "candidate_1", Good),
                vote("p1", "candidate_2", Soso),
            ]),
        );
        apply_batch(&mut group, &batch(vec![vote("p1", "candidate_1", Never)]));

        assert_eq!(group.votes["p1"]["candidate_1"], Never);
        assert_eq!(group.votes["p1"]["candidate_2"], Soso);
        assert_eq!(tallies(&group, "candidate_1"), [0, 0, 0, 1]);
        assert_eq!(tallies(&group, "candidate_2"), [0, 1, 0, 0]);
        assert_eq!(group.participants["p1"].voted_count, 2);
    }

    #[test]
    fn unknown_participants_are_still_recorded() {
        let mut group = Group::example();
        let report = apply_batch(&mut group, &batch(vec![vote("stranger", "candidate_2", Good)]));

        assert_eq!(report.applied, 1);
        assert_eq!(group.votes["stranger"]["candidate_2"], Good);
        assert_eq!(tallies(&group, "candidate_2"), [1, 0, 0, 0]);
        assert!(!group.participants.contains_key("stranger"));
    }

    #[test]
    fn unknown_candidates_and_empty_submissions_are_skipped() {
        let mut group = Group::example();
        let empty = VoteSubmission {
            choices: BTreeMap::new(),
            ..vote("p1", "candidate_1", Good)
        };
        let report = apply_batch(
            &mut group,
            &batch(vec![empty, vote("p1", "candidate_9", Good)]),
        );

        assert_eq!(
            report,
            BatchReport {
                applied: 0,
                skipped: 1,
                empty: 1,
            }
        );
        assert!(group.votes.is_empty());
        assert_eq!(group.participants["p1"].voted_count, 0);
    }

    #[test]
    fn full_recount_matches_incremental_application() {
        let choices = [Good, Soso, Bad, Never];
        let mut group = Group::example();
        for i in 3..6 {
            group
                .candidates
                .insert(format!("candidate_{i}"), Candidate::example("extra"));
        }
        let submissions: Vec<_> = (0..40)
            .map(|i| {
                vote(
                    &format!("p{}", i % 4),
                    &format!("candidate_{}", 1 + i % 5),
                    choices[(i * 7) % 4],
                )
            })
            .collect();

        let mut incremental = group.clone();
        for submission in &submissions {
            apply_batch(&mut incremental, &batch(vec![submission.clone()]));
        }
        let mut batched = group.clone();
        apply_batch(&mut batched, &batch(submissions));
        assert_eq!(incremental, batched);

        let mut recounted = incremental.clone();
        recount_tallies(&mut recounted);
        assert_eq!(recounted.candidates, incremental.candidates);

        for (id, participant) in &incremental.participants {
            let expected = incremental.votes.get(id).map_or(0, |v| v.len());
            assert_eq!(participant.voted_count as usize, expected);
        }
    }
}
