use std::collections::BTreeMap;

use crate::model::{common::CandidateId, db::Candidate};

/// Assign ranks `1..=n` by descending score.
///
/// Candidates with equal scores are ordered by ascending ID. Since the map
/// iterates in ID order and the sort is stable, this falls out of the sort.
pub fn compute_ranks(candidates: &mut BTreeMap<CandidateId, Candidate>) {
    let mut scored: Vec<_> = candidates
        .values_mut()
        .map(|candidate| (candidate.score(), candidate))
        .collect();
    scored.sort_by(|(a, _), (b, _)| b.cmp(a));
    for (rank, (_, candidate)) in (1..).zip(scored) {
        candidate.rank = Some(rank);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::common::Choice;

    fn candidates(tallies: &[(&str, &[Choice])]) -> BTreeMap<CandidateId, Candidate> {
        tallies
            .iter()
            .map(|(id, votes)| {
                let mut candidate = Candidate::example(id);
                for &vote in votes.iter() {
                    candidate.record(vote);
                }
                (id.to_string(), candidate)
            })
            .collect()
    }

    fn ranks(candidates: &BTreeMap<CandidateId, Candidate>) -> Vec<(&str, u32)> {
        candidates
            .iter()
            .map(|(id, c)| (id.as_str(), c.rank.unwrap()))
            .collect()
    }

    #[test]
    fn empty_set_is_a_no_op() {
        let mut empty = BTreeMap::new();
        compute_ranks(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn higher_scores_rank_first() {
        use Choice::*;
        let mut c = candidates(&[
            ("candidate_1", &[Good, Good]),
            ("candidate_2", &[Bad, Never]),
            ("candidate_3", &[Good, Good, Good]),
        ]);
        compute_ranks(&mut c);
        assert_eq!(
            ranks(&c),
            vec![("candidate_1", 2), ("candidate_2", 3), ("candidate_3", 1)]
        );
    }

    #[test]
    fn ties_break_on_candidate_id() {
        use Choice::*;
        let mut c = candidates(&[
            ("candidate_b", &[Good]),
            ("candidate_a", &[Good]),
            ("candidate_c", &[Soso, Good]),
        ]);
        compute_ranks(&mut c);
        assert_eq!(
            ranks(&c),
            vec![("candidate_a", 1), ("candidate_b", 2), ("candidate_c", 3)]
        );
    }

    #[test]
    fn ranking_is_idempotent() {
        use Choice::*;
        let mut c = candidates(&[
            ("candidate_1", &[Bad]),
            ("candidate_2", &[]),
            ("candidate_3", &[Bad]),
            ("candidate_4", &[Good, Never]),
        ]);
        compute_ranks(&mut c);
        let first = c.clone();
        compute_ranks(&mut c);
        assert_eq!(first, c);
    }

    #[test]
    fn ranks_form_a_permutation() {
        use Choice::*;
        let choices = [Good, Soso, Bad, Never];
        let mut c: BTreeMap<_, _> = (0..25)
            .map(|i| {
                let mut candidate = Candidate::example("x");
                for j in 0..(i % 7) {
                    candidate.record(choices[(i * 3 + j) % 4]);
                }
                (format!("candidate_{i}"), candidate)
            })
            .collect();
        compute_ranks(&mut c);
        let mut seen: Vec<u32> = c.values().map(|c| c.rank.unwrap()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (1..=25).collect::<Vec<_>>());
    }
}
