use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rocket::tokio::{
    sync::Notify,
    time::{timeout, Duration},
};
use crate::model::common::{CandidateId, Choice, GroupId, ParticipantId};

/// One participant's (partial) vote, waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteSubmission {
    pub group_id: GroupId,
    pub participant_id: ParticipantId,
    /// Only the named candidates are updated; earlier choices for other candidates stand.
    pub choices: BTreeMap<CandidateId, Choice>,
}

impl VoteSubmission {
    /// A submission carrying a single choice.
    pub fn single(
        group_id: impl Into<GroupId>,
        participant_id: impl Into<ParticipantId>,
        candidate_id: impl Into<CandidateId>,
        choice: Choice,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            participant_id: participant_id.into(),
            choices: BTreeMap::from([(candidate_id.into(), choice)]),
        }
    }
}

/// Submissions for one group, in the order they were queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub group_id: GroupId,
    pub submissions: Vec<VoteSubmission>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }
}

/// FIFO of vote submissions shared between request handlers and the vote worker.
///
/// Pushing never waits on the worker. Collecting takes the oldest submission and
/// every other queued submission for the same group, leaving the rest in place.
#[derive(Debug, Default)]
pub struct SubmissionQueue {
    pending: Mutex<VecDeque<VoteSubmission>>,
    available: Notify,
}

impl SubmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a submission. Returns the queue length including it.
    pub fn push(&self, submission: VoteSubmission) -> usize {
        let len = {
            let mut pending = self.pending();
            pending.push_back(submission);
            pending.len()
        };
        self.available.notify_one();
        len
    }

    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collect the next batch, waiting up to `wait` for a first submission to arrive.
    /// Returns `None` if nothing turned up, which callers should simply retry.
    ///
    /// Cancelling the returned future never loses a submission.
    pub async fn collect_batch(&self, wait: Duration) -> Option<Batch> {
        if let Some(batch) = self.try_collect_batch() {
            return Some(batch);
        }
        // A push between the check above and this wait leaves a stored permit,
        // so the wakeup is not missed.
        timeout(wait, self.available.notified()).await.ok()?;
        self.try_collect_batch()
    }

    /// Collect the next batch only if one is immediately available.
    pub fn try_collect_batch(&self) -> Option<Batch> {
        let mut pending = self.pending();
        let first = pending.pop_front()?;
        let group_id = first.group_id.clone();
        let mut submissions = vec![first];
        let mut rest = VecDeque::with_capacity(pending.len());
        for submission in pending.drain(..) {
            if submission.group_id == group_id {
                submissions.push(submission);
            } else {
                rest.push_back(submission);
            }
        }
        *pending = rest;
        Some(Batch {
            group_id,
            submissions,
        })
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<VoteSubmission>> {
        // The queue is consistent after every critical section, so poisoning is harmless.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::time::Instant;

    use Choice::*;

    fn submission(group: &str, participant: &str) -> VoteSubmission {
        VoteSubmission::single(group, participant, "candidate_1", Good)
    }

    #[rocket::async_test]
    async fn batches_take_only_the_first_group() {
        let queue = SubmissionQueue::new();
        queue.push(submission("A", "p1"));
        queue.push(submission("B", "p2"));
        queue.push(submission("A", "p3"));

        let batch = queue.collect_batch(Duration::from_millis(10)).await.unwrap();
        assert_eq!(batch.group_id, "A");
        let participants: Vec<_> = batch
            .submissions
            .iter()
            .map(|s| s.participant_id.as_str())
            .collect();
        assert_eq!(participants, vec!["p1", "p3"]);

        let batch = queue.collect_batch(Duration::from_millis(10)).await.unwrap();
        assert_eq!(batch.group_id, "B");
        assert_eq!(batch.submissions, vec![submission("B", "p2")]);
        assert!(queue.is_empty());
    }

    #[rocket::async_test]
    async fn other_groups_keep_their_order() {
        let queue = SubmissionQueue::new();
        for (group, participant) in [("A", "1"), ("B", "2"), ("C", "3"), ("A", "4"), ("B", "5")] {
            queue.push(submission(group, participant));
        }
        queue.try_collect_batch().unwrap();

        let remaining: Vec<_> = std::iter::from_fn(|| queue.try_collect_batch())
            .map(|b| {
                let len = b.len();
                (b.group_id, len)
            })
            .collect();
        assert_eq!(
            remaining,
            vec![("B".to_string(), 2), ("C".to_string(), 1)]
        );
    }

    #[rocket::async_test]
    async fn empty_queue_times_out() {
        let queue = SubmissionQueue::new();
        let start = Instant::now();
        assert!(queue.collect_batch(Duration::from_millis(50)).await.is_none());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[rocket::async_test]
    async fn waiting_collector_wakes_on_push() {
        let queue = Arc::new(SubmissionQueue::new());
        let collector = {
            let queue = queue.clone();
            rocket::tokio::spawn(async move { queue.collect_batch(Duration::from_secs(10)).await })
        };
        rocket::tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(queue.push(submission("A", "p1")), 1);

        let batch = collector.await.unwrap().unwrap();
        assert_eq!(batch.group_id, "A");
    }
}
