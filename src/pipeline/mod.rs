//! The asynchronous vote pipeline.
//!
//! Request handlers push [`VoteSubmission`]s onto a shared queue and return at once.
//! A single [`VoteWorker`] drains the queue one group at a time, merges the votes
//! into the stored group and re-ranks its candidates. A [`PhaseScheduler`] moves
//! timer-mode groups into voting when their suggestion time runs out.

use std::sync::Arc;

use rocket::{
    fairing::{Fairing, Info, Kind},
    tokio, Build, Orbit, Rocket,
};
use thiserror::Error;

use crate::{
    config::Config,
    model::common::{CandidateId, Choice, GroupId, ParticipantId},
    store::{Store, StoreError},
};

pub mod aggregator;
pub mod best_pair;
pub mod locks;
pub mod phase;
pub mod queue;
pub mod ranking;
pub mod scheduler;
pub mod worker;

pub use aggregator::{apply_batch, BatchReport};
pub use best_pair::{best_pair, BestPair};
pub use locks::{GroupGuard, GroupLocks};
pub use queue::{Batch, SubmissionQueue, VoteSubmission};
pub use ranking::compute_ranks;
pub use scheduler::PhaseScheduler;
pub use worker::VoteWorker;

/// Reasons a batch of votes could not be applied.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Group {0} not found")]
    NotFound(GroupId),
    #[error("No participant with ID {participant_id} in group {group_id}")]
    UnknownParticipant {
        group_id: GroupId,
        participant_id: ParticipantId,
    },
    #[error("Failed to persist group: {0}")]
    Persistence(#[from] StoreError),
    #[error("Malformed vote submission: {0}")]
    Malformed(String),
    #[error("Group {0} has finished voting")]
    PhaseClosed(GroupId),
}

/// Handle on the pipeline shared by every request.
#[derive(Clone)]
pub struct VotePipeline {
    queue: Arc<SubmissionQueue>,
    locks: GroupLocks,
    store: Store,
}

impl VotePipeline {
    pub fn new(store: Store) -> Self {
        Self {
            queue: Arc::new(SubmissionQueue::new()),
            locks: GroupLocks::new(),
            store,
        }
    }

    /// Queue a submission for the worker. Never waits on the worker.
    /// Returns the number of submissions now queued.
    pub fn enqueue(&self, submission: VoteSubmission) -> Result<usize, PipelineError> {
        if submission.choices.is_empty() {
            return Err(PipelineError::Malformed(format!(
                "no choices from {} for group {}",
                submission.participant_id, submission.group_id
            )));
        }
        let queued = self.queue.push(submission);
        trace!("{queued} vote submissions queued");
        Ok(queued)
    }

    /// Queue a single choice.
    pub fn enqueue_vote(
        &self,
        group_id: GroupId,
        participant_id: ParticipantId,
        candidate_id: CandidateId,
        choice: Choice,
    ) -> Result<usize, PipelineError> {
        self.enqueue(VoteSubmission::single(
            group_id,
            participant_id,
            candidate_id,
            choice,
        ))
    }

    /// Whether the participant has voted on every candidate, according to the latest
    /// saved snapshot. Votes still queued are not counted.
    pub async fn check_vote_complete(
        &self,
        group_id: &str,
        participant_id: &str,
    ) -> Result<bool, PipelineError> {
        let group = self
            .store
            .load_group(group_id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(group_id.to_string()))?;
        let participant = group.participants.get(participant_id).ok_or_else(|| {
            PipelineError::UnknownParticipant {
                group_id: group_id.to_string(),
                participant_id: participant_id.to_string(),
            }
        })?;
        Ok(participant.voted_count as usize == group.candidates.len())
    }

    pub fn locks(&self) -> &GroupLocks {
        &self.locks
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn worker(&self, config: &Config) -> VoteWorker {
        VoteWorker::new(
            self.queue.clone(),
            self.locks.clone(),
            self.store.clone(),
            config.vote_batch_wait(),
            config.save_conflict_retries(),
        )
    }

    pub fn scheduler(&self, config: &Config) -> PhaseScheduler {
        PhaseScheduler::new(
            self.store.clone(),
            self.locks.clone(),
            config.phase_sweep_period(),
        )
    }
}

/// A fairing that puts a [`VotePipeline`] over the managed [`Store`] into managed
/// state, and runs its worker and scheduler from liftoff until shutdown.
pub struct PipelineFairing;

#[rocket::async_trait]
impl Fairing for PipelineFairing {
    fn info(&self) -> Info {
        Info {
            name: "Vote pipeline",
            kind: Kind::Ignite | Kind::Liftoff,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        let store = match rocket.state::<Store>() {
            Some(store) => store.clone(),
            None => {
                error!("Vote pipeline needs a group store");
                return Err(rocket);
            }
        };
        if rocket.state::<Config>().is_none() {
            error!("Vote pipeline needs the application config");
            return Err(rocket);
        }
        Ok(rocket.manage(VotePipeline::new(store)))
    }

    async fn on_liftoff(&self, rocket: &Rocket<Orbit>) {
        // Both are present, as checked on ignite.
        let (Some(pipeline), Some(config)) =
            (rocket.state::<VotePipeline>(), rocket.state::<Config>())
        else {
            return;
        };
        tokio::spawn(pipeline.worker(config).run(rocket.shutdown()));
        tokio::spawn(pipeline.scheduler(config).run(rocket.shutdown()));
    }
}
