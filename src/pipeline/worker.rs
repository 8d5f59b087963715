use std::sync::Arc;

use rocket::{
    tokio::{select, time::Duration},
    Shutdown,
};

use crate::store::{Store, StoreError};

use super::{
    aggregator::{apply_batch, BatchReport},
    locks::GroupLocks,
    phase::accepts_votes,
    queue::{Batch, SubmissionQueue},
    PipelineError,
};

/// Background consumer of the [`SubmissionQueue`].
///
/// Repeatedly collects one group's batch, applies it to the latest snapshot of the
/// group under that group's lock, and saves the result. Failed batches are logged
/// and dropped; they never reach the submitters.
pub struct VoteWorker {
    queue: Arc<SubmissionQueue>,
    locks: GroupLocks,
    store: Store,
    wait: Duration,
    retries: u32,
}

impl VoteWorker {
    pub fn new(
        queue: Arc<SubmissionQueue>,
        locks: GroupLocks,
        store: Store,
        wait: Duration,
        retries: u32,
    ) -> Self {
        Self {
            queue,
            locks,
            store,
            wait,
            retries,
        }
    }

    /// Process batches until `shutdown` fires, then drain whatever is still queued.
    pub async fn run(self, mut shutdown: Shutdown) {
        info!("Vote worker started");
        loop {
            let batch = select! {
                _ = &mut shutdown => break,
                batch = self.queue.collect_batch(self.wait) => batch,
            };
            if let Some(batch) = batch {
                self.handle(batch).await;
            }
        }

        let remaining = self.queue.len();
        if remaining > 0 {
            info!("Flushing {remaining} queued votes before shutdown");
        }
        while let Some(batch) = self.queue.try_collect_batch() {
            self.handle(batch).await;
        }
        info!("Vote worker stopped");
    }

    async fn handle(&self, batch: Batch) {
        debug!(
            "Processing {} submissions for group {}",
            batch.len(),
            batch.group_id
        );
        if let Err(e) = self.process_batch(&batch).await {
            error!(
                "Dropped {} submissions for group {}: {e}",
                batch.len(),
                batch.group_id
            );
        }
    }

    /// Apply one batch and persist the group.
    ///
    /// If someone else saved the group in the meantime the whole batch is re-applied
    /// to the fresh snapshot, up to the configured number of retries.
    pub async fn process_batch(&self, batch: &Batch) -> Result<BatchReport, PipelineError> {
        let _guard = self.locks.lock(&batch.group_id).await;
        let mut attempt = 0;
        loop {
            let mut group = self
                .store
                .load_group(&batch.group_id)
                .await?
                .ok_or_else(|| PipelineError::NotFound(batch.group_id.clone()))?;
            if !accepts_votes(&group) {
                return Err(PipelineError::PhaseClosed(group.id));
            }

            let report = apply_batch(&mut group, batch);
            match self.store.save_group(&group).await {
                Ok(version) => {
                    debug!(
                        "Saved group {} at version {version} ({} applied, {} skipped)",
                        group.id, report.applied, report.skipped
                    );
                    return Ok(report);
                }
                Err(StoreError::Conflict { .. }) if attempt < self.retries => {
                    attempt += 1;
                    warn!(
                        "Group {} changed while applying votes, retrying ({attempt}/{})",
                        group.id, self.retries
                    );
                }
                Err(StoreError::NotFound(id)) => return Err(PipelineError::NotFound(id)),
                Err(e) => return Err(e.into()),
            }
        }
    }
}
