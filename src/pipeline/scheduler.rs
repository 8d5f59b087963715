use chrono::{DateTime, Utc};
use rocket::{
    tokio::{
        select,
        time::{interval, Duration, MissedTickBehavior},
    },
    Shutdown,
};

use crate::{
    model::common::GroupId,
    store::{Store, StoreError},
};

use super::{locks::GroupLocks, phase::expire_suggestion};

/// Periodically moves timer-mode groups whose suggestion time is up into voting.
pub struct PhaseScheduler {
    store: Store,
    locks: GroupLocks,
    period: Duration,
}

impl PhaseScheduler {
    pub fn new(store: Store, locks: GroupLocks, period: Duration) -> Self {
        Self {
            store,
            locks,
            period,
        }
    }

    /// Sweep every period until `shutdown` fires. A sweep in progress is finished first.
    pub async fn run(self, mut shutdown: Shutdown) {
        info!("Phase scheduler started, sweeping every {:?}", self.period);
        let mut ticks = interval(self.period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            select! {
                _ = &mut shutdown => break,
                _ = ticks.tick() => {}
            }
            if let Err(e) = self.sweep(Utc::now()).await {
                error!("Phase sweep failed: {e}");
            }
        }
        info!("Phase scheduler stopped");
    }

    /// Start voting in every timed group that is due at `now`.
    /// Returns the groups that moved. Failures for single groups are logged and skipped.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<Vec<GroupId>, StoreError> {
        let due: Vec<GroupId> = self
            .store
            .timed_suggestion_groups()
            .await?
            .into_iter()
            .filter(|group| now >= group.voting_starts_at())
            .map(|group| group.id)
            .collect();

        let mut started = Vec::new();
        for id in due {
            match self.expire(&id, now).await {
                Ok(true) => {
                    info!("Group {id}: suggestion time is up, voting has started");
                    started.push(id);
                }
                Ok(false) => {}
                Err(e) => error!("Failed to start voting in group {id}: {e}"),
            }
        }
        Ok(started)
    }

    async fn expire(&self, id: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let _guard = self.locks.lock(id).await;
        // Reload under the lock; the listed snapshot may be stale.
        let mut group = match self.store.load_group(id).await? {
            Some(group) => group,
            None => return Ok(false),
        };
        if !expire_suggestion(&mut group, now) {
            return Ok(false);
        }
        self.store.save_group(&group).await?;
        Ok(true)
    }
}
