use rocket::Route;

use crate::error::{Error, Result};
use crate::model::db::Group;
use crate::pipeline::VotePipeline;

mod candidates;
mod groups;
mod participants;
mod results;
mod votes;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(groups::routes());
    routes.extend(candidates::routes());
    routes.extend(participants::routes());
    routes.extend(votes::routes());
    routes.extend(results::routes());
    routes
}

/// Fetch the latest snapshot of a group, or 404.
async fn load_group(pipeline: &VotePipeline, group_id: &str) -> Result<Group> {
    pipeline
        .store()
        .load_group(group_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("No group with ID {group_id}")))
}

/// Load, modify and save a group while holding its lock, so the change can't
/// interleave with the vote worker or the phase scheduler.
///
/// Nothing is saved if `update` fails. Returns the saved group and `update`'s result.
async fn update_group<T>(
    pipeline: &VotePipeline,
    group_id: &str,
    update: impl FnOnce(&mut Group) -> Result<T>,
) -> Result<(Group, T)> {
    let _guard = pipeline.locks().lock(group_id).await;
    let mut group = load_group(pipeline, group_id).await?;
    let output = update(&mut group)?;
    group.version = pipeline.store().save_group(&group).await?;
    Ok((group, output))
}
