use rocket::{http::Status, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{CandidateAdded, CandidateSpec},
    common::GroupState,
    db::Candidate,
};
use crate::pipeline::{aggregator::UNKNOWN_PARTICIPANT, VotePipeline};

use super::update_group;

pub fn routes() -> Vec<Route> {
    routes![add_candidate]
}

#[post("/groups/<group_id>/candidates", data = "<spec>", format = "json")]
async fn add_candidate(
    group_id: &str,
    spec: Json<CandidateSpec>,
    pipeline: &State<VotePipeline>,
) -> Result<Json<CandidateAdded>> {
    let spec = spec.into_inner();
    if spec.name.trim().is_empty() {
        return Err(Error::bad_request("Candidate name must not be empty"));
    }

    let (group, candidate_id) = update_group(pipeline, group_id, |group| {
        if group.state == GroupState::Results {
            return Err(Error::Status(
                Status::Conflict,
                format!("Group {} has finished voting", group.id),
            ));
        }
        let candidate_id = group.next_candidate_id();
        group
            .candidates
            .insert(candidate_id.clone(), Candidate::from(spec));
        Ok(candidate_id)
    })
    .await?;

    let candidate = &group.candidates[&candidate_id];
    info!(
        "{}({}) added candidate {candidate_id} \"{}\" to group {group_id}",
        group.nickname(&candidate.added_by).unwrap_or(UNKNOWN_PARTICIPANT),
        candidate.added_by,
        candidate.name
    );
    Ok(Json(CandidateAdded {
        candidate_id,
        data: group.into(),
    }))
}
