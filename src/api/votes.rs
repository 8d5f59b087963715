use std::collections::BTreeMap;

use rocket::{http::Status, response::status::Custom, serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{
    api::{VoteComplete, VoteQueued},
    common::{CandidateId, Choice},
};
use crate::pipeline::{VotePipeline, VoteSubmission};

pub fn routes() -> Vec<Route> {
    routes![submit_votes, vote_complete]
}

/// Queue a participant's choices for the vote worker and return straight away.
/// Candidates left out of `choices` keep whatever the participant chose before.
#[post("/groups/<group_id>/votes/<participant_id>", data = "<choices>", format = "json")]
fn submit_votes(
    group_id: &str,
    participant_id: &str,
    choices: Json<BTreeMap<CandidateId, Choice>>,
    pipeline: &State<VotePipeline>,
) -> Result<Custom<Json<VoteQueued>>> {
    let queue_length = pipeline.enqueue(VoteSubmission {
        group_id: group_id.to_string(),
        participant_id: participant_id.to_string(),
        choices: choices.into_inner(),
    })?;
    Ok(Custom(
        Status::Accepted,
        Json(VoteQueued {
            message: "Vote queued for processing".to_string(),
            queue_length,
        }),
    ))
}

/// Whether the saved group shows the participant as having voted on every candidate.
#[get("/groups/<group_id>/participants/<participant_id>/vote_complete")]
async fn vote_complete(
    group_id: &str,
    participant_id: &str,
    pipeline: &State<VotePipeline>,
) -> Result<Json<VoteComplete>> {
    let vote_complete = pipeline
        .check_vote_complete(group_id, participant_id)
        .await?;
    Ok(Json(VoteComplete { vote_complete }))
}
