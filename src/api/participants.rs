use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{JoinRequest, ParticipantJoined, SuggestCompleted},
    common::random_id,
    db::Participant,
};
use crate::pipeline::{phase::complete_suggestion, VotePipeline};

use super::update_group;

pub fn routes() -> Vec<Route> {
    routes![join_group, suggest_complete]
}

#[post("/groups/<group_id>/participants", data = "<request>", format = "json")]
async fn join_group(
    group_id: &str,
    request: Json<JoinRequest>,
    pipeline: &State<VotePipeline>,
) -> Result<Json<ParticipantJoined>> {
    let nickname = request.into_inner().nickname.trim().to_string();
    if nickname.is_empty() {
        return Err(Error::bad_request("Nickname must not be empty"));
    }

    let participant_id = random_id();
    let (group, ()) = update_group(pipeline, group_id, |group| {
        group
            .participants
            .insert(participant_id.clone(), Participant::new(nickname.clone()));
        Ok(())
    })
    .await?;

    info!("{nickname}({participant_id}) joined group {group_id}");
    Ok(Json(ParticipantJoined {
        participant_id,
        data: group.into(),
    }))
}

/// Mark a participant as done suggesting. In a group without a timer the last
/// one to finish starts the voting.
#[post("/groups/<group_id>/participants/<participant_id>/suggest-complete")]
async fn suggest_complete(
    group_id: &str,
    participant_id: &str,
    pipeline: &State<VotePipeline>,
) -> Result<Json<SuggestCompleted>> {
    let (group, started) = update_group(pipeline, group_id, |group| {
        complete_suggestion(group, participant_id).ok_or_else(|| {
            Error::not_found(format!(
                "No participant with ID {participant_id} in group {group_id}"
            ))
        })
    })
    .await?;

    if started {
        info!("Everyone in group {group_id} is done suggesting, voting has started");
    }
    Ok(Json(SuggestCompleted {
        participant_id: participant_id.to_string(),
        state: group.state,
    }))
}
