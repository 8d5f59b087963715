use chrono::Utc;
use rocket::{response::status::Created, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{GroupDesc, GroupSpec, GroupSummary},
    common::random_id,
};
use crate::pipeline::{compute_ranks, phase::finish_voting, VotePipeline};

use super::{load_group, update_group};

pub fn routes() -> Vec<Route> {
    routes![list_groups, create_group, get_group, delete_group, finish_group]
}

#[get("/groups")]
async fn list_groups(pipeline: &State<VotePipeline>) -> Result<Json<Vec<GroupSummary>>> {
    let groups = pipeline.store().list_groups().await?;
    Ok(Json(groups.iter().map(GroupSummary::from).collect()))
}

#[post("/groups", data = "<spec>", format = "json")]
async fn create_group(
    spec: Json<GroupSpec>,
    pipeline: &State<VotePipeline>,
) -> Result<Created<Json<GroupDesc>>> {
    let spec = spec.into_inner();
    spec.validate().map_err(Error::bad_request)?;

    let group = spec.into_group(random_id(), Utc::now());
    pipeline.store().insert_group(&group).await?;
    info!(
        "Created group {} ({} mode)",
        group.id,
        if group.timer_mode { "timer" } else { "manual" }
    );

    let location = format!("/groups/{}", group.id);
    Ok(Created::new(location).body(Json(group.into())))
}

#[get("/groups/<group_id>")]
async fn get_group(group_id: &str, pipeline: &State<VotePipeline>) -> Result<Json<GroupDesc>> {
    let mut group = load_group(pipeline, group_id).await?;
    // Candidates added since the last vote have no rank yet.
    compute_ranks(&mut group.candidates);
    Ok(Json(group.into()))
}

#[delete("/groups/<group_id>")]
async fn delete_group(group_id: &str, pipeline: &State<VotePipeline>) -> Result<()> {
    let _guard = pipeline.locks().lock(group_id).await;
    if pipeline.store().delete_group(group_id).await? {
        info!("Deleted group {group_id}");
        Ok(())
    } else {
        Err(Error::not_found(format!("No group with ID {group_id}")))
    }
}

/// Close voting. Only a group that is voting can be finished.
#[post("/groups/<group_id>/finish")]
async fn finish_group(group_id: &str, pipeline: &State<VotePipeline>) -> Result<Json<GroupDesc>> {
    let (group, finished) = update_group(pipeline, group_id, |group| {
        finish_voting(group).map_err(Error::from)
    })
    .await?;
    if finished {
        info!("Group {group_id} finished voting");
    }
    Ok(Json(group.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{json, serde_json},
    };

    use crate::api::testing::{create_group, get_group, join, populated_group};
    use crate::model::common::{GroupState, RANDOM_ID_LENGTH};
    use crate::store::{GroupStore, MemoryStore};

    use super::*;

    #[backend_test]
    async fn create_and_get(client: Client, store: MemoryStore) {
        let created = create_group(&client, &GroupSpec::example()).await;
        assert_eq!(created.id.len(), RANDOM_ID_LENGTH);
        assert_eq!(created.state, GroupState::Suggestion);
        assert_eq!(created.version, 0);
        assert!(created.candidates.is_empty());
        assert_eq!(store.len().await, 1);

        let fetched = get_group(&client, &created.id).await;
        assert_eq!(created, fetched);

        // The old field name is still accepted.
        let response = client
            .post(uri!(create_group))
            .header(ContentType::JSON)
            .body(
                json!({
                    "delivery": false,
                    "offline": false,
                    "start_votingtime": 5,
                    "x": 0.0,
                    "y": 0.0,
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let group: GroupDesc = serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        assert_eq!(group.start_voting_minutes, 5);
    }

    #[backend_test]
    async fn invalid_spec_is_rejected(client: Client, store: MemoryStore) {
        let spec = GroupSpec {
            delivery_time: None,
            ..GroupSpec::example()
        };
        let response = client
            .post(uri!(create_group))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&spec).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert!(store.is_empty().await);
    }

    #[backend_test]
    async fn list_and_delete(client: Client) {
        let first = create_group(&client, &GroupSpec::example()).await;
        let second = create_group(&client, &GroupSpec::example()).await;

        let response = client.get(uri!(list_groups)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<GroupSummary> =
            serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
        let mut ids: Vec<_> = listed.into_iter().map(|g| g.id).collect();
        let mut expected = vec![first.id.clone(), second.id.clone()];
        ids.sort();
        expected.sort();
        assert_eq!(ids, expected);

        let response = client
            .delete(uri!(delete_group(first.id.as_str())))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let response = client
            .delete(uri!(delete_group(first.id.as_str())))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        let response = client.get(uri!(get_group(first.id.as_str()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn finish_only_from_voting(client: Client, store: MemoryStore) {
        let (group_id, participants, _) = populated_group(&client).await;

        // Phases can't be skipped.
        let response = client
            .post(uri!(finish_group(group_id.as_str())))
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());

        let mut group = store.load_group(&group_id).await.unwrap().unwrap();
        group.state = GroupState::Voting;
        store.save_group(&group).await.unwrap();

        for _ in 0..2 {
            let response = client
                .post(uri!(finish_group(group_id.as_str())))
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
            let group: GroupDesc =
                serde_json::from_str(&response.into_string().await.unwrap()).unwrap();
            assert_eq!(group.state, GroupState::Results);
        }

        // Joining still works, but finishing is final.
        join(&client, &group_id, "Late").await;
        assert_eq!(get_group(&client, &group_id).await.participants.len(), participants.len() + 1);
    }

    #[backend_test]
    async fn missing_group(client: Client) {
        let response = client.get(uri!(get_group("nope"))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let response = client.post(uri!(finish_group("nope"))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
