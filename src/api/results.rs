use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::api::{BestPairDesc, ResultsDesc};
use crate::pipeline::{best_pair, compute_ranks, VotePipeline};

use super::load_group;

pub fn routes() -> Vec<Route> {
    routes![get_results, get_best_couple]
}

/// Candidates ordered by rank, with the top three singled out.
/// Live while voting is still open.
#[get("/groups/<group_id>/results")]
async fn get_results(group_id: &str, pipeline: &State<VotePipeline>) -> Result<Json<ResultsDesc>> {
    let mut group = load_group(pipeline, group_id).await?;
    compute_ranks(&mut group.candidates);
    Ok(Json(ResultsDesc::from_ranked(&group)))
}

#[get("/groups/<group_id>/best_couple")]
async fn get_best_couple(
    group_id: &str,
    pipeline: &State<VotePipeline>,
) -> Result<Json<BestPairDesc>> {
    let group = load_group(pipeline, group_id).await?;
    let desc = match best_pair(&group) {
        Some(pair) => pair.describe(&group),
        None => BestPairDesc::default(),
    };
    Ok(Json(desc))
}
