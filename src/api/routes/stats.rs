//! Statistics endpoints. All views are derived per request from the
//! user's records with a result.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::{parse_user, ApiError};
use crate::calculate::{self, OpponentQuery};
use crate::models::{OpponentDetail, OpponentList, Overview};

#[derive(Debug, Deserialize)]
pub struct OpponentListParams {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

pub async fn overview(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Overview>, ApiError> {
    let user = parse_user(&user_id)?;
    let records = state.records.records_with_result(&user).await?;
    debug!(user = %user, records = records.len(), "Computing overview");
    Ok(Json(calculate::overview(&records)))
}

pub async fn opponents(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<OpponentListParams>,
) -> Result<Json<OpponentList>, ApiError> {
    let user = parse_user(&user_id)?;
    let query = OpponentQuery {
        search: params.search,
        limit: state.stats.opponent_limit(params.limit),
    };

    let records = state.records.records_with_result(&user).await?;
    Ok(Json(calculate::list_opponents(&records, &query)))
}

pub async fn opponent_detail(
    State(state): State<AppState>,
    Path((user_id, name)): Path<(String, String)>,
) -> Result<Json<OpponentDetail>, ApiError> {
    let user = parse_user(&user_id)?;
    let records = state.records.records_against(&user, &name).await?;
    calculate::opponent_detail(&name, &records)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no matches against {:?}", name)))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, send_json, setup_test_state};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn log_match(app: &axum::Router, opponent: &str, result: &str, scores: Value) {
        let body = json!({
            "note_type": "official_match",
            "result": result,
            "category": "singles",
            "opponents": [opponent],
            "score_sets": scores
        });
        let (status, _) =
            send_json(app.clone(), "POST", "/api/users/alice/records", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    fn straight(won: bool) -> Value {
        if won {
            json!([{"my_score": 21, "opponent_score": 10}, {"my_score": 21, "opponent_score": 12}])
        } else {
            json!([{"my_score": 10, "opponent_score": 21}, {"my_score": 12, "opponent_score": 21}])
        }
    }

    #[tokio::test]
    async fn test_overview_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(tmp.path()));

        let (status, json) = get_json(app, "/api/users/alice/stats/overview").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["total_matches"], 0);
        assert_eq!(json["win_rate"], 0.0);
        assert_eq!(json["current_streak"], 0);
        assert_eq!(json["monthly_stats"], json!({}));
    }

    #[tokio::test]
    async fn test_overview_streaks() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(tmp.path()));

        // Logged oldest first, so newest first reads W, L, W, W
        for won in [true, true, false, true] {
            log_match(&app, "Yamada", if won { "win" } else { "loss" }, straight(won)).await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let (_, json) = get_json(app, "/api/users/alice/stats/overview").await;
        assert_eq!(json["total_matches"], 4);
        assert_eq!(json["wins"], 3);
        assert_eq!(json["losses"], 1);
        assert_eq!(json["win_rate"], 75.0);
        assert_eq!(json["current_streak"], 1);
        assert_eq!(json["longest_win_streak"], 2);
        assert_eq!(json["longest_lose_streak"], 1);
        assert_eq!(json["opponent_stats"]["Yamada"]["total"], 4);
        assert_eq!(json["type_stats"]["公式戦"]["wins"], 3);
    }

    #[tokio::test]
    async fn test_opponent_list_search_and_limit() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(tmp.path()));

        log_match(&app, "Yamada", "win", straight(true)).await;
        log_match(&app, "Yamamoto", "loss", straight(false)).await;
        log_match(&app, "Sato", "win", straight(true)).await;

        let (status, json) =
            get_json(app.clone(), "/api/users/alice/stats/opponents?search=yam").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json["opponents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Yamada", "Yamamoto"]);
        assert_eq!(json["summary"]["total_opponents"], 3);

        let (_, json) = get_json(app, "/api/users/alice/stats/opponents?limit=1").await;
        assert_eq!(json["opponents"].as_array().unwrap().len(), 1);
        assert_eq!(json["opponents"][0]["name"], "Sato");
    }

    #[tokio::test]
    async fn test_opponent_detail() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(tmp.path()));

        log_match(&app, "Yamada", "loss", straight(false)).await;
        log_match(&app, "Sato", "win", straight(true)).await;

        let (status, json) = get_json(app.clone(), "/api/users/alice/stats/opponents/Yamada").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["opponent"], "Yamada");
        assert_eq!(json["stats"]["total_matches"], 1);
        assert_eq!(json["match_analysis"]["two_set_matches"]["losses"], 1);
        assert_eq!(json["tactics"].as_array().unwrap().len(), 1);

        let (status, json) = get_json(app, "/api/users/alice/stats/opponents/Nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
