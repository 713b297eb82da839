use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{parse_user, ApiError};
use crate::models::{Opponent, OpponentId};

#[derive(Debug, Deserialize)]
pub struct OpponentInput {
    pub name: String,
}

impl OpponentInput {
    fn validated_name(&self) -> Result<&str, ApiError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("opponent name must not be blank".to_string()));
        }
        Ok(name)
    }
}

#[derive(Debug, Serialize)]
pub struct OpponentsResponse {
    pub opponents: Vec<Opponent>,
}

#[derive(Debug, Serialize)]
pub struct DeleteOpponentResponse {
    pub deleted: OpponentId,
    pub unlinked_records: usize,
}

pub async fn list_opponents(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<OpponentsResponse>, ApiError> {
    let user = parse_user(&user_id)?;
    let opponents = state.store.list_opponents(&user)?;
    Ok(Json(OpponentsResponse { opponents }))
}

pub async fn create_opponent(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<OpponentInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Opponent>), ApiError> {
    let user = parse_user(&user_id)?;
    let Json(input) = payload?;
    let opponent = state.store.create_opponent(&user, input.validated_name()?)?;
    Ok((StatusCode::CREATED, Json(opponent)))
}

pub async fn rename_opponent(
    State(state): State<AppState>,
    Path((user_id, opponent_id)): Path<(String, String)>,
    payload: Result<Json<OpponentInput>, JsonRejection>,
) -> Result<Json<Opponent>, ApiError> {
    let user = parse_user(&user_id)?;
    let Json(input) = payload?;
    let opponent = state.store.rename_opponent(
        &user,
        &OpponentId::from(opponent_id.as_str()),
        input.validated_name()?,
    )?;
    Ok(Json(opponent))
}

pub async fn delete_opponent(
    State(state): State<AppState>,
    Path((user_id, opponent_id)): Path<(String, String)>,
) -> Result<Json<DeleteOpponentResponse>, ApiError> {
    let user = parse_user(&user_id)?;
    let id = OpponentId::from(opponent_id.as_str());
    let unlinked_records = state.store.delete_opponent(&user, &id)?;
    Ok(Json(DeleteOpponentResponse {
        deleted: id,
        unlinked_records,
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, send_json, setup_test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_list_opponents() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(tmp.path()));

        for name in ["sato", "Yamada", "Abe"] {
            let (status, _) = send_json(
                app.clone(),
                "POST",
                "/api/users/alice/opponents",
                Some(json!({ "name": name })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, json) = get_json(app, "/api/users/alice/opponents").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = json["opponents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Abe", "sato", "Yamada"]);
    }

    #[tokio::test]
    async fn test_duplicate_and_blank_names() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(tmp.path()));
        let uri = "/api/users/alice/opponents";

        send_json(app.clone(), "POST", uri, Some(json!({"name": "Yamada"}))).await;
        let body = Some(json!({"name": " Yamada "}));
        let (status, json) = send_json(app.clone(), "POST", uri, body).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "CONFLICT");

        let (status, _) = send_json(app.clone(), "POST", uri, Some(json!({"name": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send_json(app, "POST", uri, Some(json!({"nickname": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rename_and_delete_opponent() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(tmp.path()));

        let record = json!({
            "note_type": "game_practice",
            "result": "win",
            "category": "doubles",
            "opponents": ["Yamada", "Sato"],
            "score_sets": [{"my_score": 21, "opponent_score": 12}]
        });
        let (_, created) =
            send_json(app.clone(), "POST", "/api/users/alice/records", Some(record)).await;
        let record_uri = format!("/api/users/alice/records/{}", created["id"].as_str().unwrap());

        let (_, list) = get_json(app.clone(), "/api/users/alice/opponents").await;
        let yamada = list["opponents"]
            .as_array()
            .unwrap()
            .iter()
            .find(|o| o["name"] == "Yamada")
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string();
        let uri = format!("/api/users/alice/opponents/{}", yamada);

        let body = Some(json!({"name": "Yamada Taro"}));
        let (status, renamed) = send_json(app.clone(), "PUT", &uri, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["id"], yamada.as_str());

        let (_, fetched) = get_json(app.clone(), &record_uri).await;
        assert_eq!(fetched["opponents"], json!(["Yamada Taro", "Sato"]));

        let (status, deleted) = send_json(app.clone(), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["unlinked_records"], 1);

        let (_, fetched) = get_json(app.clone(), &record_uri).await;
        assert_eq!(fetched["opponents"], json!(["Sato"]));

        let (status, _) = send_json(app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
