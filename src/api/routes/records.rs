use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{parse_filter, parse_user, ApiError, Pagination, PaginationMeta};
use crate::models::{Category, MatchResult, NoteType, OpponentId, Record, RecordId, UserId};

#[derive(Debug, Deserialize)]
pub struct ScoreInput {
    pub my_score: u32,
    pub opponent_score: u32,
}

/// Request body for creating or replacing a record.
///
/// Opponents are given by name; unknown names are created for the user.
#[derive(Debug, Deserialize)]
pub struct RecordInput {
    pub note_type: NoteType,
    pub title: Option<String>,
    pub content: Option<String>,
    pub memo: Option<String>,
    pub condition: Option<String>,
    pub result: Option<MatchResult>,
    pub category: Option<Category>,
    #[serde(default)]
    pub opponents: Vec<String>,
    #[serde(default)]
    pub score_sets: Vec<ScoreInput>,
    pub total_sets: Option<u32>,
    pub won_sets: Option<u32>,
    pub match_duration: Option<u32>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    #[serde(flatten)]
    pub record: Record,
    /// Linked opponent names, in link order
    pub opponents: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListRecordsParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub note_type: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub records: Vec<RecordResponse>,
    pub pagination: PaginationMeta,
}

fn opponent_names(
    state: &AppState,
    user: &UserId,
) -> Result<HashMap<OpponentId, String>, ApiError> {
    Ok(state
        .store
        .list_opponents(user)?
        .into_iter()
        .map(|o| (o.id, o.name))
        .collect())
}

fn to_response(record: Record, names: &HashMap<OpponentId, String>) -> RecordResponse {
    let opponents = record
        .opponent_ids
        .iter()
        .filter_map(|id| names.get(id).cloned())
        .collect();
    RecordResponse { record, opponents }
}

/// Copy the input onto `record` and check the fields a match note is
/// expected to carry. Returns the opponent names for the store to link.
fn apply_input(record: &mut Record, input: RecordInput) -> Result<Vec<String>, ApiError> {
    let scores: Vec<(u32, u32)> = input
        .score_sets
        .iter()
        .map(|s| (s.my_score, s.opponent_score))
        .collect();

    record.note_type = input.note_type;
    record.title = input.title;
    record.content = input.content;
    record.memo = input.memo;
    record.condition = input.condition;
    record.result = input.result;
    record.category = input.category;
    record.total_sets = input.total_sets;
    record.won_sets = input.won_sets;
    record.match_duration = input.match_duration;
    record.is_public = input.is_public;
    record.set_scores(&scores);

    record.opponent_ids.clear();
    let has_opponents = input.opponents.iter().any(|n| !n.trim().is_empty());
    let missing: Vec<&str> = record
        .missing_match_fields()
        .into_iter()
        .filter(|field| !(has_opponents && *field == "opponents"))
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "{} notes need: {}",
            record.note_type,
            missing.join(", ")
        )));
    }

    Ok(input.opponents)
}

pub async fn list_records(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<ListRecordsParams>,
) -> Result<Json<RecordListResponse>, ApiError> {
    let user = parse_user(&user_id)?;
    let note_type: Option<NoteType> = parse_filter(params.note_type.as_deref())?;
    let result: Option<MatchResult> = parse_filter(params.result.as_deref())?;

    let mut records = state.store.list_records(&user)?;
    if let Some(nt) = note_type {
        records.retain(|r| r.note_type == nt);
    }
    if let Some(res) = result {
        records.retain(|r| r.result == Some(res));
    }

    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, records.len() as u32);
    let names = opponent_names(&state, &user)?;

    let page = pagination
        .window(&records)
        .iter()
        .cloned()
        .map(|r| to_response(r, &names))
        .collect();

    Ok(Json(RecordListResponse {
        records: page,
        pagination: meta,
    }))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path((user_id, record_id)): Path<(String, String)>,
) -> Result<Json<RecordResponse>, ApiError> {
    let user = parse_user(&user_id)?;
    let record = state
        .store
        .get_record(&user, &RecordId::from(record_id.as_str()))?
        .ok_or_else(|| ApiError::NotFound(format!("record {}", record_id)))?;
    let names = opponent_names(&state, &user)?;
    Ok(Json(to_response(record, &names)))
}

pub async fn create_record(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<RecordInput>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let user = parse_user(&user_id)?;
    let Json(input) = payload?;

    let mut record = Record::new(user.clone(), input.note_type);
    let opponents = apply_input(&mut record, input)?;
    state.store.insert_record(&mut record, &opponents)?;

    let names = opponent_names(&state, &user)?;
    Ok((StatusCode::CREATED, Json(to_response(record, &names))))
}

pub async fn update_record(
    State(state): State<AppState>,
    Path((user_id, record_id)): Path<(String, String)>,
    payload: Result<Json<RecordInput>, JsonRejection>,
) -> Result<Json<RecordResponse>, ApiError> {
    let user = parse_user(&user_id)?;
    let Json(input) = payload?;

    let mut record = state
        .store
        .get_record(&user, &RecordId::from(record_id.as_str()))?
        .ok_or_else(|| ApiError::NotFound(format!("record {}", record_id)))?;
    // Replaced wholesale; totals are re-derived from the new scores
    record.total_sets = None;
    record.won_sets = None;
    let opponents = apply_input(&mut record, input)?;
    let saved = state.store.update_record(&mut record, &opponents)?;

    let names = opponent_names(&state, &user)?;
    Ok(Json(to_response(saved, &names)))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path((user_id, record_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let user = parse_user(&user_id)?;
    state
        .store
        .delete_record(&user, &RecordId::from(record_id.as_str()))?;
    Ok(StatusCode::NO_CONTENT)
}
