use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{parse_user, ApiError};
use crate::models::{Category, NoteTemplate, NoteType, TemplateId};

#[derive(Debug, Deserialize)]
pub struct TemplateInput {
    pub name: String,
    pub note_type: NoteType,
    pub category: Option<Category>,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<NoteTemplate>,
}

pub async fn list_templates(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<TemplatesResponse>, ApiError> {
    let user = parse_user(&user_id)?;
    Ok(Json(TemplatesResponse {
        templates: state.store.list_templates(&user)?,
    }))
}

pub async fn create_template(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<TemplateInput>, JsonRejection>,
) -> Result<(StatusCode, Json<NoteTemplate>), ApiError> {
    let user = parse_user(&user_id)?;
    let Json(input) = payload?;

    let name = input.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("template name must not be blank".to_string()));
    }

    let mut template = NoteTemplate::new(user, name.to_string(), input.note_type);
    template.category = input.category;
    template.title = input.title;
    template.content = input.content;

    state.store.insert_template(&template)?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path((user_id, template_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let user = parse_user(&user_id)?;
    state
        .store
        .delete_template(&user, &TemplateId::from(template_id.as_str()))?;
    Ok(StatusCode::NO_CONTENT)
}
