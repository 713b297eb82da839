use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::debug;

use crate::api::state::{AppState, NOTE_TYPES_KEY};
use crate::api::ApiError;
use crate::models::NoteTypeInfo;

#[derive(Debug, Serialize)]
pub struct NoteTypesResponse {
    pub note_types: Vec<NoteTypeInfo>,
}

/// Note-type master rows, served from the TTL cache.
pub async fn list_note_types(
    State(state): State<AppState>,
) -> Result<Json<NoteTypesResponse>, ApiError> {
    let note_types = state
        .note_types
        .get_or_try_insert_with(NOTE_TYPES_KEY, || {
            debug!("Loading note types from master data");
            state.store.note_types()
        })?;

    Ok(Json(NoteTypesResponse { note_types }))
}
