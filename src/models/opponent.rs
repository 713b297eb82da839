//! Opponents and note templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, NoteType, OpponentId, TemplateId, UserId};

/// A named adversary, scoped to its owner. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    pub id: OpponentId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Opponent {
    /// Create an opponent with a fresh id and the trimmed name.
    pub fn new(user_id: UserId, name: &str) -> Self {
        Self {
            id: OpponentId::random(),
            user_id,
            name: name.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// A preset used to pre-fill new notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteTemplate {
    pub id: TemplateId,
    pub user_id: UserId,
    pub name: String,
    pub note_type: NoteType,
    pub category: Option<Category>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NoteTemplate {
    pub fn new(user_id: UserId, name: String, note_type: NoteType) -> Self {
        Self {
            id: TemplateId::random(),
            user_id,
            name,
            note_type,
            category: None,
            title: None,
            content: None,
            created_at: Utc::now(),
        }
    }
}

/// Master-table entry describing a note type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteTypeInfo {
    pub kind: NoteType,
    pub name: String,
    pub description: String,
    pub sort_order: u32,
}

impl NoteTypeInfo {
    /// The built-in master rows.
    pub fn defaults() -> Vec<NoteTypeInfo> {
        NoteType::ALL
            .iter()
            .enumerate()
            .map(|(i, kind)| NoteTypeInfo {
                kind: *kind,
                name: kind.label().to_string(),
                description: match kind {
                    NoteType::Practice => "Drills and basic practice",
                    NoteType::GamePractice => "Practice games with a score",
                    NoteType::OfficialMatch => "Tournament and league matches",
                }
                .to_string(),
                sort_order: i as u32 + 1,
            })
            .collect()
    }
}
