use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::StatsConfig;
use crate::models::NoteTypeInfo;
use crate::storage::{JsonlStore, RecordSource};

/// Cache key for the note-type master rows.
pub const NOTE_TYPES_KEY: &str = "note_types";

pub type NoteTypeCache = TtlCache<&'static str, Vec<NoteTypeInfo>>;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonlStore>,
    pub records: Arc<dyn RecordSource>,
    pub note_types: Arc<NoteTypeCache>,
    pub stats: StatsConfig,
}

impl AppState {
    pub fn new(store: JsonlStore, note_type_ttl: Duration, stats: StatsConfig) -> Self {
        Self::with_clock(store, note_type_ttl, stats, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: JsonlStore,
        note_type_ttl: Duration,
        stats: StatsConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(store);
        Self {
            records: store.clone(),
            store,
            note_types: Arc::new(TtlCache::new(note_type_ttl, clock)),
            stats,
        }
    }
}
