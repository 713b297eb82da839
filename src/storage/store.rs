//! Owner-scoped record store on top of the JSONL files.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::{master_entity_path, EntityType, JsonlReader, JsonlWriter, StorageConfig, StorageError};
use crate::calculate::compare_names;
use crate::models::{
    NoteTemplate, NoteTypeInfo, Opponent, OpponentId, Record, RecordId, RecordView, TemplateId,
    UserId,
};

/// Read side consumed by the statistics endpoints.
///
/// Both queries return complete result sets, newest first.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Every record of `user` that has a result.
    async fn records_with_result(&self, user: &UserId) -> Result<Vec<RecordView>, StorageError>;

    /// Every record of `user` with a result that links the opponent named
    /// exactly `opponent`.
    async fn records_against(
        &self,
        user: &UserId,
        opponent: &str,
    ) -> Result<Vec<RecordView>, StorageError>;
}

/// File-backed store. Writes are serialized through one lock; reads go
/// straight to disk.
pub struct JsonlStore {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<T: serde::de::DeserializeOwned>(
        &self,
        entity: EntityType,
        user: &UserId,
    ) -> Result<Vec<T>, StorageError> {
        JsonlReader::for_user(&self.config, entity, user).read_all()
    }

    fn write<T: serde::Serialize>(
        &self,
        entity: EntityType,
        user: &UserId,
        items: &[T],
    ) -> Result<usize, StorageError> {
        JsonlWriter::for_user(&self.config, entity, user).write_all(items)
    }

    // ── Records ─────────────────────────────────────────────────────

    /// All of a user's records, newest first.
    pub fn list_records(&self, user: &UserId) -> Result<Vec<Record>, StorageError> {
        let mut records: Vec<Record> = self.read(EntityType::Record, user)?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub fn get_record(&self, user: &UserId, id: &RecordId) -> Result<Option<Record>, StorageError> {
        Ok(self.list_records(user)?.into_iter().find(|r| &r.id == id))
    }

    /// Link `names` onto `record`, building opponents for names the owner
    /// doesn't have yet. Every link must then point at a known opponent.
    /// Returns the new opponents, not yet written. Caller holds the lock.
    fn link_names(
        &self,
        record: &mut Record,
        names: &[String],
    ) -> Result<Vec<Opponent>, StorageError> {
        let mut known: Vec<Opponent> = self.read(EntityType::Opponent, &record.user_id)?;
        let mut created = Vec::new();

        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let id = match known.iter().find(|o| o.name == name) {
                Some(existing) => existing.id.clone(),
                None => {
                    let opponent = Opponent::new(record.user_id.clone(), name);
                    known.push(opponent.clone());
                    let id = opponent.id.clone();
                    created.push(opponent);
                    id
                }
            };
            if !record.opponent_ids.contains(&id) {
                record.opponent_ids.push(id);
            }
        }

        match record
            .opponent_ids
            .iter()
            .find(|id| !known.iter().any(|o| &o.id == *id))
        {
            Some(missing) => Err(StorageError::NotFound(format!("opponent {}", missing))),
            None => Ok(created),
        }
    }

    fn append_opponents(&self, user: &UserId, opponents: &[Opponent]) -> Result<(), StorageError> {
        let writer = JsonlWriter::for_user(&self.config, EntityType::Opponent, user);
        for opponent in opponents {
            writer.append(opponent)?;
            info!(user = %user, opponent = %opponent.name, "Created opponent");
        }
        Ok(())
    }

    /// Insert a record linked to its current opponent ids plus `opponent_names`.
    /// Unknown names become new opponents in the same locked write.
    pub fn insert_record(
        &self,
        record: &mut Record,
        opponent_names: &[String],
    ) -> Result<(), StorageError> {
        let _guard = self.lock();
        let created = self.link_names(record, opponent_names)?;
        self.append_opponents(&record.user_id, &created)?;
        JsonlWriter::for_user(&self.config, EntityType::Record, &record.user_id).append(&*record)?;
        info!(user = %record.user_id, record = %record.id, "Created record");
        Ok(())
    }

    /// Replace a stored record, bumping its `updated_at`. Opponent names are
    /// linked as in [`insert_record`](Self::insert_record).
    pub fn update_record(
        &self,
        record: &mut Record,
        opponent_names: &[String],
    ) -> Result<Record, StorageError> {
        let _guard = self.lock();
        let mut records: Vec<Record> = self.read(EntityType::Record, &record.user_id)?;
        let slot = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| StorageError::NotFound(format!("record {}", record.id)))?;

        let created = self.link_names(record, opponent_names)?;
        self.append_opponents(&record.user_id, &created)?;

        let mut updated = record.clone();
        updated.created_at = slot.created_at;
        updated.updated_at = Utc::now();
        *slot = updated.clone();

        self.write(EntityType::Record, &record.user_id, &records)?;
        info!(user = %record.user_id, record = %record.id, "Updated record");
        Ok(updated)
    }

    /// Delete a record together with its score sets and opponent links.
    pub fn delete_record(&self, user: &UserId, id: &RecordId) -> Result<(), StorageError> {
        let _guard = self.lock();
        let mut records: Vec<Record> = self.read(EntityType::Record, user)?;
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(StorageError::NotFound(format!("record {}", id)));
        }

        self.write(EntityType::Record, user, &records)?;
        info!(user = %user, record = %id, "Deleted record");
        Ok(())
    }

    // ── Opponents ───────────────────────────────────────────────────

    /// A user's opponents sorted by name.
    pub fn list_opponents(&self, user: &UserId) -> Result<Vec<Opponent>, StorageError> {
        let mut opponents: Vec<Opponent> = self.read(EntityType::Opponent, user)?;
        opponents.sort_by(|a, b| compare_names(&a.name, &b.name));
        Ok(opponents)
    }

    pub fn find_opponent(
        &self,
        user: &UserId,
        name: &str,
    ) -> Result<Option<Opponent>, StorageError> {
        let name = name.trim();
        Ok(self.list_opponents(user)?.into_iter().find(|o| o.name == name))
    }

    pub fn create_opponent(&self, user: &UserId, name: &str) -> Result<Opponent, StorageError> {
        let _guard = self.lock();
        if self.find_opponent(user, name)?.is_some() {
            return Err(StorageError::Duplicate(format!("opponent {:?}", name.trim())));
        }

        let opponent = Opponent::new(user.clone(), name);
        JsonlWriter::for_user(&self.config, EntityType::Opponent, user).append(&opponent)?;
        info!(user = %user, opponent = %opponent.name, "Created opponent");
        Ok(opponent)
    }

    /// Rename an opponent. The id is kept; the new name must be free.
    pub fn rename_opponent(
        &self,
        user: &UserId,
        id: &OpponentId,
        name: &str,
    ) -> Result<Opponent, StorageError> {
        let _guard = self.lock();
        let name = name.trim();
        let mut opponents: Vec<Opponent> = self.read(EntityType::Opponent, user)?;

        if opponents.iter().any(|o| o.name == name && &o.id != id) {
            return Err(StorageError::Duplicate(format!("opponent {:?}", name)));
        }
        let opponent = opponents
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("opponent {}", id)))?;
        opponent.name = name.to_string();
        let renamed = opponent.clone();

        self.write(EntityType::Opponent, user, &opponents)?;
        info!(user = %user, opponent = %id, "Renamed opponent");
        Ok(renamed)
    }

    /// Delete an opponent and unlink it from every record. Returns the
    /// number of records that lost the link.
    pub fn delete_opponent(&self, user: &UserId, id: &OpponentId) -> Result<usize, StorageError> {
        let _guard = self.lock();
        let mut opponents: Vec<Opponent> = self.read(EntityType::Opponent, user)?;
        let before = opponents.len();
        opponents.retain(|o| &o.id != id);
        if opponents.len() == before {
            return Err(StorageError::NotFound(format!("opponent {}", id)));
        }

        let mut records: Vec<Record> = self.read(EntityType::Record, user)?;
        let mut unlinked = 0;
        for record in records.iter_mut() {
            let links = record.opponent_ids.len();
            record.opponent_ids.retain(|o| o != id);
            if record.opponent_ids.len() != links {
                unlinked += 1;
            }
        }

        if unlinked > 0 {
            self.write(EntityType::Record, user, &records)?;
        }
        self.write(EntityType::Opponent, user, &opponents)?;
        info!(user = %user, opponent = %id, unlinked, "Deleted opponent");
        Ok(unlinked)
    }

    // ── Templates ───────────────────────────────────────────────────

    pub fn list_templates(&self, user: &UserId) -> Result<Vec<NoteTemplate>, StorageError> {
        let mut templates: Vec<NoteTemplate> = self.read(EntityType::Template, user)?;
        templates.sort_by(|a, b| compare_names(&a.name, &b.name));
        Ok(templates)
    }

    pub fn insert_template(&self, template: &NoteTemplate) -> Result<(), StorageError> {
        let _guard = self.lock();
        JsonlWriter::for_user(&self.config, EntityType::Template, &template.user_id)
            .append(template)?;
        info!(user = %template.user_id, template = %template.id, "Created template");
        Ok(())
    }

    pub fn delete_template(&self, user: &UserId, id: &TemplateId) -> Result<(), StorageError> {
        let _guard = self.lock();
        let mut templates: Vec<NoteTemplate> = self.read(EntityType::Template, user)?;
        let before = templates.len();
        templates.retain(|t| &t.id != id);
        if templates.len() == before {
            return Err(StorageError::NotFound(format!("template {}", id)));
        }
        self.write(EntityType::Template, user, &templates)?;
        Ok(())
    }

    // ── Master data ─────────────────────────────────────────────────

    /// Note-type master rows by sort order. Falls back to the built-in rows
    /// when the master file is missing or empty.
    pub fn note_types(&self) -> Result<Vec<NoteTypeInfo>, StorageError> {
        let mut rows: Vec<NoteTypeInfo> =
            JsonlReader::new(master_entity_path(&self.config, EntityType::NoteType)).read_all()?;
        if rows.is_empty() {
            return Ok(NoteTypeInfo::defaults());
        }
        rows.sort_by_key(|r| r.sort_order);
        Ok(rows)
    }

    /// Write the built-in note types to the master file. Existing rows are
    /// kept unless `overwrite` is set. Returns the number of rows written.
    ///
    /// A running server keeps serving its cached rows until the note-type TTL
    /// passes or the cache entry is expired.
    pub fn seed_note_types(&self, overwrite: bool) -> Result<usize, StorageError> {
        let _guard = self.lock();
        let path = master_entity_path(&self.config, EntityType::NoteType);
        let reader: JsonlReader<NoteTypeInfo> = JsonlReader::new(path.clone());
        if !overwrite && reader.count()? > 0 {
            return Ok(0);
        }
        let written = JsonlWriter::new(path).write_all(&NoteTypeInfo::defaults())?;
        info!(rows = written, "Seeded note types");
        Ok(written)
    }

    // ── Views ───────────────────────────────────────────────────────

    fn views(&self, user: &UserId) -> Result<Vec<RecordView>, StorageError> {
        let names: HashMap<OpponentId, String> = self
            .read::<Opponent>(EntityType::Opponent, user)?
            .into_iter()
            .map(|o| (o.id, o.name))
            .collect();

        Ok(self
            .list_records(user)?
            .iter()
            .filter_map(|r| RecordView::from_record(r, &names))
            .collect())
    }
}

#[async_trait]
impl RecordSource for JsonlStore {
    async fn records_with_result(&self, user: &UserId) -> Result<Vec<RecordView>, StorageError> {
        self.views(user)
    }

    async fn records_against(
        &self,
        user: &UserId,
        opponent: &str,
    ) -> Result<Vec<RecordView>, StorageError> {
        let mut views = self.views(user)?;
        views.retain(|v| v.involves(opponent));
        Ok(views)
    }
}
