use chrono::Utc;
use tracing::info;

use crate::error::{HiveManagementError, ServiceResult};
use crate::models::{Hive, HiveListItem, HiveRecord, RecordState, UpdateHiveRequest, UserId};
use crate::store::Database;

/// Lifecycle manager for top-level hives.
///
/// Stateless per call: every operation re-reads current state from the store
/// before acting and issues at most one write. The acting caller is passed
/// explicitly for audit stamping.
pub struct HiveService<'a> {
    db: &'a Database,
}

impl<'a> HiveService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Returns all hives as summaries, ordered by id ascending.
    pub fn list(&self) -> ServiceResult<Vec<HiveListItem>> {
        let rows = self.db.list_hives()?;
        Ok(rows
            .iter()
            .map(|(record, count)| HiveListItem::project(record, *count))
            .collect())
    }

    /// Returns the full detail of one hive.
    pub fn get(&self, id: i64) -> ServiceResult<Hive> {
        let record = self
            .db
            .get_hive(id)?
            .ok_or(HiveManagementError::NotFound)?;
        Ok(Hive::from(&record))
    }

    /// Creates a new hive and returns its detail with the assigned id.
    ///
    /// The code must not be in use by any existing hive.
    pub fn create(&self, actor: &UserId, request: &UpdateHiveRequest) -> ServiceResult<Hive> {
        if self.db.hive_code_in_use(&request.code, None)? {
            return Err(HiveManagementError::conflict_on("code"));
        }

        let now = Utc::now();
        let mut record = HiveRecord {
            id: 0,
            code: request.code.clone(),
            name: request.name.clone(),
            display_name: request.display_name.clone(),
            address: request.address.clone(),
            state: RecordState::Active,
            created_by: actor.clone(),
            created_at: now,
            last_updated_by: actor.clone(),
            last_updated_at: now,
        };
        record.id = self.db.insert_hive(&record)?;

        info!(id = record.id, code = %record.code, "Created hive");
        Ok(Hive::from(&record))
    }

    /// Overwrites the mutable fields of an existing hive.
    ///
    /// The code check runs before the existence check: renaming a vanished
    /// hive to a colliding code reports Conflict, not NotFound. Identifier,
    /// state, and creation audit fields are preserved.
    pub fn update(
        &self,
        actor: &UserId,
        id: i64,
        request: &UpdateHiveRequest,
    ) -> ServiceResult<Hive> {
        if self.db.hive_code_in_use(&request.code, Some(id))? {
            return Err(HiveManagementError::conflict_on("code"));
        }

        let current = self
            .db
            .get_hive(id)?
            .ok_or(HiveManagementError::NotFound)?;

        let updated = HiveRecord {
            code: request.code.clone(),
            name: request.name.clone(),
            display_name: request.display_name.clone(),
            address: request.address.clone(),
            last_updated_by: actor.clone(),
            last_updated_at: Utc::now(),
            ..current
        };
        self.db.update_hive(&updated)?;

        Ok(Hive::from(&updated))
    }

    /// Permanently removes a hive. Only valid once it has been soft-deleted.
    pub fn delete(&self, id: i64) -> ServiceResult<()> {
        let current = self
            .db
            .get_hive(id)?
            .ok_or(HiveManagementError::NotFound)?;

        match current.state {
            RecordState::Active => Err(HiveManagementError::conflict()),
            RecordState::SoftDeleted => {
                self.db.delete_hive(id)?;
                info!(id, code = %current.code, "Purged hive");
                Ok(())
            }
        }
    }

    /// Soft-deletes or restores a hive.
    ///
    /// Setting the current state again is a no-op: no write, no audit stamp.
    pub fn set_status(&self, actor: &UserId, id: i64, deleted: bool) -> ServiceResult<()> {
        let current = self
            .db
            .get_hive(id)?
            .ok_or(HiveManagementError::NotFound)?;

        let target = RecordState::from_flag(deleted);
        if current.state == target {
            return Ok(());
        }

        let updated = HiveRecord {
            state: target,
            last_updated_by: actor.clone(),
            last_updated_at: Utc::now(),
            ..current
        };
        self.db.update_hive(&updated)?;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
