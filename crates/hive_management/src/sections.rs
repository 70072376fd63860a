use chrono::Utc;
use tracing::info;

use crate::error::{HiveManagementError, ServiceResult};
use crate::models::{
    HiveSection, HiveSectionListItem, HiveSectionRecord, RecordState, UpdateHiveSectionRequest,
    UserId,
};
use crate::store::Database;

/// Lifecycle manager for hive sections.
///
/// Mirrors [`crate::hives::HiveService`], additionally enforcing the parent
/// relationship: a section is created inside an existing hive and never
/// moves. Section codes are unique across all sections, regardless of
/// parent.
pub struct HiveSectionService<'a> {
    db: &'a Database,
}

impl<'a> HiveSectionService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Returns all sections as summaries, ordered by id ascending.
    pub fn list(&self) -> ServiceResult<Vec<HiveSectionListItem>> {
        let records = self.db.list_sections()?;
        Ok(records.iter().map(HiveSectionListItem::from).collect())
    }

    /// Returns the sections of one hive, ordered by id ascending.
    ///
    /// An unknown or empty parent yields an empty sequence; surfacing a 404
    /// for an unknown hive is the API layer's concern.
    pub fn list_by_hive(&self, hive_id: i64) -> ServiceResult<Vec<HiveSectionListItem>> {
        let records = self.db.list_sections_of_hive(hive_id)?;
        Ok(records.iter().map(HiveSectionListItem::from).collect())
    }

    /// Returns the full detail of one section.
    pub fn get(&self, id: i64) -> ServiceResult<HiveSection> {
        let record = self
            .db
            .get_section(id)?
            .ok_or(HiveManagementError::NotFound)?;
        Ok(HiveSection::from(&record))
    }

    /// Creates a new section inside the given hive.
    ///
    /// The code check runs before the parent-existence check, matching the
    /// update ordering. The parent reference comes from `hive_id`, never
    /// from the request.
    pub fn create(
        &self,
        actor: &UserId,
        hive_id: i64,
        request: &UpdateHiveSectionRequest,
    ) -> ServiceResult<HiveSection> {
        if self.db.section_code_in_use(&request.code, None)? {
            return Err(HiveManagementError::conflict_on("code"));
        }

        if self.db.get_hive(hive_id)?.is_none() {
            return Err(HiveManagementError::NotFound);
        }

        let now = Utc::now();
        let mut record = HiveSectionRecord {
            id: 0,
            hive_id,
            code: request.code.clone(),
            name: request.name.clone(),
            state: RecordState::Active,
            created_by: actor.clone(),
            created_at: now,
            last_updated_by: actor.clone(),
            last_updated_at: now,
        };
        record.id = self.db.insert_section(&record)?;

        info!(id = record.id, hive_id, code = %record.code, "Created hive section");
        Ok(HiveSection::from(&record))
    }

    /// Overwrites the mutable fields of an existing section.
    ///
    /// The parent reference, identifier, state, and creation audit fields
    /// are preserved.
    pub fn update(
        &self,
        actor: &UserId,
        id: i64,
        request: &UpdateHiveSectionRequest,
    ) -> ServiceResult<HiveSection> {
        if self.db.section_code_in_use(&request.code, Some(id))? {
            return Err(HiveManagementError::conflict_on("code"));
        }

        let current = self
            .db
            .get_section(id)?
            .ok_or(HiveManagementError::NotFound)?;

        let updated = HiveSectionRecord {
            code: request.code.clone(),
            name: request.name.clone(),
            last_updated_by: actor.clone(),
            last_updated_at: Utc::now(),
            ..current
        };
        self.db.update_section(&updated)?;

        Ok(HiveSection::from(&updated))
    }

    /// Permanently removes a section. Only valid once it has been
    /// soft-deleted.
    pub fn delete(&self, id: i64) -> ServiceResult<()> {
        let current = self
            .db
            .get_section(id)?
            .ok_or(HiveManagementError::NotFound)?;

        match current.state {
            RecordState::Active => Err(HiveManagementError::conflict()),
            RecordState::SoftDeleted => {
                self.db.delete_section(id)?;
                info!(id, code = %current.code, "Purged hive section");
                Ok(())
            }
        }
    }

    /// Soft-deletes or restores a section.
    ///
    /// Setting the current state again is a no-op: no write, no audit stamp.
    pub fn set_status(&self, actor: &UserId, id: i64, deleted: bool) -> ServiceResult<()> {
        let current = self
            .db
            .get_section(id)?
            .ok_or(HiveManagementError::NotFound)?;

        let target = RecordState::from_flag(deleted);
        if current.state == target {
            return Ok(());
        }

        let updated = HiveSectionRecord {
            state: target,
            last_updated_by: actor.clone(),
            last_updated_at: Utc::now(),
            ..current
        };
        self.db.update_section(&updated)?;
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::hives::HiveService;
    use crate::models::UpdateHiveRequest;
    use rusqlite::params;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to open in-memory database")
    }

    fn actor(name: &str) -> UserId {
        UserId::new(name)
    }

    fn add_hive(db: &Database, code: &str) -> i64 {
        HiveService::new(db)
            .create(
                &actor("alice"),
                &UpdateHiveRequest {
                    code: code.into(),
                    name: format!("Hive {code}"),
                    display_name: code.into(),
                    address: "1 Storage Way".into(),
                },
            )
            .unwrap()
            .id
    }

    fn request(code: &str, name: &str) -> UpdateHiveSectionRequest {
        UpdateHiveSectionRequest {
            code: code.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_create_assigns_parent_from_parameter() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        let service = HiveSectionService::new(&db);

        let section = service
            .create(&actor("alice"), hive_id, &request("S1", "Aisle 1"))
            .unwrap();
        assert!(section.id > 0);
        assert_eq!(section.hive_id, hive_id);
        assert!(!section.is_deleted);
        assert_eq!(section.created_by, actor("alice"));
    }

    #[test]
    fn test_create_in_unknown_hive_is_not_found() {
        let db = test_db();
        let service = HiveSectionService::new(&db);

        let err = service
            .create(&actor("alice"), 999, &request("S1", "Aisle 1"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn test_create_duplicate_code_conflicts_across_parents() {
        let db = test_db();
        let h1 = add_hive(&db, "H1");
        let h2 = add_hive(&db, "H2");
        let service = HiveSectionService::new(&db);
        service.create(&actor("alice"), h1, &request("S1", "Aisle 1")).unwrap();

        // Codes are unique whole-table, not per parent hive.
        let err = service
            .create(&actor("alice"), h2, &request("S1", "Other Aisle"))
            .unwrap_err();
        assert!(matches!(
            err,
            HiveManagementError::Conflict { field: Some("code") }
        ));
    }

    #[test]
    fn test_code_conflict_reported_before_unknown_parent() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        let service = HiveSectionService::new(&db);
        service.create(&actor("alice"), hive_id, &request("S1", "Aisle 1")).unwrap();

        let err = service
            .create(&actor("alice"), 999, &request("S1", "Ghost"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_list_by_hive_scopes_to_parent() {
        let db = test_db();
        let h1 = add_hive(&db, "H1");
        let h2 = add_hive(&db, "H2");
        let service = HiveSectionService::new(&db);
        service.create(&actor("alice"), h1, &request("S1", "A")).unwrap();
        service.create(&actor("alice"), h2, &request("S2", "B")).unwrap();
        service.create(&actor("alice"), h1, &request("S3", "C")).unwrap();

        let sections = service.list_by_hive(h1).unwrap();
        let codes: Vec<&str> = sections.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["S1", "S3"]);
    }

    #[test]
    fn test_list_by_hive_unknown_parent_is_empty() {
        let db = test_db();
        let service = HiveSectionService::new(&db);
        assert!(service.list_by_hive(999).unwrap().is_empty());
    }

    #[test]
    fn test_list_orders_by_id_ascending() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        // Insert with explicit out-of-order identifiers.
        for id in [3, 1, 2] {
            db.conn()
                .execute(
                    "INSERT INTO hive_sections (id, hive_id, code, name, is_deleted,
                                                created_by, created_at, last_updated_by, last_updated_at)
                     VALUES (?1, ?2, ?3, ?4, 0, 'alice', '2024-01-01T00:00:00Z',
                             'alice', '2024-01-01T00:00:00Z')",
                    params![id, hive_id, format!("S{id}"), format!("Section {id}")],
                )
                .unwrap();
        }

        let service = HiveSectionService::new(&db);
        let ids: Vec<i64> = service.list().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_update_preserves_parent_and_creation_audit() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        let service = HiveSectionService::new(&db);
        let created = service
            .create(&actor("alice"), hive_id, &request("S1", "Aisle 1"))
            .unwrap();

        let updated = service
            .update(&actor("bob"), created.id, &request("S1-R", "Renamed"))
            .unwrap();
        assert_eq!(updated.hive_id, hive_id);
        assert_eq!(updated.code, "S1-R");
        assert_eq!(updated.created_by, actor("alice"));
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.last_updated_by, actor("bob"));
    }

    #[test]
    fn test_update_duplicate_code_conflicts() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        let service = HiveSectionService::new(&db);
        service.create(&actor("alice"), hive_id, &request("S1", "A")).unwrap();
        let second = service.create(&actor("alice"), hive_id, &request("S2", "B")).unwrap();

        let err = service
            .update(&actor("alice"), second.id, &request("S1", "B"))
            .unwrap_err();
        assert!(matches!(
            err,
            HiveManagementError::Conflict { field: Some("code") }
        ));
        assert_eq!(service.get(second.id).unwrap().code, "S2");
    }

    #[test]
    fn test_update_keeping_own_code_is_allowed() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        let service = HiveSectionService::new(&db);
        let created = service
            .create(&actor("alice"), hive_id, &request("S1", "Aisle 1"))
            .unwrap();

        let updated = service
            .update(&actor("alice"), created.id, &request("S1", "Renamed"))
            .unwrap();
        assert_eq!(updated.name, "Renamed");
    }

    #[test]
    fn test_update_missing_record_is_not_found() {
        let db = test_db();
        let service = HiveSectionService::new(&db);
        let err = service
            .update(&actor("alice"), 999, &request("S9", "Ghost"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_requires_prior_soft_delete() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        let service = HiveSectionService::new(&db);
        let created = service
            .create(&actor("alice"), hive_id, &request("S1", "Aisle 1"))
            .unwrap();

        let err = service.delete(created.id).unwrap_err();
        assert!(matches!(err, HiveManagementError::Conflict { field: None }));

        service.set_status(&actor("alice"), created.id, true).unwrap();
        service.delete(created.id).unwrap();
        assert_eq!(service.get(created.id).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_delete_missing_record_is_not_found() {
        let db = test_db();
        let service = HiveSectionService::new(&db);
        let err = service.delete(42).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_set_status_is_idempotent() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        let service = HiveSectionService::new(&db);
        let created = service
            .create(&actor("alice"), hive_id, &request("S1", "Aisle 1"))
            .unwrap();

        service.set_status(&actor("bob"), created.id, true).unwrap();
        let first = service.get(created.id).unwrap();
        assert!(first.is_deleted);
        assert_eq!(first.last_updated_by, actor("bob"));

        service.set_status(&actor("carol"), created.id, true).unwrap();
        let second = service.get(created.id).unwrap();
        assert_eq!(second.last_updated_by, actor("bob"));
        assert_eq!(second.last_updated_at, first.last_updated_at);
    }

    #[test]
    fn test_set_status_restore() {
        let db = test_db();
        let hive_id = add_hive(&db, "H1");
        let service = HiveSectionService::new(&db);
        let created = service
            .create(&actor("alice"), hive_id, &request("S1", "Aisle 1"))
            .unwrap();

        service.set_status(&actor("alice"), created.id, true).unwrap();
        service.set_status(&actor("alice"), created.id, false).unwrap();
        assert!(!service.get(created.id).unwrap().is_deleted);
    }

    #[test]
    fn test_set_status_missing_record_is_not_found() {
        let db = test_db();
        let service = HiveSectionService::new(&db);
        let err = service.set_status(&actor("alice"), 42, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
