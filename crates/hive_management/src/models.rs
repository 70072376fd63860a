use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Record state
// ---------------------------------------------------------------------------

/// Lifecycle state of a persisted record.
///
/// Deletion is two-phase: an `Active` record is first soft-deleted
/// (`SoftDeleted`), and only a soft-deleted record may be purged from the
/// store. Stored as the `is_deleted` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordState {
    Active,
    SoftDeleted,
}

impl RecordState {
    /// Converts the stored `is_deleted` flag into a state.
    pub fn from_flag(deleted: bool) -> Self {
        if deleted {
            Self::SoftDeleted
        } else {
            Self::Active
        }
    }

    /// Returns `true` for `SoftDeleted`.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::SoftDeleted)
    }
}

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

/// Opaque identifier of the acting caller, used for audit stamping.
///
/// Passed explicitly into every mutating operation; the services hold no
/// ambient identity state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// A hive row as persisted in the store.
#[derive(Debug, Clone)]
pub struct HiveRecord {
    /// Assigned by the store on insert; `0` for not-yet-persisted records.
    pub id: i64,
    /// Unique business key (whole-table scope).
    pub code: String,
    pub name: String,
    pub display_name: String,
    pub address: String,
    pub state: RecordState,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub last_updated_by: UserId,
    pub last_updated_at: DateTime<Utc>,
}

/// A hive section row as persisted in the store.
#[derive(Debug, Clone)]
pub struct HiveSectionRecord {
    pub id: i64,
    /// Owning hive. Immutable after creation — sections cannot move.
    pub hive_id: i64,
    /// Unique business key across all sections, regardless of parent.
    pub code: String,
    pub name: String,
    pub state: RecordState,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub last_updated_by: UserId,
    pub last_updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Projections — JSON shapes consumed by the admin web client.
// Field names use camelCase in JSON to match the client's models.
// ---------------------------------------------------------------------------

/// Summary row returned by the hive list operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveListItem {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub is_deleted: bool,
    /// Number of sections currently belonging to this hive.
    pub hive_section_count: usize,
}

impl HiveListItem {
    /// Projects a record plus its live section count into a summary.
    pub fn project(record: &HiveRecord, section_count: usize) -> Self {
        Self {
            id: record.id,
            code: record.code.clone(),
            name: record.name.clone(),
            is_deleted: record.state.is_deleted(),
            hive_section_count: section_count,
        }
    }
}

/// Full hive detail, including audit fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hive {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub display_name: String,
    pub address: String,
    pub is_deleted: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub last_updated_by: UserId,
    pub last_updated_at: DateTime<Utc>,
}

impl From<&HiveRecord> for Hive {
    fn from(record: &HiveRecord) -> Self {
        Self {
            id: record.id,
            code: record.code.clone(),
            name: record.name.clone(),
            display_name: record.display_name.clone(),
            address: record.address.clone(),
            is_deleted: record.state.is_deleted(),
            created_by: record.created_by.clone(),
            created_at: record.created_at,
            last_updated_by: record.last_updated_by.clone(),
            last_updated_at: record.last_updated_at,
        }
    }
}

/// Summary row returned by the section list operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveSectionListItem {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub is_deleted: bool,
}

impl From<&HiveSectionRecord> for HiveSectionListItem {
    fn from(record: &HiveSectionRecord) -> Self {
        Self {
            id: record.id,
            code: record.code.clone(),
            name: record.name.clone(),
            is_deleted: record.state.is_deleted(),
        }
    }
}

/// Full section detail, including the parent reference and audit fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveSection {
    pub id: i64,
    pub hive_id: i64,
    pub code: String,
    pub name: String,
    pub is_deleted: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub last_updated_by: UserId,
    pub last_updated_at: DateTime<Utc>,
}

impl From<&HiveSectionRecord> for HiveSection {
    fn from(record: &HiveSectionRecord) -> Self {
        Self {
            id: record.id,
            hive_id: record.hive_id,
            code: record.code.clone(),
            name: record.name.clone(),
            is_deleted: record.state.is_deleted(),
            created_by: record.created_by.clone(),
            created_at: record.created_at,
            last_updated_by: record.last_updated_by.clone(),
            last_updated_at: record.last_updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests — one shape serves both create and update.
// ---------------------------------------------------------------------------

/// Caller-supplied fields for creating or updating a hive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHiveRequest {
    pub code: String,
    pub name: String,
    pub display_name: String,
    pub address: String,
}

/// Caller-supplied fields for creating or updating a hive section.
/// The parent hive is never taken from the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHiveSectionRequest {
    pub code: String,
    pub name: String,
}

// ===========================================================================
// Tests
// ===========================================================================
