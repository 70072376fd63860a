pub mod config;
pub mod error;
pub mod hives;
pub mod logging;
pub mod models;
pub mod sections;
pub mod store;

pub use config::AppConfig;
pub use error::{ErrorKind, HiveManagementError, ServiceResult};
pub use hives::HiveService;
pub use models::{
    Hive, HiveListItem, HiveRecord, HiveSection, HiveSectionListItem, HiveSectionRecord,
    RecordState, UpdateHiveRequest, UpdateHiveSectionRequest, UserId,
};
pub use sections::HiveSectionService;
pub use store::Database;
