pub mod capture;
pub mod config;
pub mod core;
pub mod persistence;
pub mod recognition;
pub mod session;
pub mod stats;
pub mod store;
pub mod tasks;
pub mod translation;

pub use config::AppConfig;
pub use crate::core::{
    ManabiError,
    SessionSettings,
    StudyItem,
    StudySession,
    StudyTable,
    TableType,
};
pub use session::SessionManager;
pub use store::TableStore;
