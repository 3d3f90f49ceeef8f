pub mod errors;
pub mod models;

pub use errors::ManabiError;
pub use models::{
    BoundingBox,
    RecognizedItem,
    SessionSettings,
    StudyItem,
    StudySession,
    StudyTable,
    TableType,
};
