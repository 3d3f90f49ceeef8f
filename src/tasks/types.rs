use crate::capture::EditableEntry;

#[derive(Debug, Clone)]
pub enum TaskResult {
    LoadingMessage(String),
    CaptureProcessed(Result<Vec<EditableEntry>, String>),
    StoreSaved(Result<(), String>),
}

impl TaskResult {
    pub fn task_type(&self) -> &'static str {
        match self {
            TaskResult::LoadingMessage(_) => "loading_message",
            TaskResult::CaptureProcessed(_) => "capture_processed",
            TaskResult::StoreSaved(_) => "store_saved",
        }
    }
}
