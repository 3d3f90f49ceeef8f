use std::{
    sync::{
        mpsc,
        Arc,
        Mutex,
    },
    thread,
};

use tokio::runtime::Runtime;

use super::{
    TaskHandle,
    TaskResult,
};
use crate::{
    capture::{
        process_capture,
        CancelToken,
    },
    recognition::TextRecognizer,
    store::TableStore,
    translation::{
        TranslationService,
        Translator,
    },
};

/// Runs gateway work off the UI thread. Workers push `TaskResult`s
/// into a channel the presentation layer polls each frame.
pub struct TaskManager {
    runtime: Arc<Runtime>,
    receiver: mpsc::Receiver<TaskResult>,
    sender: mpsc::Sender<TaskResult>,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskManager {
    pub fn new() -> Self {
        let runtime = Arc::new(Runtime::new().expect("Failed to create TaskManager runtime"));
        let (sender, receiver) = mpsc::channel();

        Self { runtime, receiver, sender }
    }

    pub fn poll_results(&mut self) -> Vec<TaskResult> {
        let mut results = Vec::new();

        while let Ok(result) = self.receiver.try_recv() {
            results.push(result);
        }

        results
    }

    fn task_context(&self) -> (mpsc::Sender<TaskResult>, Arc<Runtime>) {
        (self.sender.clone(), self.runtime.clone())
    }

    /// Recognize + translate a batch of captured images. The returned
    /// handle cancels the run; a cancelled run reports `Cancelled` and
    /// its entries are discarded.
    pub fn process_capture<R, T>(
        &self,
        recognizer: Arc<R>,
        translation: Arc<TranslationService<T>>,
        images: Vec<Vec<u8>>,
    ) -> TaskHandle
    where
        R: TextRecognizer + Send + Sync + 'static,
        T: Translator + Send + Sync + 'static,
    {
        let (sender, runtime) = self.task_context();
        let cancel = CancelToken::new();
        let cancel_for_task = cancel.clone();

        let join_handle = thread::spawn(move || {
            let _ = sender.send(TaskResult::LoadingMessage("Recognizing text...".to_string()));

            let result = runtime.block_on(async {
                process_capture(recognizer.as_ref(), translation.as_ref(), &images, &cancel_for_task)
                    .await
                    .map_err(|e| e.to_string())
            });

            let _ = sender.send(TaskResult::CaptureProcessed(result));
        });

        TaskHandle::new(cancel, join_handle)
    }

    pub fn save_store(&self, store: Arc<Mutex<TableStore>>) {
        let (sender, _) = self.task_context();

        thread::spawn(move || {
            let result = match store.lock() {
                Ok(mut store) => store.save_if_dirty().map_err(|e| e.to_string()),
                Err(_) => Err("Store lock poisoned".to_string()),
            };

            let _ = sender.send(TaskResult::StoreSaved(result));
        });
    }
}
