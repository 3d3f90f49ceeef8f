use std::sync::{
    atomic::{
        AtomicBool,
        Ordering,
    },
    Arc,
};

use uuid::Uuid;

use crate::{
    core::{
        ManabiError,
        RecognizedItem,
        TableType,
    },
    recognition::{
        recognize_images,
        TextRecognizer,
    },
    store::TableStore,
    translation::{
        TranslationService,
        Translator,
    },
};

/// One row of the review/edit step. Defaults to included; the user may
/// toggle inclusion and edit both fields before commit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableEntry {
    pub source: String,
    pub target: String,
    pub included: bool,
}

impl From<&RecognizedItem> for EditableEntry {
    fn from(item: &RecognizedItem) -> Self {
        Self {
            source: item.text.clone(),
            target: item.translation.clone(),
            included: item.selected,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CommitTarget {
    Existing(Uuid),
    New { title: String, table_type: TableType },
}

/// Shared cancel flag for one capture run. Once raised, in-flight
/// gateway calls may still finish but nothing touches the store.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Fixed pipeline: Recognize -> Translate -> Edit -> Persist. The
/// first two stages run here; `commit` is the persist stage over the
/// entries the user kept.
pub async fn process_capture<R, T>(
    recognizer: &R,
    translation: &TranslationService<T>,
    images: &[Vec<u8>],
    cancel: &CancelToken,
) -> Result<Vec<EditableEntry>, ManabiError>
where
    R: TextRecognizer,
    T: Translator,
{
    if cancel.is_cancelled() {
        return Err(ManabiError::Cancelled);
    }

    let mut items = recognize_images(recognizer, images).await;
    println!("Recognized {} unique lines", items.len());

    if cancel.is_cancelled() {
        return Err(ManabiError::Cancelled);
    }

    let texts: Vec<String> = items.iter().map(|item| item.text.clone()).collect();
    let translations = translation.translate_batch(&texts).await;

    for item in &mut items {
        if let Some(translated) = translations.get(&item.text) {
            item.translation = translated.clone();
        }
    }

    if cancel.is_cancelled() {
        return Err(ManabiError::Cancelled);
    }

    Ok(items.iter().map(EditableEntry::from).collect())
}

/// Persist stage: included entries with a non-empty source become
/// items under the chosen or newly created table, and the store is
/// flushed. A cancelled run never mutates the store.
pub fn commit_capture(
    store: &mut TableStore,
    target: CommitTarget,
    entries: &[EditableEntry],
    cancel: &CancelToken,
) -> Result<Uuid, ManabiError> {
    if cancel.is_cancelled() {
        return Err(ManabiError::Cancelled);
    }

    let table_id = match target {
        CommitTarget::Existing(id) => {
            store.table(id).ok_or(ManabiError::TableNotFound(id))?;
            id
        }
        CommitTarget::New { title, table_type } => store.create_table(&title, table_type)?,
    };

    let mut added = 0;
    for entry in entries {
        if !entry.included || entry.source.trim().is_empty() {
            continue;
        }
        store.add_item(table_id, &entry.source, &entry.target)?;
        added += 1;
    }
    println!("Committed {} items to table {}", added, table_id);

    store.save_if_dirty()?;
    Ok(table_id)
}
