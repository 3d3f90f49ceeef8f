use std::{
    collections::HashMap,
    path::PathBuf,
    sync::mpsc,
};

use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

use crate::{
    core::{
        ManabiError,
        StudyTable,
        TableType,
    },
    persistence,
};

pub const STORE_FILE: &str = "study_tables.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    TableCreated(Uuid),
    TableUpdated(Uuid),
    TableDeleted(Uuid),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    tables: Vec<StudyTable>,
}

/// Table/item persistence gateway. Tables own their items, so deleting
/// a table cascades structurally. Mutations mark the store dirty;
/// `save_if_dirty` flushes to a JSON file under the app data dir.
pub struct TableStore {
    tables: HashMap<Uuid, StudyTable>,
    file_path: PathBuf,
    dirty: bool,
    subscribers: Vec<mpsc::Sender<StoreEvent>>,
}

impl TableStore {
    pub fn load() -> Result<Self, ManabiError> {
        Self::load_from(persistence::get_data_file_path(STORE_FILE))
    }

    pub fn load_from(file_path: PathBuf) -> Result<Self, ManabiError> {
        let data: StoreData = persistence::load_json_at(&file_path)?;
        let tables = data.tables.into_iter().map(|t| (t.id, t)).collect();

        Ok(Self { tables, file_path, dirty: false, subscribers: Vec::new() })
    }

    pub fn in_memory() -> Self {
        Self {
            tables: HashMap::new(),
            file_path: PathBuf::new(),
            dirty: false,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<StoreEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    fn emit(&mut self, event: StoreEvent) {
        self.subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }

    pub fn create_table(&mut self, title: &str, table_type: TableType) -> Result<Uuid, ManabiError> {
        if title.trim().is_empty() {
            return Err(ManabiError::EmptyField("title"));
        }

        let table = StudyTable::new(title.trim(), table_type);
        let id = table.id;
        self.tables.insert(id, table);
        self.dirty = true;
        self.emit(StoreEvent::TableCreated(id));
        Ok(id)
    }

    /// Deletes the table and, with it, every item it owns.
    pub fn delete_table(&mut self, table_id: Uuid) -> Result<(), ManabiError> {
        if self.tables.remove(&table_id).is_none() {
            return Err(ManabiError::TableNotFound(table_id));
        }
        self.dirty = true;
        self.emit(StoreEvent::TableDeleted(table_id));
        Ok(())
    }

    pub fn add_item(
        &mut self,
        table_id: Uuid,
        source: &str,
        target: &str,
    ) -> Result<Uuid, ManabiError> {
        if source.trim().is_empty() {
            return Err(ManabiError::EmptyField("source"));
        }

        let table =
            self.tables.get_mut(&table_id).ok_or(ManabiError::TableNotFound(table_id))?;
        let item_id = table.add_item(source, target);
        self.dirty = true;
        self.emit(StoreEvent::TableUpdated(table_id));
        Ok(item_id)
    }

    pub fn update_item(
        &mut self,
        table_id: Uuid,
        item_id: Uuid,
        source: Option<String>,
        target: Option<String>,
    ) -> Result<(), ManabiError> {
        let table =
            self.tables.get_mut(&table_id).ok_or(ManabiError::TableNotFound(table_id))?;
        if !table.update_item(item_id, source, target) {
            return Err(ManabiError::ItemNotFound(item_id));
        }
        self.dirty = true;
        self.emit(StoreEvent::TableUpdated(table_id));
        Ok(())
    }

    pub fn remove_item(&mut self, table_id: Uuid, item_id: Uuid) -> Result<(), ManabiError> {
        let table =
            self.tables.get_mut(&table_id).ok_or(ManabiError::TableNotFound(table_id))?;
        if !table.remove_item(item_id) {
            return Err(ManabiError::ItemNotFound(item_id));
        }
        self.dirty = true;
        self.emit(StoreEvent::TableUpdated(table_id));
        Ok(())
    }

    pub fn table(&self, table_id: Uuid) -> Option<&StudyTable> {
        self.tables.get(&table_id)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// All tables, most recently updated first.
    pub fn tables_by_recency(&self) -> Vec<&StudyTable> {
        let mut tables: Vec<&StudyTable> = self.tables.values().collect();
        tables.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        tables
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Saves only when something changed. Failures are returned to the
    /// caller so the operation can be retried, never dropped silently.
    pub fn save_if_dirty(&mut self) -> Result<(), ManabiError> {
        if !self.dirty {
            return Ok(());
        }
        if self.file_path.as_os_str().is_empty() {
            self.dirty = false;
            return Ok(());
        }

        let data = StoreData { tables: self.tables.values().cloned().collect() };
        persistence::save_json_at(&data, &self.file_path)?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("manabi-store-{}", Uuid::new_v4()))
            .join(STORE_FILE)
    }

    #[test]
    fn create_and_fetch_table() {
        let mut store = TableStore::in_memory();
        let id = store.create_table("Basics", TableType::Vocabulary).unwrap();

        let table = store.table(id).unwrap();
        assert_eq!(table.title, "Basics");
        assert_eq!(table.table_type, TableType::Vocabulary);
        assert!(store.is_dirty());
    }

    #[test]
    fn empty_title_is_rejected_before_persistence() {
        let mut store = TableStore::in_memory();
        assert!(matches!(
            store.create_table("   ", TableType::Grammar),
            Err(ManabiError::EmptyField("title"))
        ));
        assert!(!store.is_dirty());
    }

    #[test]
    fn empty_item_source_is_rejected() {
        let mut store = TableStore::in_memory();
        let id = store.create_table("Basics", TableType::Vocabulary).unwrap();
        assert!(matches!(
            store.add_item(id, "  ", "你好"),
            Err(ManabiError::EmptyField("source"))
        ));
        assert_eq!(store.table(id).unwrap().item_count(), 0);
    }

    #[test]
    fn delete_table_cascades_to_items() {
        let mut store = TableStore::in_memory();
        let id = store.create_table("Basics", TableType::Vocabulary).unwrap();
        store.add_item(id, "こんにちは", "你好").unwrap();
        store.add_item(id, "ありがとう", "謝謝").unwrap();

        store.delete_table(id).unwrap();
        assert!(store.table(id).is_none());
        assert_eq!(store.table_count(), 0);
    }

    #[test]
    fn tables_sorted_by_recency() {
        let mut store = TableStore::in_memory();
        let first = store.create_table("First", TableType::Vocabulary).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create_table("Second", TableType::Grammar).unwrap();

        let ordered: Vec<Uuid> = store.tables_by_recency().iter().map(|t| t.id).collect();
        assert_eq!(ordered, vec![second, first]);

        // Adding an item bumps the older table to the front.
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.add_item(first, "一", "1").unwrap();
        let ordered: Vec<Uuid> = store.tables_by_recency().iter().map(|t| t.id).collect();
        assert_eq!(ordered, vec![first, second]);
    }

    #[test]
    fn save_and_reload_round_trip() {
        let path = temp_store_path();
        let mut store = TableStore::load_from(path.clone()).unwrap();
        let id = store.create_table("Basics", TableType::Vocabulary).unwrap();
        store.add_item(id, "こんにちは", "你好").unwrap();
        store.save_if_dirty().unwrap();
        assert!(!store.is_dirty());

        let reloaded = TableStore::load_from(path.clone()).unwrap();
        let table = reloaded.table(id).unwrap();
        assert_eq!(table.item_count(), 1);
        assert_eq!(table.items()[0].source, "こんにちは");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn save_if_dirty_is_noop_when_clean() {
        let mut store = TableStore::in_memory();
        assert!(store.save_if_dirty().is_ok());
    }

    #[test]
    fn change_events_reach_subscribers() {
        let mut store = TableStore::in_memory();
        let receiver = store.subscribe();

        let id = store.create_table("Basics", TableType::Vocabulary).unwrap();
        let item = store.add_item(id, "一", "1").unwrap();
        store.remove_item(id, item).unwrap();
        store.delete_table(id).unwrap();

        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            events,
            vec![
                StoreEvent::TableCreated(id),
                StoreEvent::TableUpdated(id),
                StoreEvent::TableUpdated(id),
                StoreEvent::TableDeleted(id),
            ]
        );
    }

    #[test]
    fn missing_table_and_item_errors() {
        let mut store = TableStore::in_memory();
        let bogus = Uuid::new_v4();
        assert!(matches!(store.delete_table(bogus), Err(ManabiError::TableNotFound(_))));
        assert!(matches!(
            store.add_item(bogus, "一", "1"),
            Err(ManabiError::TableNotFound(_))
        ));

        let id = store.create_table("Basics", TableType::Vocabulary).unwrap();
        assert!(matches!(
            store.remove_item(id, bogus),
            Err(ManabiError::ItemNotFound(_))
        ));
    }
}
