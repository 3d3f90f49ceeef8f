use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    Vocabulary,
    Grammar,
}

impl TableType {
    pub fn display_name(&self) -> &'static str {
        match self {
            TableType::Vocabulary => "單字",
            TableType::Grammar => "語法",
        }
    }
}

/// One source/target pair. Owned by exactly one table, so deleting
/// the table drops its items with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyItem {
    pub id: Uuid,
    pub source: String, // Japanese text
    pub target: String, // Chinese translation
    pub created_at: DateTime<Utc>,
}

impl StudyItem {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            target: target.into(),
            created_at: Utc::now(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.source.is_empty() && !self.target.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyTable {
    pub id: Uuid,
    pub title: String,
    pub table_type: TableType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    items: Vec<StudyItem>, // Ordered by creation time
}

impl StudyTable {
    pub fn new(title: impl Into<String>, table_type: TableType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            table_type,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        }
    }

    pub fn items(&self) -> &[StudyItem] {
        &self.items
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Appends a new item and refreshes `updated_at`.
    pub fn add_item(&mut self, source: impl Into<String>, target: impl Into<String>) -> Uuid {
        let item = StudyItem::new(source, target);
        let id = item.id;
        self.items.push(item);
        self.touch();
        id
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != item_id);
        let removed = self.items.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    pub fn update_item(
        &mut self,
        item_id: Uuid,
        source: Option<String>,
        target: Option<String>,
    ) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id == item_id) else {
            return false;
        };

        if let Some(source) = source {
            item.source = source;
        }
        if let Some(target) = target {
            item.target = target;
        }
        self.touch();
        true
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Normalized text region, top-left origin with y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// A single OCR result. Ephemeral: only entries the user accepts in the
/// edit step ever become StudyItems.
#[derive(Debug, Clone)]
pub struct RecognizedItem {
    pub id: Uuid,
    pub text: String,
    pub confidence: f32, // [0, 1]
    pub bounding_box: BoundingBox,
    pub translation: String,
    pub selected: bool,
}

impl RecognizedItem {
    pub fn new(text: impl Into<String>, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            confidence,
            bounding_box,
            translation: String::new(),
            selected: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionSettings {
    pub show_source_first: bool,
    pub shuffle: bool,
    pub review_only: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { show_source_first: true, shuffle: true, review_only: false }
    }
}

/// One drill run. Never persisted; discarded when the run ends.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub id: Uuid,
    pub table_ids: Vec<Uuid>,
    pub items: Vec<StudyItem>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub settings: SessionSettings,
}

impl StudySession {
    pub fn new(table_ids: Vec<Uuid>, items: Vec<StudyItem>, settings: SessionSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            table_ids,
            items,
            start_time: Utc::now(),
            end_time: None,
            settings,
        }
    }
}
