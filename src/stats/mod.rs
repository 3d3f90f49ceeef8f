use chrono::{
    DateTime,
    Duration,
    Utc,
};

use crate::core::{
    StudyTable,
    TableType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overview {
    pub total_tables: usize,
    pub total_items: usize,
    pub vocabulary_tables: usize,
    pub grammar_tables: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeeklyProgress {
    pub active_tables: usize,
    pub items_added: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub title: String,
    pub type_name: &'static str,
    pub item_count: usize,
}

pub fn overview(tables: &[&StudyTable]) -> Overview {
    Overview {
        total_tables: tables.len(),
        total_items: tables.iter().map(|t| t.item_count()).sum(),
        vocabulary_tables:
            tables.iter().filter(|t| t.table_type == TableType::Vocabulary).count(),
        grammar_tables: tables.iter().filter(|t| t.table_type == TableType::Grammar).count(),
    }
}

/// Activity within the 7 days leading up to `now`. The reference time
/// is passed in rather than read from the clock.
pub fn weekly_progress(tables: &[&StudyTable], now: DateTime<Utc>) -> WeeklyProgress {
    let one_week_ago = now - Duration::days(7);

    let active_tables = tables.iter().filter(|t| t.updated_at >= one_week_ago).count();
    let items_added = tables
        .iter()
        .flat_map(|t| t.items())
        .filter(|item| item.created_at >= one_week_ago)
        .count();

    WeeklyProgress { active_tables, items_added }
}

pub fn table_rows(tables: &[&StudyTable]) -> Vec<TableRow> {
    tables
        .iter()
        .map(|table| TableRow {
            title: table.title.clone(),
            type_name: table.table_type.display_name(),
            item_count: table.item_count(),
        })
        .collect()
}
