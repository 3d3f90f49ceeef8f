use std::sync::mpsc;

use chrono::Utc;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::core::{
    SessionSettings,
    StudyItem,
    StudySession,
    StudyTable,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { total_items: usize },
    Answered { correct: bool },
    Skipped,
    Paused,
    Resumed,
    Completed,
}

/// Drives one drill run over a fixed item list. A single session is
/// active at a time; starting a new one discards the prior run.
pub struct SessionManager {
    current_session: Option<StudySession>,
    session_items: Vec<StudyItem>,
    current_index: usize,
    correct_count: u32,
    incorrect_count: u32,
    incorrect_items: Vec<StudyItem>,
    is_active: bool,
    started: bool,
    subscribers: Vec<mpsc::Sender<SessionEvent>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            current_session: None,
            session_items: Vec::new(),
            current_index: 0,
            correct_count: 0,
            incorrect_count: 0,
            incorrect_items: Vec::new(),
            is_active: false,
            started: false,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<SessionEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|sender| sender.send(event.clone()).is_ok());
    }

    pub fn start_session(&mut self, tables: &[StudyTable], settings: SessionSettings) {
        let table_ids: Vec<Uuid> = tables.iter().map(|t| t.id).collect();
        let mut items: Vec<StudyItem> =
            tables.iter().flat_map(|t| t.items().iter().cloned()).collect();

        if settings.shuffle {
            items.shuffle(&mut rand::rng());
        }

        self.begin(table_ids, items, settings);
    }

    /// Only valid after a run that produced mistakes; silently does
    /// nothing otherwise. The new run covers exactly the mistake list,
    /// always shuffled.
    pub fn start_review_session(&mut self) {
        if self.incorrect_items.is_empty() {
            return;
        }

        let settings =
            SessionSettings { show_source_first: true, shuffle: true, review_only: true };
        let table_ids =
            self.current_session.as_ref().map(|s| s.table_ids.clone()).unwrap_or_default();

        let mut items = std::mem::take(&mut self.incorrect_items);
        items.shuffle(&mut rand::rng());

        self.begin(table_ids, items, settings);
    }

    fn begin(&mut self, table_ids: Vec<Uuid>, items: Vec<StudyItem>, settings: SessionSettings) {
        self.session_items = items.clone();
        self.current_session = Some(StudySession::new(table_ids, items, settings));

        self.current_index = 0;
        self.correct_count = 0;
        self.incorrect_count = 0;
        self.incorrect_items.clear();
        self.is_active = true;
        self.started = true;

        let total = self.session_items.len();
        self.emit(SessionEvent::Started { total_items: total });

        // An empty item list is a completed run with zero totals.
        if total == 0 {
            self.complete();
        }
    }

    pub fn answer_correct(&mut self) {
        if self.current_index >= self.session_items.len() {
            return;
        }
        self.correct_count += 1;
        self.emit(SessionEvent::Answered { correct: true });
        self.next_item();
    }

    pub fn answer_incorrect(&mut self) {
        if self.current_index >= self.session_items.len() {
            return;
        }
        self.incorrect_count += 1;

        let current = self.session_items[self.current_index].clone();
        if !self.incorrect_items.iter().any(|item| item.id == current.id) {
            self.incorrect_items.push(current);
        }

        self.emit(SessionEvent::Answered { correct: false });
        self.next_item();
    }

    /// Advances without touching the counters (exit-without-scoring).
    pub fn skip_current_item(&mut self) {
        if self.current_index >= self.session_items.len() {
            return;
        }
        self.emit(SessionEvent::Skipped);
        self.next_item();
    }

    fn next_item(&mut self) {
        self.current_index += 1;

        if self.current_index >= self.session_items.len() {
            self.complete();
        }
    }

    fn complete(&mut self) {
        if let Some(session) = self.current_session.as_mut() {
            if session.end_time.is_none() {
                session.end_time = Some(Utc::now());
            }
        }
        self.emit(SessionEvent::Completed);
    }

    pub fn pause_session(&mut self) {
        self.is_active = false;
        self.emit(SessionEvent::Paused);
    }

    pub fn resume_session(&mut self) {
        self.is_active = true;
        self.emit(SessionEvent::Resumed);
    }

    pub fn current_session(&self) -> Option<&StudySession> {
        self.current_session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn total_items(&self) -> usize {
        self.session_items.len()
    }

    pub fn completed_items(&self) -> usize {
        (self.correct_count + self.incorrect_count) as usize
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    pub fn incorrect_items(&self) -> &[StudyItem] {
        &self.incorrect_items
    }

    pub fn progress_percentage(&self) -> f64 {
        if self.total_items() == 0 {
            return 0.0;
        }
        self.completed_items() as f64 / self.total_items() as f64
    }

    pub fn accuracy_percentage(&self) -> f64 {
        let total = self.completed_items();
        if total == 0 {
            return 0.0;
        }
        self.correct_count as f64 / total as f64
    }

    pub fn remaining_items(&self) -> usize {
        self.total_items() - self.completed_items()
    }

    pub fn current_item(&self) -> Option<&StudyItem> {
        self.session_items.get(self.current_index)
    }

    /// Completed means the position ran past the end of a run that was
    /// started at least once; pausing at the last item does not undo it.
    pub fn is_session_completed(&self) -> bool {
        self.current_index >= self.session_items.len() && self.started
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::core::TableType;

    fn table_with(pairs: &[(&str, &str)]) -> StudyTable {
        let mut table = StudyTable::new("Basics", TableType::Vocabulary);
        for (source, target) in pairs {
            table.add_item(*source, *target);
        }
        table
    }

    fn no_shuffle() -> SessionSettings {
        SessionSettings { show_source_first: true, shuffle: false, review_only: false }
    }

    #[test]
    fn unshuffled_session_preserves_item_order() {
        let table = table_with(&[("一", "1"), ("二", "2"), ("三", "3"), ("四", "4")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());

        let expected: Vec<_> = table.items().iter().map(|i| i.id).collect();
        let got: Vec<_> =
            manager.current_session().unwrap().items.iter().map(|i| i.id).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn shuffled_session_is_a_permutation() {
        let pairs: Vec<(String, String)> =
            (0..50).map(|i| (format!("語{}", i), format!("词{}", i))).collect();
        let mut table = StudyTable::new("Big", TableType::Vocabulary);
        for (source, target) in &pairs {
            table.add_item(source.clone(), target.clone());
        }

        let mut manager = SessionManager::new();
        let settings = SessionSettings { shuffle: true, ..no_shuffle() };
        manager.start_session(std::slice::from_ref(&table), settings);

        assert_eq!(manager.total_items(), 50);
        let expected: HashSet<_> = table.items().iter().map(|i| i.id).collect();
        let got: HashSet<_> =
            manager.current_session().unwrap().items.iter().map(|i| i.id).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn empty_session_is_immediately_completed() {
        let table = table_with(&[]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());

        assert!(manager.is_session_completed());
        assert_eq!(manager.total_items(), 0);
        assert_eq!(manager.completed_items(), 0);
        assert_eq!(manager.progress_percentage(), 0.0);
        assert_eq!(manager.accuracy_percentage(), 0.0);
        assert!(manager.current_session().unwrap().end_time.is_some());
    }

    #[test]
    fn progress_is_monotone_and_hits_one_at_completion() {
        let table = table_with(&[("一", "1"), ("二", "2"), ("三", "3")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());

        let mut last = manager.progress_percentage();
        for step in 0..3 {
            if step % 2 == 0 {
                manager.answer_correct();
            } else {
                manager.answer_incorrect();
            }
            let progress = manager.progress_percentage();
            assert!(progress >= last);
            last = progress;

            assert_eq!(progress >= 1.0, manager.is_session_completed());
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn mistake_list_deduplicates_by_identity() {
        let table = table_with(&[("一", "1"), ("二", "2")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());

        manager.answer_incorrect();
        manager.answer_incorrect();
        assert_eq!(manager.incorrect_items().len(), 2);

        // Retry pass over the same two items.
        manager.start_review_session();
        manager.answer_incorrect();
        manager.answer_incorrect();
        assert_eq!(manager.incorrect_items().len(), 2);
        let ids: HashSet<_> = manager.incorrect_items().iter().map(|i| i.id).collect();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn review_session_is_noop_without_mistakes() {
        let table = table_with(&[("一", "1")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());
        manager.answer_correct();
        assert!(manager.is_session_completed());

        manager.start_review_session();
        // Still the completed prior run, not a fresh one.
        assert!(manager.is_session_completed());
        assert_eq!(manager.correct_count(), 1);
    }

    #[test]
    fn review_session_covers_exactly_the_mistake_list() {
        let table = table_with(&[("一", "1"), ("二", "2"), ("三", "3"), ("四", "4")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());

        manager.answer_correct();
        manager.answer_incorrect();
        manager.answer_incorrect();
        manager.answer_correct();

        let mistakes: HashSet<_> = manager.incorrect_items().iter().map(|i| i.id).collect();
        assert_eq!(mistakes.len(), 2);

        manager.start_review_session();
        let session = manager.current_session().unwrap();
        assert!(session.settings.review_only);
        assert!(session.settings.shuffle);
        assert_eq!(manager.total_items(), 2);
        let got: HashSet<_> = session.items.iter().map(|i| i.id).collect();
        assert_eq!(got, mistakes);
        assert!(manager.incorrect_items().is_empty());
    }

    #[test]
    fn skip_advances_without_scoring() {
        let table = table_with(&[("一", "1"), ("二", "2")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());

        manager.skip_current_item();
        assert_eq!(manager.completed_items(), 0);
        assert_eq!(manager.current_item().unwrap().source, "二");

        manager.skip_current_item();
        assert!(manager.is_session_completed());
        assert_eq!(manager.correct_count(), 0);
        assert_eq!(manager.incorrect_count(), 0);
    }

    #[test]
    fn answers_after_completion_are_noops() {
        let table = table_with(&[("一", "1")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());

        manager.answer_correct();
        assert!(manager.is_session_completed());

        manager.answer_correct();
        manager.answer_incorrect();
        manager.skip_current_item();
        assert_eq!(manager.correct_count(), 1);
        assert_eq!(manager.incorrect_count(), 0);
        assert!(manager.incorrect_items().is_empty());
    }

    #[test]
    fn pause_and_resume_leave_progress_alone() {
        let table = table_with(&[("一", "1"), ("二", "2")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());

        manager.answer_correct();
        manager.pause_session();
        assert!(!manager.is_active());
        assert_eq!(manager.completed_items(), 1);
        assert_eq!(manager.current_item().unwrap().source, "二");

        manager.resume_session();
        assert!(manager.is_active());
        manager.answer_correct();
        assert!(manager.is_session_completed());
    }

    #[test]
    fn pause_at_last_item_does_not_uncomplete() {
        let table = table_with(&[("一", "1")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());
        manager.answer_correct();
        assert!(manager.is_session_completed());

        manager.pause_session();
        assert!(manager.is_session_completed());
    }

    #[test]
    fn starting_a_new_session_discards_the_prior_run() {
        let table = table_with(&[("一", "1"), ("二", "2")]);
        let mut manager = SessionManager::new();
        manager.start_session(std::slice::from_ref(&table), no_shuffle());
        manager.answer_incorrect();

        manager.start_session(std::slice::from_ref(&table), no_shuffle());
        assert_eq!(manager.completed_items(), 0);
        assert_eq!(manager.correct_count(), 0);
        assert!(manager.incorrect_items().is_empty());
        assert_eq!(manager.current_item().unwrap().source, "一");
    }

    #[test]
    fn end_to_end_basics_scenario() {
        let table = table_with(&[("こんにちは", "你好"), ("ありがとう", "謝謝")]);
        let mut manager = SessionManager::new();
        let settings =
            SessionSettings { show_source_first: true, shuffle: false, review_only: false };
        manager.start_session(std::slice::from_ref(&table), settings);

        manager.answer_correct();
        manager.answer_incorrect();

        assert_eq!(manager.correct_count(), 1);
        assert_eq!(manager.incorrect_count(), 1);
        assert_eq!(manager.remaining_items(), 0);
        assert!(manager.is_session_completed());
        assert_eq!(manager.accuracy_percentage(), 0.5);
        assert_eq!(manager.incorrect_items().len(), 1);
        assert_eq!(manager.incorrect_items()[0].source, "ありがとう");
        assert!(manager.current_item().is_none());
        assert!(manager.current_session().unwrap().end_time.is_some());
    }

    #[test]
    fn events_are_emitted_in_order() {
        let table = table_with(&[("一", "1")]);
        let mut manager = SessionManager::new();
        let receiver = manager.subscribe();

        manager.start_session(std::slice::from_ref(&table), no_shuffle());
        manager.pause_session();
        manager.resume_session();
        manager.answer_correct();

        let events: Vec<_> = receiver.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SessionEvent::Started { total_items: 1 },
                SessionEvent::Paused,
                SessionEvent::Resumed,
                SessionEvent::Answered { correct: true },
                SessionEvent::Completed,
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let table = table_with(&[("一", "1")]);
        let mut manager = SessionManager::new();
        let receiver = manager.subscribe();
        drop(receiver);

        manager.start_session(std::slice::from_ref(&table), no_shuffle());
        assert!(manager.subscribers.is_empty());
    }
}
