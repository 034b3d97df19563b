//! The single in-memory session behind the form: what is being typed, the
//! latest calculation, the saved history and a few bits of view state.

use crate::calc::{self, Calculation, CalculationResult, ValidationError};
use crate::errors::StoreError;
use crate::form::GatheringForm;
use crate::history::{self, HistoryEntry};
use crate::storage::HistoryRepository;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot message shown on the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Session {
    pub form: GatheringForm,
    pub calculation: Option<Calculation>,
    pub history: Vec<HistoryEntry>,
    expanded: BTreeSet<usize>,
    notice: Option<Notice>,
}

impl Session {
    pub fn new(history: Vec<HistoryEntry>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn result(&self) -> Option<&CalculationResult> {
        self.calculation.as_ref().map(|calculation| &calculation.result)
    }

    /// Run the calculation for the current form. A validation failure keeps
    /// the previous result and leaves an error notice.
    pub fn calculate(&mut self) -> Result<&CalculationResult, ValidationError> {
        match calc::calculate(&self.form) {
            Ok(calculation) => {
                let calculation = self.calculation.insert(calculation);
                Ok(&calculation.result)
            }
            Err(err) => {
                self.notice = Some(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Save the latest calculation and start over with an empty form.
    /// Returns `false` when there was nothing to save.
    pub async fn save(
        &mut self,
        repository: &HistoryRepository,
        timestamp: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        if self.calculation.is_none() {
            return Ok(false);
        }

        self.history = history::save_entry(
            repository,
            &self.history,
            self.calculation.as_ref(),
            timestamp,
        )
        .await?;
        // everything moved down by one
        self.expanded = self.expanded.iter().map(|idx| idx + 1).collect();
        self.form.reset();
        self.calculation = None;
        self.notice = Some(Notice::success("Calculation saved"));
        Ok(true)
    }

    /// Delete a history entry. Returns `false` for an out-of-range index.
    pub async fn delete_entry(
        &mut self,
        repository: &HistoryRepository,
        index: usize,
    ) -> Result<bool, StoreError> {
        if index >= self.history.len() {
            return Ok(false);
        }

        self.history = history::delete_entry(repository, &self.history, index).await?;
        self.expanded = self
            .expanded
            .iter()
            .filter(|idx| **idx != index)
            .map(|idx| if *idx > index { idx - 1 } else { *idx })
            .collect();
        self.notice = Some(Notice::success("Entry deleted"));
        Ok(true)
    }

    /// Flip material detail for an entry that has materials.
    pub fn toggle_expanded(&mut self, index: usize) {
        let has_materials = self
            .history
            .get(index)
            .is_some_and(|entry| !entry.materials.is_empty());
        if !has_materials {
            return;
        }
        if !self.expanded.remove(&index) {
            self.expanded.insert(index);
        }
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{FormField, MaterialField};
    use crate::storage::{FileStore, HISTORY_KEY, KeyValueStore, MemoryStore};
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::sync::Mutex;

    fn fill(form: &mut GatheringForm, title: &str, with_material: bool) {
        form.set_field(FormField::Title, title);
        form.set_field(FormField::Date, "2026-05-02");
        form.set_field(FormField::ParticipantCount, "10");
        form.set_field(FormField::FeePerPerson, "5000");
        if with_material {
            form.add_material();
            form.update_material(0, MaterialField::Name, "cups");
            form.update_material(0, MaterialField::UnitPrice, "500");
            form.update_material(0, MaterialField::Quantity, "10");
        }
    }

    fn repository() -> HistoryRepository {
        HistoryRepository::new(Arc::new(MemoryStore::default()))
    }

    async fn save_one(
        session: &mut Session,
        repository: &HistoryRepository,
        title: &str,
        with_material: bool,
    ) {
        fill(&mut session.form, title, with_material);
        session.calculate().unwrap();
        assert!(session.save(repository, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn missing_title_leaves_state_alone() {
        let repository = repository();
        let mut session = Session::new(Vec::new());
        fill(&mut session.form, "", false);

        assert_eq!(session.calculate().unwrap_err(), ValidationError::MissingTitle);
        assert!(session.result().is_none());
        assert!(!session.save(&repository, Utc::now()).await.unwrap());
        assert!(session.history.is_empty());

        let notice = session.take_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(session.take_notice().is_none());
    }

    #[tokio::test]
    async fn save_resets_form_and_persists() {
        let repository = repository();
        let mut session = Session::new(Vec::new());
        save_one(&mut session, &repository, "Picnic", false).await;

        assert_eq!(session.form, GatheringForm::default());
        assert!(session.calculation.is_none());
        assert_eq!(session.history.len(), 1);
        assert_eq!(repository.load().await, session.history);
        assert_eq!(session.take_notice().map(|n| n.kind), Some(NoticeKind::Success));
    }

    #[tokio::test]
    async fn expanded_flags_follow_their_entries() {
        let repository = repository();
        let mut session = Session::new(Vec::new());
        save_one(&mut session, &repository, "A", true).await;
        save_one(&mut session, &repository, "B", true).await;
        save_one(&mut session, &repository, "C", false).await;
        // history: C, B, A

        session.toggle_expanded(0);
        assert!(!session.is_expanded(0), "entries without materials stay collapsed");
        session.toggle_expanded(2);
        assert!(session.is_expanded(2));

        save_one(&mut session, &repository, "D", false).await;
        assert!(session.is_expanded(3));

        assert!(session.delete_entry(&repository, 1).await.unwrap());
        assert!(session.is_expanded(2));
        assert_eq!(session.history[2].title, "A");

        session.toggle_expanded(2);
        assert!(!session.is_expanded(2));
    }

    #[tokio::test]
    async fn delete_out_of_range_is_a_no_op() {
        let repository = repository();
        let mut session = Session::new(Vec::new());
        save_one(&mut session, &repository, "Only", false).await;
        let before = session.history.clone();

        assert!(!session.delete_entry(&repository, 5).await.unwrap());
        assert_eq!(session.history, before);
    }

    #[tokio::test]
    async fn starts_from_stored_history() {
        let store = Arc::new(MemoryStore::default());
        let repository = HistoryRepository::new(store.clone());
        let mut session = Session::new(repository.load().await);
        save_one(&mut session, &repository, "Persisted", false).await;

        let reopened = Session::new(repository.load().await);
        assert_eq!(reopened.history, session.history);
        assert!(store.get(HISTORY_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn save_from_spawned_task_writes_file_store() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let repository = HistoryRepository::new(Arc::new(store.clone()));
        let session = Arc::new(Mutex::new(Session::new(repository.load().await)));

        let task = tokio::spawn({
            let session = session.clone();
            let repository = repository.clone();
            async move {
                let mut session = session.lock().await;
                save_one(&mut session, &repository, "Spawned", true).await;
                assert!(session.delete_entry(&repository, 3).await.is_ok());
            }
        });
        task.await.unwrap();

        let session = session.lock().await;
        assert!(store.path_for(HISTORY_KEY).exists());
        assert_eq!(session.history.len(), 1);
        assert_eq!(repository.load().await, session.history);
    }
}
