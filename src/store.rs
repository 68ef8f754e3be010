//! The todo store: sole owner of the collection.
//!
//! The store holds an immutable snapshot (`Arc<TodoList>`). Every mutation
//! builds a new list with `ops::todo_ops`, swaps the snapshot, and saves.
//! Storage failures never abort a mutation; they are reported through the
//! injected [`Notifier`] and the unsaved data is handed to
//! [`KeyValueStore::preserve`].

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::io::recovery::RecoveryCategory;
use crate::io::storage::{KeyValueStore, STORAGE_KEY, StorageError};
use crate::model::category::DEFAULT_CATEGORY;
use crate::model::todo::TodoList;
use crate::ops::todo_ops;

/// User-visible reporting of storage failures.
pub trait Notifier {
    fn error(&self, title: &str, message: &str);
}

/// Yes/no confirmation before destructive operations.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything; for `--yes` and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Notifier that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, title: &str, message: &str) {
        tracing::error!(%title, detail = %message, "storage error");
    }
}

/// Result of a store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Collection changed and a save was attempted
    Changed,
    /// Input left the collection as it was (blank text, unknown id, nothing to clear)
    Unchanged,
    /// The user declined the confirmation prompt
    Declined,
}

impl Outcome {
    pub fn changed(&self) -> bool {
        matches!(self, Outcome::Changed)
    }
}

pub struct TodoStore<S, N, C> {
    storage: S,
    notifier: N,
    confirm: C,
    snapshot: Arc<TodoList>,
    default_category: String,
    clock: fn() -> DateTime<Utc>,
}

impl<S: KeyValueStore, N: Notifier, C: Confirm> TodoStore<S, N, C> {
    /// A store with an empty collection. Call [`TodoStore::load`] to hydrate.
    pub fn new(storage: S, notifier: N, confirm: C) -> Self {
        TodoStore {
            storage,
            notifier,
            confirm,
            snapshot: Arc::new(TodoList::new()),
            default_category: DEFAULT_CATEGORY.to_string(),
            clock: Utc::now,
        }
    }

    pub fn with_default_category(mut self, category: &str) -> Self {
        let category = category.trim();
        if !category.is_empty() {
            self.default_category = category.to_string();
        }
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Current snapshot. Its identity changes exactly when the collection does.
    pub fn snapshot(&self) -> Arc<TodoList> {
        Arc::clone(&self.snapshot)
    }

    pub fn todos(&self) -> &TodoList {
        &self.snapshot
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Replace the collection with the stored one. Missing data leaves it
    /// empty; unreadable data is reported and leaves it unchanged.
    pub fn load(&mut self) -> Result<(), StorageError> {
        match self.read_stored() {
            Ok(Some(list)) => {
                tracing::debug!(count = list.len(), "loaded todos");
                self.snapshot = Arc::new(list);
                Ok(())
            }
            Ok(None) => {
                tracing::debug!(key = STORAGE_KEY, "no stored todos");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not load todos");
                self.notifier.error("Could not load your todos", &e.to_string());
                Err(e)
            }
        }
    }

    fn read_stored(&self) -> Result<Option<TodoList>, StorageError> {
        let Some(raw) = self.storage.get(STORAGE_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<TodoList>(&raw) {
            Ok(list) => Ok(Some(list)),
            Err(e) => {
                self.storage.preserve(
                    STORAGE_KEY,
                    &raw,
                    RecoveryCategory::Load,
                    "stored todos could not be parsed",
                );
                Err(StorageError::Parse(e))
            }
        }
    }

    /// Write the current collection. Failure is reported; the in-memory
    /// collection is kept as is.
    pub fn save(&self) -> Result<(), StorageError> {
        let result = serde_json::to_string(self.snapshot.as_ref())
            .map_err(StorageError::Serialize)
            .and_then(|blob| {
                self.storage.set(STORAGE_KEY, &blob).inspect_err(|_| {
                    self.storage.preserve(
                        STORAGE_KEY,
                        &blob,
                        RecoveryCategory::Write,
                        "todos could not be saved",
                    );
                })
            });
        match &result {
            Ok(()) => tracing::debug!(count = self.snapshot.len(), "saved todos"),
            Err(e) => {
                tracing::warn!(error = %e, "could not save todos");
                self.notifier.error("Could not save your todos", &e.to_string());
            }
        }
        result
    }

    fn commit(&mut self, next: Option<TodoList>) -> Outcome {
        match next {
            Some(list) => {
                self.snapshot = Arc::new(list);
                // Reported through the notifier; the change stands either way
                let _ = self.save();
                Outcome::Changed
            }
            None => Outcome::Unchanged,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Add a todo at the top of the list. Returns the new id, or `None`
    /// when `text` is blank.
    pub fn add(&mut self, text: &str, category: Option<&str>) -> Option<String> {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(self.default_category.as_str())
            .to_string();
        let (next, id) = todo_ops::add_todo(&self.snapshot, text, &category, (self.clock)())?;
        tracing::debug!(%id, %category, "added todo");
        self.commit(Some(next));
        Some(id)
    }

    pub fn toggle(&mut self, id: &str) -> Outcome {
        let next = todo_ops::toggle_todo(&self.snapshot, id);
        self.commit(next)
    }

    pub fn edit(&mut self, id: &str, text: &str, category: Option<&str>) -> Outcome {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let next = todo_ops::edit_todo(&self.snapshot, id, text, category);
        self.commit(next)
    }

    /// Remove a todo after confirmation.
    pub fn delete(&mut self, id: &str) -> Outcome {
        let Some(item) = self.snapshot.get(id) else {
            return Outcome::Unchanged;
        };
        let prompt = format!("Delete \"{}\"?", item.text);
        if !self.confirm.confirm(&prompt) {
            return Outcome::Declined;
        }
        let next = todo_ops::delete_todo(&self.snapshot, id);
        self.commit(next)
    }

    /// Remove every completed todo after confirmation.
    pub fn clear_completed(&mut self) -> Outcome {
        let count = self.snapshot.completed_count();
        if count == 0 {
            return Outcome::Unchanged;
        }
        let noun = if count == 1 { "todo" } else { "todos" };
        let prompt = format!("Remove {} completed {}?", count, noun);
        if !self.confirm.confirm(&prompt) {
            return Outcome::Declined;
        }
        let next = todo_ops::clear_completed(&self.snapshot);
        self.commit(next)
    }
}
