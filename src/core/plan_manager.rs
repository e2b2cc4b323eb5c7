use std::path::PathBuf;
use std::time::Instant;

use crate::core::debounce::{Debouncer, SAVE_QUIESCENCE};
use crate::errors::PlannerError;
use crate::plan::BudgetPlan;
use crate::storage::StorageBackend;

/// How a snapshot came to be after an open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Created,
    /// The stored snapshot could not be read; a fresh default is in use and
    /// the broken data stays on disk untouched.
    Fallback,
}

/// Facade that coordinates the live snapshot, persistence, and debounced
/// saves. Load failures never abort startup: the manager falls back to a
/// default plan and keeps operating in memory.
pub struct PlanManager {
    pub current: Option<BudgetPlan>,
    current_key: Option<String>,
    storage: Box<dyn StorageBackend>,
    save_debounce: Debouncer,
}

impl PlanManager {
    pub fn new(storage: Box<dyn StorageBackend>) -> Self {
        Self {
            current: None,
            current_key: None,
            storage,
            save_debounce: Debouncer::new(SAVE_QUIESCENCE),
        }
    }

    pub fn storage(&self) -> &dyn StorageBackend {
        self.storage.as_ref()
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current_key.as_deref()
    }

    /// Opens the snapshot stored under `key`, creating a default plan when
    /// nothing is stored or the stored data is unreadable.
    pub fn open(&mut self, key: &str) -> LoadOutcome {
        let outcome = match self.storage.load_plan(key) {
            Ok(Some(plan)) => {
                self.current = Some(plan);
                LoadOutcome::Loaded
            }
            Ok(None) => {
                self.current = Some(BudgetPlan::new());
                LoadOutcome::Created
            }
            Err(err) => {
                tracing::warn!(%key, %err, "failed to load plan snapshot, using defaults");
                self.current = Some(BudgetPlan::new());
                LoadOutcome::Fallback
            }
        };
        self.current_key = Some(key.to_string());
        if let Err(err) = self.storage.record_last_plan(Some(key)) {
            tracing::warn!(%err, "failed to record last opened plan");
        }
        self.save_debounce.clear();
        outcome
    }

    /// Writes the current snapshot now, bypassing the debounce window.
    pub fn save(&mut self) -> Result<PathBuf, PlannerError> {
        let key = self
            .current_key
            .clone()
            .ok_or_else(|| PlannerError::Persistence("no plan opened".into()))?;
        let plan = self
            .current
            .as_ref()
            .ok_or_else(|| PlannerError::Persistence("no plan loaded".into()))?;
        let path = self.storage.save_plan(plan, &key)?;
        self.save_debounce.clear();
        Ok(path)
    }

    /// Marks the snapshot changed; the actual write happens once the
    /// quiescence window elapses without a newer change.
    pub fn note_change(&mut self, now: Instant) {
        self.save_debounce.signal(now);
    }

    pub fn save_pending(&self) -> bool {
        self.save_debounce.is_pending()
    }

    /// Flushes a due save. A failed write is logged and re-queued so the
    /// next cycle retries it; the in-memory snapshot stays authoritative.
    pub fn flush_if_due(&mut self, now: Instant) -> Option<PathBuf> {
        if !self.save_debounce.take_ready(now) {
            return None;
        }
        match self.save() {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(%err, "debounced save failed, will retry");
                self.save_debounce.signal(now);
                None
            }
        }
    }

    /// Flushes unconditionally when a save is pending, e.g. on shutdown.
    pub fn flush_now(&mut self) {
        if !self.save_debounce.is_pending() {
            return;
        }
        if let Err(err) = self.save() {
            tracing::warn!(%err, "final save failed, snapshot not persisted");
        }
    }
}
