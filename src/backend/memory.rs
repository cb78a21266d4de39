// src/backend/memory.rs
//
// In-process backend used when no hosted service is configured, and by tests.

use super::{AnnotationBackend, ChangeCallback, FileStorage, Subscription};
use crate::annotation::{AnnotationId, PageId};
use crate::error::ProofError;
use crate::wire::{AnnotationPatch, CommentRecord};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

struct Listener {
    page_id: PageId,
    active: Weak<Cell<bool>>,
    on_change: ChangeCallback,
}

#[derive(Default)]
pub struct MemoryBackend {
    rows: RefCell<Vec<CommentRecord>>,
    next_id: Cell<u64>,
    listeners: RefCell<Vec<Listener>>,
    fail_next: Cell<bool>,
    calls: Cell<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    /// Make the next backend call fail with `PersistenceFailure`.
    pub fn fail_next_request(&self) {
        self.fail_next.set(true);
    }

    #[cfg(test)]
    /// Number of backend calls issued so far.
    pub fn call_count(&self) -> usize {
        self.calls.get()
    }

    #[cfg(test)]
    pub fn rows(&self) -> Vec<CommentRecord> {
        self.rows.borrow().clone()
    }

    fn begin_call(&self) -> Result<(), ProofError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_next.replace(false) {
            return Err(ProofError::PersistenceFailure(
                "simulated network failure".to_string(),
            ));
        }
        Ok(())
    }

    fn notify(&self, page_id: &PageId) {
        // Collect first so callbacks may re-enter the backend.
        let callbacks: Vec<ChangeCallback> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|l| l.active.upgrade().map_or(false, |a| a.get()));
            listeners
                .iter()
                .filter(|l| &l.page_id == page_id)
                .map(|l| l.on_change.clone())
                .collect()
        };
        for callback in callbacks {
            callback();
        }
    }

    fn page_of(&self, id: &AnnotationId) -> Option<PageId> {
        self.rows
            .borrow()
            .iter()
            .find(|r| r.id.as_ref() == Some(id))
            .map(|r| r.page_id.clone())
    }
}

#[async_trait(?Send)]
impl AnnotationBackend for MemoryBackend {
    async fn list_annotations(&self, page_id: &PageId) -> Result<Vec<CommentRecord>, ProofError> {
        self.begin_call()?;
        let mut rows: Vec<CommentRecord> = self
            .rows
            .borrow()
            .iter()
            .filter(|r| &r.page_id == page_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn create_annotation(&self, record: &CommentRecord) -> Result<CommentRecord, ProofError> {
        self.begin_call()?;
        let seq = self.next_id.get() + 1;
        self.next_id.set(seq);
        let mut row = record.clone();
        row.id = Some(AnnotationId(seq.to_string()));
        row.created_at = Some(format!("local-{:012}", seq));
        self.rows.borrow_mut().push(row.clone());
        self.notify(&row.page_id);
        Ok(row)
    }

    async fn update_annotation(
        &self,
        id: &AnnotationId,
        patch: &AnnotationPatch,
    ) -> Result<(), ProofError> {
        self.begin_call()?;
        let page_id = {
            let mut rows = self.rows.borrow_mut();
            let row = rows
                .iter_mut()
                .find(|r| r.id.as_ref() == Some(id))
                .ok_or_else(|| ProofError::NotFound(id.to_string()))?;
            if let Some(resolved) = patch.resolved {
                row.resolved = resolved;
            }
            if let Some(text) = &patch.text {
                row.content = text.clone();
            }
            row.page_id.clone()
        };
        self.notify(&page_id);
        Ok(())
    }

    async fn delete_annotation(&self, id: &AnnotationId) -> Result<(), ProofError> {
        self.begin_call()?;
        let page_id = self
            .page_of(id)
            .ok_or_else(|| ProofError::NotFound(id.to_string()))?;
        self.rows.borrow_mut().retain(|r| r.id.as_ref() != Some(id));
        self.notify(&page_id);
        Ok(())
    }

    fn subscribe(&self, page_id: &PageId, on_change: ChangeCallback) -> Subscription {
        let (subscription, active) = Subscription::new();
        self.listeners.borrow_mut().push(Listener {
            page_id: page_id.clone(),
            active: Rc::downgrade(&active),
            on_change,
        });
        subscription
    }
}

#[async_trait(?Send)]
impl FileStorage for MemoryBackend {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, ProofError> {
        self.begin_call()?;
        // Bytes are not retained offline.
        log::info!("Accepted attachment {} ({} bytes) in memory", name, bytes.len());
        Ok(format!("memory://attachments/{}", name))
    }
}
