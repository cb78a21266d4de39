// src/backend/mod.rs
//
// Narrow capabilities the annotation core needs from the hosted backend.
// Components receive a `BackendHandle` as a prop instead of reaching for any
// global state.

pub mod memory;
pub mod realtime;
pub mod rest;

use crate::annotation::{AnnotationId, PageId};
use crate::error::ProofError;
use crate::wire::{AnnotationPatch, CommentRecord};
use async_trait::async_trait;
use futures::channel::oneshot;
use std::cell::Cell;
use std::rc::Rc;

/// Called on any insert, update or delete for a subscribed page.
pub type ChangeCallback = Rc<dyn Fn()>;

#[async_trait(?Send)]
pub trait AnnotationBackend {
    /// All rows for a page, oldest first.
    async fn list_annotations(&self, page_id: &PageId) -> Result<Vec<CommentRecord>, ProofError>;

    /// Server assigns `id` and `created_at`.
    async fn create_annotation(&self, record: &CommentRecord) -> Result<CommentRecord, ProofError>;

    async fn update_annotation(
        &self,
        id: &AnnotationId,
        patch: &AnnotationPatch,
    ) -> Result<(), ProofError>;

    async fn delete_annotation(&self, id: &AnnotationId) -> Result<(), ProofError>;

    fn subscribe(&self, page_id: &PageId, on_change: ChangeCallback) -> Subscription;
}

#[async_trait(?Send)]
pub trait FileStorage {
    /// Store a file and return its public URL.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, ProofError>;
}

/// Live change feed for one page. Delivery stops once this is dropped.
pub struct Subscription {
    active: Rc<Cell<bool>>,
    // Dropped with the subscription, which resolves the paired receiver.
    _close: Option<oneshot::Sender<()>>,
}

impl Subscription {
    pub fn new() -> (Self, Rc<Cell<bool>>) {
        let active = Rc::new(Cell::new(true));
        (
            Self {
                active: active.clone(),
                _close: None,
            },
            active,
        )
    }

    /// A receiver that resolves as soon as this subscription is dropped,
    /// for feeds that would otherwise only notice on their next event.
    pub fn close_signal(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self._close = Some(tx);
        rx
    }

    /// A subscription that never fires.
    pub fn inert() -> Self {
        Self {
            active: Rc::new(Cell::new(false)),
            _close: None,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

/// Both backend capabilities behind one shared handle.
pub trait Backend: AnnotationBackend + FileStorage {}

impl<T: AnnotationBackend + FileStorage> Backend for T {}

#[derive(Clone)]
pub struct BackendHandle(pub Rc<dyn Backend>);

impl BackendHandle {
    pub fn new<B: Backend + 'static>(backend: B) -> Self {
        Self(Rc::new(backend))
    }
}

impl PartialEq for BackendHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for BackendHandle {
    type Target = dyn Backend;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
