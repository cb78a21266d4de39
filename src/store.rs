// src/store.rs
//
// Authoritative in-memory state for one open page: the persisted annotations,
// the single unsaved draft and the active authoring mode.
//
// Every backend operation is split into a synchronous begin step, the backend
// call, and a synchronous finish step. Components drive the steps through
// messages; the async methods at the bottom compose them for other callers.

use crate::annotation::{
    Anchor, Annotation, AnnotationId, AuthoringMode, Draft, InteractionState, NewAnnotation,
    PageId, Scope, StrokePath, StrokeTool,
};
use crate::backend::AnnotationBackend;
use crate::error::ProofError;
use crate::geometry::NormPoint;
use crate::wire::{AnnotationPatch, CommentRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationStore {
    page_id: PageId,
    /// Distinct for every store, so replies issued against a closed page
    /// are never applied to a later store for the same page.
    generation: u64,
    annotations: Vec<Annotation>,
    draft: Draft,
    mode: AuthoringMode,
    hovered: Option<AnnotationId>,
    saving: bool,
    loaded: bool,
}

/// Proof that the user was asked before a removal. Only
/// [`AnnotationStore::request_remove`] hands these out.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalRequest {
    id: AnnotationId,
}

/// An optimistic removal in flight, kept so it can be undone.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalTicket {
    generation: u64,
    index: usize,
    annotation: Annotation,
}

impl RemovalTicket {
    pub fn id(&self) -> &AnnotationId {
        &self.annotation.id
    }
}

/// An optimistic resolved flip in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleTicket {
    generation: u64,
    id: AnnotationId,
    resolved: bool,
}

impl ToggleTicket {
    pub fn id(&self) -> &AnnotationId {
        &self.id
    }

    pub fn patch(&self) -> AnnotationPatch {
        AnnotationPatch::resolved(self.resolved)
    }
}

impl AnnotationStore {
    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            annotations: Vec::new(),
            draft: Draft::None,
            mode: AuthoringMode::View,
            hovered: None,
            saving: false,
            loaded: false,
        }
    }

    pub fn page_id(&self) -> &PageId {
        &self.page_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Oldest first.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| &a.id == id)
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn mode(&self) -> AuthoringMode {
        self.mode
    }

    pub fn hovered(&self) -> Option<&AnnotationId> {
        self.hovered.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn interaction_state(&self) -> InteractionState {
        match &self.draft {
            Draft::Pin(_) => InteractionState::PinPending,
            Draft::Strokes {
                current: Some(_), ..
            } => InteractionState::DrawingStroke,
            _ => InteractionState::Idle,
        }
    }

    // ------ LOADING ------

    /// Replace the list with a fresh backend listing. Responses for another
    /// page arrive after navigation and are dropped.
    pub fn apply_loaded(
        &mut self,
        page_id: &PageId,
        result: Result<Vec<CommentRecord>, ProofError>,
    ) -> Result<(), ProofError> {
        if page_id != &self.page_id {
            log::debug!("Dropping stale listing for page {}", page_id);
            return Ok(());
        }
        let records = result?;
        let total = records.len();
        let mut annotations: Vec<Annotation> = records
            .into_iter()
            .filter_map(|record| match Annotation::try_from(record) {
                Ok(annotation) => Some(annotation),
                Err(e) => {
                    log::warn!("Skipping annotation row on page {}: {}", page_id, e);
                    None
                }
            })
            .collect();
        annotations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        if let Some(hovered) = &self.hovered {
            if !annotations.iter().any(|a| &a.id == hovered) {
                self.hovered = None;
            }
        }
        log::info!(
            "Loaded {} of {} annotations for page {}",
            annotations.len(),
            total,
            page_id
        );
        self.annotations = annotations;
        self.loaded = true;
        Ok(())
    }

    // ------ AUTHORING ------

    /// Switch tools. Entering pin mode drops an unconfirmed stroke draft and
    /// entering a stroke mode drops a pending pin. A draft being saved is
    /// kept either way.
    pub fn set_mode(&mut self, mode: AuthoringMode) {
        let discard = !self.saving
            && matches!(
                (mode, &self.draft),
                (AuthoringMode::Pin, Draft::Strokes { .. })
                    | (AuthoringMode::Stroke(_), Draft::Pin(_))
            );
        if discard {
            log::debug!("Discarding unconfirmed draft on mode change");
            self.draft = Draft::None;
        }
        self.mode = mode;
    }

    /// True while a save is in flight: the submitted draft is frozen until
    /// the backend answers.
    fn draft_locked(&self) -> bool {
        if self.saving {
            log::debug!("Draft is being saved; ignoring edit");
        }
        self.saving
    }

    pub fn begin_draft_pin(&mut self, point: NormPoint) {
        if self.draft_locked() {
            return;
        }
        self.draft = Draft::Pin(point);
    }

    /// Pointer down in a stroke mode. Continues the current draft when it uses
    /// the same tool, otherwise starts a new one.
    pub fn begin_draft_stroke(&mut self, tool: StrokeTool) {
        if self.draft_locked() {
            return;
        }
        self.end_draft_stroke();
        if let Draft::Strokes {
            tool: draft_tool,
            current,
            ..
        } = &mut self.draft
        {
            if *draft_tool == tool {
                *current = Some(StrokePath::new());
                return;
            }
        }
        self.draft = Draft::Strokes {
            tool,
            segments: Vec::new(),
            current: Some(StrokePath::new()),
        };
    }

    /// Pointer move. Returns whether a point was recorded.
    pub fn extend_draft_stroke(&mut self, point: NormPoint) -> bool {
        if self.saving {
            return false;
        }
        match &mut self.draft {
            Draft::Strokes {
                current: Some(path),
                ..
            } => {
                path.push(point);
                true
            }
            _ => false,
        }
    }

    /// Pointer up: close the open segment. Empty segments are dropped.
    pub fn end_draft_stroke(&mut self) {
        if self.saving {
            return;
        }
        let now_empty = match &mut self.draft {
            Draft::Strokes {
                segments, current, ..
            } => {
                if let Some(path) = current.take() {
                    if !path.is_empty() {
                        segments.push(path);
                    }
                }
                segments.is_empty()
            }
            _ => false,
        };
        if now_empty {
            self.draft = Draft::None;
        }
    }

    pub fn cancel_draft(&mut self) {
        if self.draft_locked() {
            return;
        }
        self.draft = Draft::None;
    }

    pub fn set_hovered(&mut self, id: Option<AnnotationId>) {
        self.hovered = id;
    }

    // ------ CONFIRM ------

    /// Validate the draft and build the annotation to create. Nothing is
    /// cleared here; the draft survives until the backend acknowledges it.
    ///
    /// General scope drops any position or path. Pointed scope with nothing
    /// to point at becomes a general note.
    pub fn prepare_confirm(
        &mut self,
        text: &str,
        scope: Scope,
        attachment: Option<String>,
    ) -> Result<NewAnnotation, ProofError> {
        self.end_draft_stroke();
        let text = Some(text.trim().to_string()).filter(|t| !t.is_empty());
        let attachment = attachment.filter(|a| !a.trim().is_empty());

        let anchor = match (scope, &self.draft) {
            (Scope::Pointed, Draft::Pin(point)) => Anchor::Pin(*point),
            (Scope::Pointed, Draft::Strokes { tool, segments, .. }) if !segments.is_empty() => {
                Anchor::Stroke {
                    tool: *tool,
                    segments: segments.clone(),
                }
            }
            _ => Anchor::Page,
        };
        if anchor == Anchor::Page && text.is_none() {
            return Err(ProofError::EmptyAnnotation);
        }

        self.saving = true;
        Ok(NewAnnotation {
            page_id: self.page_id.clone(),
            anchor,
            text,
            attachment,
        })
    }

    /// Apply the backend's answer to a create.
    pub fn finish_confirm(
        &mut self,
        result: Result<CommentRecord, ProofError>,
    ) -> Result<Annotation, ProofError> {
        self.saving = false;
        let record = result.map_err(|e| {
            log::error!("Saving annotation failed, keeping draft: {}", e);
            e
        })?;
        // The row exists now; a retry would duplicate it.
        self.draft = Draft::None;
        let annotation = Annotation::try_from(record)?;
        if annotation.page_id != self.page_id {
            log::debug!("Created annotation belongs to page {}", annotation.page_id);
            return Ok(annotation);
        }
        if self.annotation(&annotation.id).is_none() {
            let at = self
                .annotations
                .partition_point(|a| a.created_at <= annotation.created_at);
            self.annotations.insert(at, annotation.clone());
        }
        log::info!("Saved annotation {} on page {}", annotation.id, self.page_id);
        Ok(annotation)
    }

    // ------ RESOLVE ------

    /// Flip `resolved` locally before the backend is told.
    pub fn begin_toggle_resolved(&mut self, id: &AnnotationId) -> Result<ToggleTicket, ProofError> {
        let annotation = self
            .annotations
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| ProofError::NotFound(id.to_string()))?;
        annotation.resolved = !annotation.resolved;
        Ok(ToggleTicket {
            generation: self.generation,
            id: id.clone(),
            resolved: annotation.resolved,
        })
    }

    /// Revert the optimistic flip if the backend refused it.
    pub fn finish_toggle_resolved(
        &mut self,
        ticket: ToggleTicket,
        result: Result<(), ProofError>,
    ) -> Result<(), ProofError> {
        if ticket.generation != self.generation {
            log::debug!("Update reply for annotation {} is from a closed page", ticket.id);
            return result;
        }
        if let Err(e) = result {
            if let Some(annotation) = self.annotations.iter_mut().find(|a| a.id == ticket.id) {
                annotation.resolved = !ticket.resolved;
            }
            log::error!("Updating annotation {} failed, reverted: {}", ticket.id, e);
            return Err(e);
        }
        Ok(())
    }

    // ------ REMOVE ------

    /// First half of the two-step delete. The caller must get an explicit
    /// confirmation before passing the request to [`Self::begin_remove`].
    pub fn request_remove(&self, id: &AnnotationId) -> Result<RemovalRequest, ProofError> {
        if self.annotation(id).is_none() {
            return Err(ProofError::NotFound(id.to_string()));
        }
        Ok(RemovalRequest { id: id.clone() })
    }

    /// Remove locally after confirmation.
    pub fn begin_remove(&mut self, request: RemovalRequest) -> Result<RemovalTicket, ProofError> {
        let index = self
            .annotations
            .iter()
            .position(|a| a.id == request.id)
            .ok_or_else(|| ProofError::NotFound(request.id.to_string()))?;
        let annotation = self.annotations.remove(index);
        if self.hovered.as_ref() == Some(&annotation.id) {
            self.hovered = None;
        }
        Ok(RemovalTicket {
            generation: self.generation,
            index,
            annotation,
        })
    }

    /// Put the annotation back where it was if the backend refused.
    pub fn finish_remove(
        &mut self,
        ticket: RemovalTicket,
        result: Result<(), ProofError>,
    ) -> Result<(), ProofError> {
        if ticket.generation != self.generation {
            log::debug!(
                "Removal reply for annotation {} is from a closed page",
                ticket.annotation.id
            );
            return result;
        }
        match result {
            Ok(()) => {
                log::info!("Removed annotation {}", ticket.annotation.id);
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "Removing annotation {} failed, restored: {}",
                    ticket.annotation.id,
                    e
                );
                if self.annotation(&ticket.annotation.id).is_none() {
                    let at = ticket.index.min(self.annotations.len());
                    self.annotations.insert(at, ticket.annotation);
                }
                Err(e)
            }
        }
    }

    // ------ INDEXING ------

    /// On-image numbers (1-based), by creation order among pointed,
    /// unresolved annotations.
    pub fn marker_numbers(&self) -> HashMap<AnnotationId, usize> {
        self.annotations
            .iter()
            .filter(|a| a.is_indexed())
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i + 1))
            .collect()
    }

    // ------ COMPOSED OPERATIONS ------

    pub async fn load<B: AnnotationBackend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Result<(), ProofError> {
        let page_id = self.page_id.clone();
        let result = backend.list_annotations(&page_id).await;
        self.apply_loaded(&page_id, result)
    }

    pub async fn confirm_draft<B: AnnotationBackend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
        scope: Scope,
        attachment: Option<String>,
    ) -> Result<Annotation, ProofError> {
        let new = self.prepare_confirm(text, scope, attachment)?;
        let result = backend.create_annotation(&CommentRecord::from(&new)).await;
        self.finish_confirm(result)
    }

    pub async fn toggle_resolved<B: AnnotationBackend + ?Sized>(
        &mut self,
        backend: &B,
        id: &AnnotationId,
    ) -> Result<(), ProofError> {
        let ticket = self.begin_toggle_resolved(id)?;
        let result = backend.update_annotation(ticket.id(), &ticket.patch()).await;
        self.finish_toggle_resolved(ticket, result)
    }

    pub async fn remove<B: AnnotationBackend + ?Sized>(
        &mut self,
        backend: &B,
        request: RemovalRequest,
    ) -> Result<(), ProofError> {
        let ticket = self.begin_remove(request)?;
        let result = backend.delete_annotation(ticket.id()).await;
        self.finish_remove(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationKind;
    use crate::backend::memory::MemoryBackend;
    use crate::geometry::{to_normalized, Bounds, ClientPoint, Placement};
    use futures::executor::block_on;
    use std::cell::Cell;
    use std::rc::Rc;

    fn pt(x: f64, y: f64) -> NormPoint {
        NormPoint::new(x, y).unwrap()
    }

    fn page() -> PageId {
        PageId::from("cover-v1")
    }

    fn loaded_store(backend: &MemoryBackend) -> AnnotationStore {
        let mut store = AnnotationStore::new(page());
        block_on(store.load(backend)).unwrap();
        store
    }

    fn add_pin(store: &mut AnnotationStore, backend: &MemoryBackend, text: &str) -> AnnotationId {
        store.begin_draft_pin(pt(0.5, 0.5));
        block_on(store.confirm_draft(backend, text, Scope::Pointed, None))
            .unwrap()
            .id
    }

    fn draw(store: &mut AnnotationStore, tool: StrokeTool, points: &[(f64, f64)]) {
        store.begin_draft_stroke(tool);
        for (x, y) in points {
            store.extend_draft_stroke(pt(*x, *y));
        }
        store.end_draft_stroke();
    }

    #[test]
    fn test_confirm_empty_draft_makes_no_call() {
        let backend = MemoryBackend::new();
        let mut store = AnnotationStore::new(page());
        let err = block_on(store.confirm_draft(&backend, "   ", Scope::Pointed, None)).unwrap_err();
        assert_eq!(err, ProofError::EmptyAnnotation);
        assert_eq!(backend.call_count(), 0);
        assert!(!store.is_saving());
    }

    #[test]
    fn test_pin_scenario() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        store.set_mode(AuthoringMode::Pin);

        let bounds = Bounds::new(50.0, 50.0, 300.0, 200.0);
        let point = to_normalized(ClientPoint::new(150.0, 100.0), bounds, Placement::Strict).unwrap();
        store.begin_draft_pin(point);
        assert_eq!(store.interaction_state(), InteractionState::PinPending);

        let ann = block_on(store.confirm_draft(&backend, "fix logo", Scope::Pointed, None)).unwrap();
        assert_eq!(ann.kind(), AnnotationKind::Pin);
        assert_eq!(ann.scope(), Scope::Pointed);
        let pos = ann.anchor.position().unwrap();
        assert!((pos.x() - 1.0 / 3.0).abs() < 1e-9);
        assert!((pos.y() - 0.25).abs() < 1e-9);
        assert_eq!(store.annotations().len(), 1);
        assert_eq!(*store.draft(), Draft::None);
        assert_eq!(store.interaction_state(), InteractionState::Idle);
        assert_eq!(backend.rows().len(), 1);
    }

    #[test]
    fn test_two_highlighter_cycles_make_one_annotation() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        store.set_mode(AuthoringMode::Stroke(StrokeTool::Highlighter));

        draw(&mut store, StrokeTool::Highlighter, &[(0.1, 0.1), (0.2, 0.2)]);
        store.begin_draft_stroke(StrokeTool::Highlighter);
        assert_eq!(store.interaction_state(), InteractionState::DrawingStroke);
        store.extend_draft_stroke(pt(0.5, 0.5));
        store.extend_draft_stroke(pt(0.6, 0.5));
        store.end_draft_stroke();

        match store.draft() {
            Draft::Strokes { segments, tool, .. } => {
                assert_eq!(segments.len(), 2);
                assert_eq!(*tool, StrokeTool::Highlighter);
            }
            other => panic!("unexpected draft {:?}", other),
        }

        let ann = block_on(store.confirm_draft(&backend, "", Scope::Pointed, None)).unwrap();
        assert_eq!(ann.kind(), AnnotationKind::Stroke);
        assert_eq!(store.annotations().len(), 1);

        let row = &backend.rows()[0];
        assert_eq!(row.drawing_tool.as_deref(), Some("highlighter"));
        let data = row.drawing_data.as_deref().unwrap();
        let parts: Vec<&str> = data.split('|').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.starts_with('M') && p.contains('L')));
        assert_eq!(row.x, None);
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        let mut store = AnnotationStore::new(page());
        store.begin_draft_stroke(StrokeTool::Pen);
        store.end_draft_stroke();
        assert_eq!(*store.draft(), Draft::None);
    }

    #[test]
    fn test_new_pin_discards_previous_draft() {
        let mut store = AnnotationStore::new(page());
        store.begin_draft_pin(pt(0.1, 0.1));
        store.begin_draft_pin(pt(0.9, 0.9));
        assert_eq!(*store.draft(), Draft::Pin(pt(0.9, 0.9)));

        draw(&mut store, StrokeTool::Pen, &[(0.2, 0.2)]);
        assert!(matches!(store.draft(), Draft::Strokes { .. }));
        store.begin_draft_stroke(StrokeTool::Highlighter);
        store.extend_draft_stroke(pt(0.3, 0.3));
        store.end_draft_stroke();
        match store.draft() {
            Draft::Strokes { tool, segments, .. } => {
                assert_eq!(*tool, StrokeTool::Highlighter);
                assert_eq!(segments.len(), 1);
            }
            other => panic!("unexpected draft {:?}", other),
        }
    }

    #[test]
    fn test_mode_switch_cancels_other_kind() {
        let mut store = AnnotationStore::new(page());
        draw(&mut store, StrokeTool::Pen, &[(0.2, 0.2), (0.3, 0.3)]);
        store.set_mode(AuthoringMode::Stroke(StrokeTool::Pen));
        assert!(!store.draft().is_empty());
        store.set_mode(AuthoringMode::Pin);
        assert_eq!(*store.draft(), Draft::None);

        store.begin_draft_pin(pt(0.4, 0.4));
        store.set_mode(AuthoringMode::View);
        assert_eq!(*store.draft(), Draft::Pin(pt(0.4, 0.4)));
        store.set_mode(AuthoringMode::Stroke(StrokeTool::Highlighter));
        assert_eq!(*store.draft(), Draft::None);
    }

    #[test]
    fn test_failed_confirm_keeps_draft() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        store.begin_draft_pin(pt(0.2, 0.7));
        backend.fail_next_request();
        let err = block_on(store.confirm_draft(&backend, "kerning", Scope::Pointed, None)).unwrap_err();
        assert!(matches!(err, ProofError::PersistenceFailure(_)));
        assert_eq!(*store.draft(), Draft::Pin(pt(0.2, 0.7)));
        assert!(store.annotations().is_empty());
        assert!(!store.is_saving());

        block_on(store.confirm_draft(&backend, "kerning", Scope::Pointed, None)).unwrap();
        assert_eq!(store.annotations().len(), 1);
    }

    #[test]
    fn test_general_scope_drops_position() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        store.begin_draft_pin(pt(0.2, 0.7));
        let ann = block_on(store.confirm_draft(
            &backend,
            "swap the hero photo",
            Scope::General,
            Some("memory://attachments/ref.png".into()),
        ))
        .unwrap();
        assert_eq!(ann.scope(), Scope::General);
        assert!(ann.anchor.position().is_none());
        assert_eq!(ann.attachment.as_deref(), Some("memory://attachments/ref.png"));
        assert!(backend.rows()[0].is_general);

        store.begin_draft_pin(pt(0.2, 0.7));
        let err = block_on(store.confirm_draft(&backend, "", Scope::General, None)).unwrap_err();
        assert_eq!(err, ProofError::EmptyAnnotation);
    }

    #[test]
    fn test_text_only_note_becomes_general() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        let ann = block_on(store.confirm_draft(&backend, "looks good", Scope::Pointed, None)).unwrap();
        assert_eq!(ann.scope(), Scope::General);
    }

    #[test]
    fn test_toggle_resolved_and_rollback() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        let id = add_pin(&mut store, &backend, "one");

        block_on(store.toggle_resolved(&backend, &id)).unwrap();
        assert!(store.annotation(&id).unwrap().resolved);
        assert!(backend.rows()[0].resolved);

        backend.fail_next_request();
        let err = block_on(store.toggle_resolved(&backend, &id)).unwrap_err();
        assert!(matches!(err, ProofError::PersistenceFailure(_)));
        assert!(store.annotation(&id).unwrap().resolved);
    }

    #[test]
    fn test_toggle_unknown_id() {
        let mut store = AnnotationStore::new(page());
        let err = store.begin_toggle_resolved(&AnnotationId::from("9")).unwrap_err();
        assert_eq!(err, ProofError::NotFound("9".into()));
    }

    #[test]
    fn test_remove_unknown_id_leaves_list() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        add_pin(&mut store, &backend, "keep me");
        let before = store.annotations().to_vec();
        let calls = backend.call_count();

        let err = store.request_remove(&AnnotationId::from("404")).unwrap_err();
        assert_eq!(err, ProofError::NotFound("404".into()));
        assert_eq!(store.annotations(), before.as_slice());
        assert_eq!(backend.call_count(), calls);
    }

    #[test]
    fn test_remove_missing_server_side_is_restored() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        let first = add_pin(&mut store, &backend, "first");
        let second = add_pin(&mut store, &backend, "second");
        add_pin(&mut store, &backend, "third");
        let before = store.annotations().to_vec();

        // Another session deleted it.
        block_on(backend.delete_annotation(&second)).unwrap();
        let request = store.request_remove(&second).unwrap();
        let err = block_on(store.remove(&backend, request)).unwrap_err();
        assert_eq!(err, ProofError::NotFound(second.to_string()));
        assert_eq!(store.annotations(), before.as_slice());

        let request = store.request_remove(&first).unwrap();
        block_on(store.remove(&backend, request)).unwrap();
        assert_eq!(store.annotations().len(), 2);
        assert!(store.annotation(&first).is_none());
    }

    #[test]
    fn test_marker_numbers_skip_resolved_and_general() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        let a = add_pin(&mut store, &backend, "a");
        let general = block_on(store.confirm_draft(&backend, "page note", Scope::General, None))
            .unwrap()
            .id;
        let b = add_pin(&mut store, &backend, "b");
        draw(&mut store, StrokeTool::Pen, &[(0.1, 0.1), (0.2, 0.1)]);
        let c = block_on(store.confirm_draft(&backend, "", Scope::Pointed, None))
            .unwrap()
            .id;
        block_on(store.toggle_resolved(&backend, &a)).unwrap();

        let numbers = store.marker_numbers();
        assert_eq!(numbers.get(&a), None);
        assert_eq!(numbers.get(&general), None);
        assert_eq!(numbers.get(&b), Some(&1));
        assert_eq!(numbers.get(&c), Some(&2));
    }

    #[test]
    fn test_load_orders_and_skips_bad_rows() {
        let mut store = AnnotationStore::new(page());
        let rows: Vec<CommentRecord> = serde_json::from_str(
            r#"[
                {"id":2,"content":"later","page_id":"cover-v1","x":0.1,"y":0.1,"created_at":"2024-02-02T00:00:00Z"},
                {"id":3,"content":"broken","page_id":"cover-v1","x":3.0,"y":0.1,"created_at":"2024-01-15T00:00:00Z"},
                {"id":1,"content":"earlier","page_id":"cover-v1","drawing_data":"M 0 0 L 0.5 0.5","drawing_tool":"pen","created_at":"2024-01-01T00:00:00Z"}
            ]"#,
        )
        .unwrap();
        store.apply_loaded(&page(), Ok(rows)).unwrap();
        let ids: Vec<&str> = store.annotations().iter().map(|a| a.id.0.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        for ann in store.annotations() {
            match ann.kind() {
                AnnotationKind::Pin => assert!(ann.anchor.segments().is_empty()),
                AnnotationKind::Stroke => assert!(ann.anchor.position().is_none()),
            }
        }
        assert!(store.is_loaded());
    }

    #[test]
    fn test_stale_listing_is_dropped() {
        let mut store = AnnotationStore::new(page());
        let rows: Vec<CommentRecord> = serde_json::from_str(
            r#"[{"id":1,"content":"elsewhere","page_id":"back","x":0.1,"y":0.1}]"#,
        )
        .unwrap();
        store.apply_loaded(&PageId::from("back"), Ok(rows)).unwrap();
        assert!(store.annotations().is_empty());
        assert!(!store.is_loaded());
    }

    #[test]
    fn test_remote_change_triggers_reload() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        let dirty = Rc::new(Cell::new(false));
        let flag = dirty.clone();
        let _sub = backend.subscribe(&page(), Rc::new(move || flag.set(true)));

        // Another session adds a note.
        let mut other = loaded_store(&backend);
        add_pin(&mut other, &backend, "from elsewhere");

        assert!(dirty.get());
        block_on(store.load(&backend)).unwrap();
        assert_eq!(store.annotations().len(), 1);
    }

    #[test]
    fn test_draft_is_frozen_while_saving() {
        let backend = MemoryBackend::new();
        let mut store = loaded_store(&backend);
        store.begin_draft_pin(pt(0.1, 0.1));
        let new = store.prepare_confirm("first", Scope::Pointed, None).unwrap();

        store.begin_draft_pin(pt(0.9, 0.9));
        draw(&mut store, StrokeTool::Pen, &[(0.2, 0.2), (0.3, 0.3)]);
        store.cancel_draft();
        assert_eq!(*store.draft(), Draft::Pin(pt(0.1, 0.1)));

        let row = block_on(backend.create_annotation(&CommentRecord::from(&new)));
        store.finish_confirm(row).unwrap();
        assert_eq!(*store.draft(), Draft::None);

        // Editing resumes once the save has settled.
        store.begin_draft_pin(pt(0.9, 0.9));
        assert_eq!(*store.draft(), Draft::Pin(pt(0.9, 0.9)));
    }

    #[test]
    fn test_mode_switch_during_failed_save_keeps_draft() {
        let mut store = AnnotationStore::new(page());
        store.set_mode(AuthoringMode::Pin);
        store.begin_draft_pin(pt(0.4, 0.6));
        store.prepare_confirm("move caption", Scope::Pointed, None).unwrap();

        store.set_mode(AuthoringMode::Stroke(StrokeTool::Pen));
        assert_eq!(store.mode(), AuthoringMode::Stroke(StrokeTool::Pen));

        let err = store
            .finish_confirm(Err(ProofError::PersistenceFailure("offline".into())))
            .unwrap_err();
        assert!(err.is_blocking());
        assert_eq!(*store.draft(), Draft::Pin(pt(0.4, 0.6)));
        assert!(!store.is_saving());
    }

    #[test]
    fn test_replies_for_a_closed_store_are_ignored() {
        let backend = MemoryBackend::new();
        let mut old = loaded_store(&backend);
        let first = add_pin(&mut old, &backend, "first");
        let second = add_pin(&mut old, &backend, "second");

        let toggle = old.begin_toggle_resolved(&first).unwrap();
        let request = old.request_remove(&second).unwrap();
        let removal = old.begin_remove(request).unwrap();

        // The page is closed and reopened before either reply lands.
        let mut reopened = loaded_store(&backend);
        assert_ne!(reopened.generation(), old.generation());
        block_on(backend.delete_annotation(&second)).unwrap();
        block_on(reopened.load(&backend)).unwrap();
        let before = reopened.annotations().to_vec();

        let failure = ProofError::PersistenceFailure("timeout".into());
        assert!(reopened.finish_remove(removal, Err(failure.clone())).is_err());
        assert!(reopened.finish_toggle_resolved(toggle, Err(failure)).is_err());
        assert_eq!(reopened.annotations(), before.as_slice());
        assert!(reopened.annotation(&second).is_none());
        assert!(!reopened.annotation(&first).unwrap().resolved);
    }
}
