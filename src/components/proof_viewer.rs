// src/components/proof_viewer.rs
use crate::annotation::{
    AnnotationId, AuthoringMode, Draft, InteractionState, NewAnnotation, PageId, Scope, StrokeTool,
};
use crate::app_config::PageInfo;
use crate::backend::{BackendHandle, Subscription};
use crate::error::ProofError;
use crate::geometry::{client_point, to_normalized, to_viewport, Bounds, ClientPoint, Placement};
use crate::render::{list_entries, render_plan, svg_path, ListEntry, RenderItem};
use crate::report::AnnotationReport;
use crate::store::{AnnotationStore, RemovalTicket, ToggleTicket};
use crate::utils::{download_text, resource_url, upload_name};
use crate::wire::CommentRecord;
use gloo::dialogs::{alert, confirm};
use gloo::file::File;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlImageElement, HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ProofViewerProps {
    pub backend: BackendHandle,
    pub page: PageInfo,
}

pub enum ProofViewerMsg {
    Load,
    Loaded(PageId, Result<Vec<CommentRecord>, ProofError>),
    RemoteChange,
    SetMode(AuthoringMode),
    PointerDown(ClientPoint),
    PointerMove(ClientPoint),
    PointerUp,
    UpdateImageScale(f64),
    ResetView,
    ImageLoadedWithDimensions(u32, u32),
    DraftTextChanged(String),
    GeneralToggled(bool),
    AttachmentPicked(Option<File>),
    ConfirmDraft,
    // Replies to a save carry the generation of the store that issued it.
    AttachmentUploaded(u64, Result<String, ProofError>),
    Created(u64, Result<CommentRecord, ProofError>),
    CancelDraft,
    ToggleResolved(AnnotationId),
    Toggled(ToggleTicket, Result<(), ProofError>),
    RemoveRequested(AnnotationId),
    Removed(RemovalTicket, Result<(), ProofError>),
    Hover(Option<AnnotationId>),
    ExportReport,
}

pub struct ProofViewer {
    store: AnnotationStore,
    subscription: Option<Subscription>,
    load_error: Option<String>,
    // zoom and pan
    image_scale: f32,
    image_offset_x: f32,
    image_offset_y: f32,
    // panning state
    dragging: bool,
    last_mouse_x: f32,
    last_mouse_y: f32,
    // image intrinsic dimensions (natural)
    image_nat_w: u32,
    image_nat_h: u32,
    image_ref: NodeRef,
    // draft form
    draft_text: String,
    draft_general: bool,
    attachment: Option<File>,
    pending: Option<NewAnnotation>,
    prompt: Option<&'static str>,
}

impl Component for ProofViewer {
    type Message = ProofViewerMsg;
    type Properties = ProofViewerProps;

    fn create(ctx: &Context<Self>) -> Self {
        let page = &ctx.props().page;
        ctx.link().send_message(ProofViewerMsg::Load);
        Self {
            store: AnnotationStore::new(page.id.clone()),
            subscription: Some(Self::subscribe(ctx)),
            load_error: None,
            image_scale: 1.0,
            image_offset_x: 0.0,
            image_offset_y: 0.0,
            dragging: false,
            last_mouse_x: 0.0,
            last_mouse_y: 0.0,
            image_nat_w: 0,
            image_nat_h: 0,
            image_ref: NodeRef::default(),
            draft_text: String::new(),
            draft_general: false,
            attachment: None,
            pending: None,
            prompt: None,
        }
    }

    fn changed(&mut self, ctx: &Context<Self>, old: &Self::Properties) -> bool {
        let props = ctx.props();
        if props.page.id == old.page.id && props.backend == old.backend {
            return props.page != old.page;
        }
        // Closing a page drops its annotations; the new page loads fresh.
        self.subscription = None;
        self.store = AnnotationStore::new(props.page.id.clone());
        self.subscription = Some(Self::subscribe(ctx));
        self.load_error = None;
        self.image_scale = 1.0;
        self.image_offset_x = 0.0;
        self.image_offset_y = 0.0;
        self.image_nat_w = 0;
        self.image_nat_h = 0;
        self.reset_form();
        ctx.link().send_message(ProofViewerMsg::Load);
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        let generation = self.store.generation();
        match msg {
            ProofViewerMsg::Load | ProofViewerMsg::RemoteChange => {
                let backend = ctx.props().backend.clone();
                let link = ctx.link().clone();
                let page_id = self.store.page_id().clone();
                spawn_local(async move {
                    let result = backend.list_annotations(&page_id).await;
                    link.send_message(ProofViewerMsg::Loaded(page_id, result));
                });
                false
            }
            ProofViewerMsg::Loaded(page_id, result) => {
                match self.store.apply_loaded(&page_id, result) {
                    Ok(()) => self.load_error = None,
                    Err(e) => {
                        log::error!("Failed to load annotations: {}", e);
                        self.load_error = Some(e.to_string());
                    }
                }
                true
            }
            ProofViewerMsg::SetMode(mode) => {
                self.store.set_mode(mode);
                self.dragging = false;
                true
            }
            ProofViewerMsg::PointerDown(point) => self.pointer_down(point),
            ProofViewerMsg::PointerMove(point) => self.pointer_move(point),
            ProofViewerMsg::PointerUp => {
                self.dragging = false;
                if self.store.interaction_state() == InteractionState::DrawingStroke {
                    self.store.end_draft_stroke();
                    return true;
                }
                false
            }
            ProofViewerMsg::UpdateImageScale(factor) => {
                self.image_scale = (self.image_scale * (factor as f32)).clamp(0.2, 8.0);
                true
            }
            ProofViewerMsg::ResetView => {
                self.image_scale = 1.0;
                self.image_offset_x = 0.0;
                self.image_offset_y = 0.0;
                true
            }
            ProofViewerMsg::ImageLoadedWithDimensions(width, height) => {
                self.image_nat_w = width;
                self.image_nat_h = height;
                true
            }
            ProofViewerMsg::DraftTextChanged(text) => {
                self.draft_text = text;
                self.prompt = None;
                false
            }
            ProofViewerMsg::GeneralToggled(general) => {
                self.draft_general = general;
                true
            }
            ProofViewerMsg::AttachmentPicked(file) => {
                self.attachment = file;
                true
            }
            ProofViewerMsg::ConfirmDraft => {
                if self.store.is_saving() {
                    return false;
                }
                let scope = if self.draft_general {
                    Scope::General
                } else {
                    Scope::Pointed
                };
                match self.store.prepare_confirm(&self.draft_text, scope, None) {
                    Ok(new) => {
                        self.prompt = None;
                        match self.attachment.clone() {
                            Some(file) => {
                                self.pending = Some(new);
                                self.upload_attachment(ctx, file);
                            }
                            None => self.create(ctx, new),
                        }
                    }
                    Err(ProofError::EmptyAnnotation) => {
                        self.prompt = Some("Add a note, a pin or a drawing first.");
                    }
                    Err(e) => report_error(&e),
                }
                true
            }
            ProofViewerMsg::AttachmentUploaded(issued_by, result) => {
                if issued_by != generation {
                    return false;
                }
                let pending = self.pending.take();
                match (result, pending) {
                    (Ok(url), Some(mut new)) => {
                        new.attachment = Some(url);
                        self.create(ctx, new);
                    }
                    (Err(e), _) => {
                        let _ = self.store.finish_confirm(Err(e.clone()));
                        report_error(&e);
                    }
                    (Ok(_), None) => {}
                }
                true
            }
            ProofViewerMsg::Created(issued_by, result) => {
                if issued_by != generation {
                    return false;
                }
                match self.store.finish_confirm(result) {
                    Ok(_) => self.reset_form(),
                    Err(e) => report_error(&e),
                }
                true
            }
            ProofViewerMsg::CancelDraft => {
                self.store.cancel_draft();
                self.reset_form();
                true
            }
            ProofViewerMsg::ToggleResolved(id) => {
                match self.store.begin_toggle_resolved(&id) {
                    Ok(ticket) => {
                        let backend = ctx.props().backend.clone();
                        let link = ctx.link().clone();
                        spawn_local(async move {
                            let result = backend.update_annotation(ticket.id(), &ticket.patch()).await;
                            link.send_message(ProofViewerMsg::Toggled(ticket, result));
                        });
                    }
                    Err(e) => report_error(&e),
                }
                true
            }
            ProofViewerMsg::Toggled(ticket, result) => {
                if let Err(e) = self.store.finish_toggle_resolved(ticket, result) {
                    report_error(&e);
                }
                true
            }
            ProofViewerMsg::RemoveRequested(id) => {
                let request = match self.store.request_remove(&id) {
                    Ok(request) => request,
                    Err(e) => {
                        report_error(&e);
                        return true;
                    }
                };
                if !confirm("Delete this annotation? This cannot be undone.") {
                    return false;
                }
                match self.store.begin_remove(request) {
                    Ok(ticket) => {
                        let backend = ctx.props().backend.clone();
                        let link = ctx.link().clone();
                        spawn_local(async move {
                            let result = backend.delete_annotation(ticket.id()).await;
                            link.send_message(ProofViewerMsg::Removed(ticket, result));
                        });
                    }
                    Err(e) => report_error(&e),
                }
                true
            }
            ProofViewerMsg::Removed(ticket, result) => {
                if let Err(e) = self.store.finish_remove(ticket, result) {
                    report_error(&e);
                }
                true
            }
            ProofViewerMsg::Hover(id) => {
                if self.store.hovered() == id.as_ref() {
                    return false;
                }
                self.store.set_hovered(id);
                true
            }
            ProofViewerMsg::ExportReport => {
                let report = AnnotationReport::build(&ctx.props().page, &self.store);
                match report.to_json() {
                    Ok(json) => {
                        if let Err(e) = download_text(&report.file_name(), "application/json", &json) {
                            log::error!("Report download failed: {:?}", e);
                        }
                    }
                    Err(e) => log::error!("Report serialization failed: {}", e),
                }
                false
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="proof-viewer-container">
                { self.render_controls(ctx) }
                <div class="viewer-content">
                    { self.render_image_panel(ctx) }
                    <aside class="annotation-sidebar">
                        { self.render_draft_form(ctx) }
                        { self.render_list(ctx) }
                    </aside>
                </div>
            </div>
        }
    }
}

fn report_error(err: &ProofError) {
    if err.is_blocking() {
        alert(&err.to_string());
    } else {
        log::debug!("Ignored: {}", err);
    }
}

impl ProofViewer {
    fn subscribe(ctx: &Context<Self>) -> Subscription {
        let link = ctx.link().clone();
        ctx.props().backend.subscribe(
            &ctx.props().page.id,
            Rc::new(move || link.send_message(ProofViewerMsg::RemoteChange)),
        )
    }

    fn reset_form(&mut self) {
        self.draft_text.clear();
        self.draft_general = false;
        self.attachment = None;
        self.pending = None;
        self.prompt = None;
    }

    /// Bounds of the image element itself, after zoom and pan transforms.
    fn image_bounds(&self) -> Option<Bounds> {
        self.image_ref
            .cast::<web_sys::Element>()
            .map(|el| Bounds::from_dom_rect(&el.get_bounding_client_rect()))
    }

    fn pointer_down(&mut self, point: ClientPoint) -> bool {
        match self.store.mode() {
            AuthoringMode::View => {
                self.dragging = true;
                self.last_mouse_x = point.x as f32;
                self.last_mouse_y = point.y as f32;
                false
            }
            AuthoringMode::Pin => {
                let Some(bounds) = self.image_bounds() else {
                    return false;
                };
                match to_normalized(point, bounds, Placement::Strict) {
                    Ok(p) => {
                        self.store.begin_draft_pin(p);
                        true
                    }
                    Err(e) => {
                        log::debug!("Pin not placed: {}", e);
                        false
                    }
                }
            }
            AuthoringMode::Stroke(tool) => {
                let Some(bounds) = self.image_bounds() else {
                    return false;
                };
                self.store.begin_draft_stroke(tool);
                if let Ok(p) = to_normalized(point, bounds, Placement::Clamp) {
                    self.store.extend_draft_stroke(p);
                }
                true
            }
        }
    }

    fn pointer_move(&mut self, point: ClientPoint) -> bool {
        if self.dragging {
            let (x, y) = (point.x as f32, point.y as f32);
            self.image_offset_x += x - self.last_mouse_x;
            self.image_offset_y += y - self.last_mouse_y;
            self.last_mouse_x = x;
            self.last_mouse_y = y;
            return true;
        }
        if self.store.interaction_state() != InteractionState::DrawingStroke {
            return false;
        }
        match self
            .image_bounds()
            .map(|b| to_normalized(point, b, Placement::Clamp))
        {
            Some(Ok(p)) => self.store.extend_draft_stroke(p),
            _ => false,
        }
    }

    fn create(&self, ctx: &Context<Self>, new: NewAnnotation) {
        let backend = ctx.props().backend.clone();
        let link = ctx.link().clone();
        let record = CommentRecord::from(&new);
        let generation = self.store.generation();
        spawn_local(async move {
            let result = backend.create_annotation(&record).await;
            link.send_message(ProofViewerMsg::Created(generation, result));
        });
    }

    fn upload_attachment(&self, ctx: &Context<Self>, file: File) {
        let backend = ctx.props().backend.clone();
        let link = ctx.link().clone();
        let generation = self.store.generation();
        let name = upload_name(&self.store.page_id().0, js_sys::Date::now() as u64, &file.name());
        spawn_local(async move {
            let result = match gloo::file::futures::read_as_bytes(&file).await {
                Ok(bytes) => backend.upload(&name, bytes).await,
                Err(e) => Err(ProofError::PersistenceFailure(format!(
                    "reading {}: {}",
                    file.name(),
                    e
                ))),
            };
            link.send_message(ProofViewerMsg::AttachmentUploaded(generation, result));
        });
    }

    fn render_controls(&self, ctx: &Context<Self>) -> Html {
        let mode = self.store.mode();
        let mode_button = |label: &'static str, title: &'static str, target: AuthoringMode| {
            let onclick = ctx.link().callback(move |_| ProofViewerMsg::SetMode(target));
            html! {
                <button class={if mode == target { "active" } else { "" }} {onclick} {title}>{label}</button>
            }
        };
        let zoom_in = ctx.link().callback(|_| ProofViewerMsg::UpdateImageScale(1.2));
        let zoom_out = ctx.link().callback(|_| ProofViewerMsg::UpdateImageScale(0.8));
        let reset = ctx.link().callback(|_| ProofViewerMsg::ResetView);
        let export = ctx.link().callback(|_| ProofViewerMsg::ExportReport);

        html! {
            <div class="controls-panel">
                <div class="mode-toggles">
                    { mode_button("✋ Pan", "Pan and zoom", AuthoringMode::View) }
                    { mode_button("📍 Pin", "Click the page to pin a note", AuthoringMode::Pin) }
                    { mode_button("✏️ Pen", "Draw on the page", AuthoringMode::Stroke(StrokeTool::Pen)) }
                    { mode_button("🖍️ Highlight", "Highlight an area", AuthoringMode::Stroke(StrokeTool::Highlighter)) }
                </div>
                <div class="image-controls">
                    <button onclick={zoom_in}>{"🔍 +"}</button>
                    <button onclick={zoom_out}>{"🔍 -"}</button>
                    <span class="zoom-level">{format!("{}%", (self.image_scale * 100.0) as i32)}</span>
                    <button onclick={reset} title="Reset view">{"⟲ Reset"}</button>
                    <button onclick={export} title="Download the annotation report">{"⬇ Report"}</button>
                </div>
            </div>
        }
    }

    fn render_image_panel(&self, ctx: &Context<Self>) -> Html {
        let page = &ctx.props().page;
        let use_w = if self.image_nat_w > 0 { self.image_nat_w } else { page.width };
        let use_h = if self.image_nat_h > 0 { self.image_nat_h } else { page.height };
        let size_style = if use_w > 0 && use_h > 0 {
            format!("width: {}px; height: {}px;", use_w, use_h)
        } else {
            String::new()
        };

        let onwheel = ctx.link().callback(|e: WheelEvent| {
            e.prevent_default();
            let factor = if e.delta_y() < 0.0 { 1.1 } else { 0.9 };
            ProofViewerMsg::UpdateImageScale(factor)
        });
        let onmousedown = ctx.link().batch_callback(|e: MouseEvent| {
            e.prevent_default();
            client_point(&e).map(ProofViewerMsg::PointerDown)
        });
        let onmousemove = ctx
            .link()
            .batch_callback(|e: MouseEvent| client_point(&e).map(ProofViewerMsg::PointerMove));
        let onmouseup = ctx.link().callback(|_: MouseEvent| ProofViewerMsg::PointerUp);
        let onmouseleave = ctx.link().callback(|_: MouseEvent| ProofViewerMsg::PointerUp);
        // Touch input; preventing default suppresses the emulated mouse events.
        let ontouchstart = ctx.link().batch_callback(|e: TouchEvent| {
            e.prevent_default();
            client_point(&e).map(ProofViewerMsg::PointerDown)
        });
        let ontouchmove = ctx.link().batch_callback(|e: TouchEvent| {
            e.prevent_default();
            client_point(&e).map(ProofViewerMsg::PointerMove)
        });
        let ontouchend = ctx.link().callback(|e: TouchEvent| {
            e.prevent_default();
            ProofViewerMsg::PointerUp
        });

        let onload = ctx.link().batch_callback(|e: Event| {
            e.target()
                .and_then(|t| t.dyn_into::<HtmlImageElement>().ok())
                .map(|img| {
                    ProofViewerMsg::ImageLoadedWithDimensions(img.natural_width(), img.natural_height())
                })
        });

        let cursor = match self.store.mode() {
            AuthoringMode::View if self.dragging => "grabbing",
            AuthoringMode::View => "grab",
            _ => "crosshair",
        };
        let transform_style = format!(
            "transform-origin: 0 0; transform: translate({}px, {}px) scale({}); position: relative; display: inline-block;",
            self.image_offset_x, self.image_offset_y, self.image_scale
        );

        html! {
            <div class="image-panel">
                if let Some(err) = &self.load_error {
                    <div class="error">{format!("Could not load annotations: {}", err)}</div>
                }
                <div
                    class="image-container"
                    {onwheel}
                    {onmousedown}
                    {onmousemove}
                    {onmouseup}
                    {onmouseleave}
                    {ontouchstart}
                    {ontouchmove}
                    {ontouchend}
                    style={format!("position: relative; overflow: hidden; touch-action: none; cursor: {};", cursor)}
                >
                    <div class="image-and-overlay" style={transform_style}>
                        <img
                            ref={self.image_ref.clone()}
                            src={resource_url(&page.image_url)}
                            onload={onload}
                            draggable="false"
                            style={format!("display:block; max-width: none; max-height: none; {}", size_style)}
                        />
                        { self.render_overlay() }
                    </div>
                </div>
            </div>
        }
    }

    /// Strokes in an SVG spanning the image, then pins as positioned markers.
    fn render_overlay(&self) -> Html {
        let plan = render_plan(&self.store);
        let strokes = plan.iter().filter_map(|item| match item {
            RenderItem::Stroke { segments, style, .. } | RenderItem::DraftStroke { segments, style } => {
                Some(html! {
                    <g
                        stroke={style.color}
                        stroke-width={style.width_px.to_string()}
                        stroke-opacity={style.opacity.to_string()}
                        fill="none"
                        stroke-linecap="round"
                        stroke-linejoin="round"
                    >
                        { for segments.iter().map(|s| html! {
                            <path d={svg_path(s)} vector-effect="non-scaling-stroke" />
                        }) }
                    </g>
                })
            }
            _ => None,
        });
        let pins = plan.iter().enumerate().filter_map(|(z, item)| match item {
            RenderItem::Pin { number, position, color, highlighted, .. } => {
                let (left, top) = to_viewport(*position);
                let scale = if *highlighted { 1.4 } else { 1.0 };
                Some(html! {
                    <div
                        class={classes!("pin-marker", highlighted.then_some("hovered"))}
                        style={format!(
                            "position: absolute; left: {:.4}%; top: {:.4}%; transform: translate(-50%, -100%) scale({}); z-index: {}; background: {};",
                            left, top, scale, z + 1, color
                        )}
                    >
                        { number.map(|n| n.to_string()).unwrap_or_default() }
                    </div>
                })
            }
            RenderItem::DraftPin { position } => {
                let (left, top) = to_viewport(*position);
                Some(html! {
                    <div
                        class="pin-marker draft pulsing"
                        style={format!(
                            "position: absolute; left: {:.4}%; top: {:.4}%; transform: translate(-50%, -100%); z-index: {};",
                            left, top, z + 1
                        )}
                    >{"+"}</div>
                })
            }
            _ => None,
        });

        html! {
            <>
                <svg
                    class="overlay-svg"
                    style="position: absolute; top: 0; left: 0; width: 100%; height: 100%; pointer-events: none;"
                    viewBox="0 0 1 1"
                    preserveAspectRatio="none"
                    xmlns="http://www.w3.org/2000/svg"
                >
                    { for strokes }
                </svg>
                { for pins }
            </>
        }
    }

    fn render_draft_form(&self, ctx: &Context<Self>) -> Html {
        let draft = self.store.draft();
        let heading = match draft {
            Draft::Pin(_) => "New pinned note",
            Draft::Strokes { segments, .. } if !segments.is_empty() => "New drawing",
            _ => "New note",
        };
        let oninput = ctx.link().callback(|e: InputEvent| {
            let area: HtmlTextAreaElement = e.target_unchecked_into();
            ProofViewerMsg::DraftTextChanged(area.value())
        });
        let ongeneral = ctx.link().callback(|e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            ProofViewerMsg::GeneralToggled(input.checked())
        });
        let onfile = ctx.link().callback(|e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let file = input.files().and_then(|files| files.get(0)).map(File::from);
            ProofViewerMsg::AttachmentPicked(file)
        });
        let onsave = ctx.link().callback(|_| ProofViewerMsg::ConfirmDraft);
        let oncancel = ctx.link().callback(|_| ProofViewerMsg::CancelDraft);
        let saving = self.store.is_saving();

        html! {
            <div class={classes!("draft-form", (!draft.is_empty()).then_some("has-draft"))}>
                <h3>{heading}</h3>
                <textarea
                    placeholder="Describe the change…"
                    value={self.draft_text.clone()}
                    {oninput}
                />
                <label>
                    <input type="checkbox" checked={self.draft_general} onchange={ongeneral} />
                    {" Whole page"}
                </label>
                <input type="file" onchange={onfile} />
                if let Some(prompt) = self.prompt {
                    <p class="inline-prompt">{prompt}</p>
                }
                <div class="draft-actions">
                    <button onclick={onsave} disabled={saving}>{ if saving { "Saving…" } else { "Save" } }</button>
                    <button onclick={oncancel} disabled={saving}>{"Cancel"}</button>
                </div>
            </div>
        }
    }

    fn render_list(&self, ctx: &Context<Self>) -> Html {
        if !self.store.is_loaded() {
            return html! { <div class="loading"><p>{"Loading annotations…"}</p></div> };
        }
        let entries = list_entries(&self.store);
        if entries.is_empty() {
            return html! { <p class="empty-list">{"No annotations yet."}</p> };
        }
        html! {
            <ol class="annotation-list">
                { for entries.iter().map(|entry| self.render_entry(ctx, entry)) }
            </ol>
        }
    }

    fn render_entry(&self, ctx: &Context<Self>, entry: &ListEntry) -> Html {
        let onmouseenter = {
            let id = entry.id.clone();
            ctx.link().callback(move |_| ProofViewerMsg::Hover(Some(id.clone())))
        };
        let onmouseleave = ctx.link().callback(|_| ProofViewerMsg::Hover(None));
        let ontoggle = {
            let id = entry.id.clone();
            ctx.link().callback(move |_| ProofViewerMsg::ToggleResolved(id.clone()))
        };
        let onremove = {
            let id = entry.id.clone();
            ctx.link().callback(move |_| ProofViewerMsg::RemoveRequested(id.clone()))
        };
        let class = classes!(
            "annotation-entry",
            entry.struck.then_some("resolved"),
            entry.hovered.then_some("hovered")
        );
        let text = entry.text.clone().unwrap_or_else(|| "(drawing)".to_string());

        html! {
            <li {class} {onmouseenter} {onmouseleave}>
                <span class="entry-icon" title={entry.icon.title()} style={format!("color: {};", entry.color)}>
                    { entry.icon.glyph() }
                    { entry.number.map(|n| format!(" {}", n)).unwrap_or_default() }
                </span>
                <span class="entry-text">
                    if entry.struck { <s>{text}</s> } else { {text} }
                </span>
                if let Some(url) = &entry.attachment {
                    <a class="entry-attachment" href={url.clone()} target="_blank">{"📎"}</a>
                }
                <span class="entry-date">{ entry.created_at.clone() }</span>
                <button onclick={ontoggle}>{ if entry.struck { "Reopen" } else { "Resolve" } }</button>
                <button class="danger" onclick={onremove} title="Delete">{"🗑"}</button>
            </li>
        }
    }
}
