// src/render.rs
//
// Turns store state into an ordered list of things to paint over the page
// image, plus the side-list rows. No DOM access here; the viewer component
// maps each item onto SVG or positioned markup.

use crate::annotation::{
    Anchor, AnnotationId, AnnotationKind, Draft, Scope, StrokePath, StrokeTool,
};
use crate::geometry::NormPoint;
use crate::store::AnnotationStore;

pub const ACCENT: &str = "#e11d48";
pub const GENERAL_ACCENT: &str = "#7c3aed";
pub const DRAFT_INK: &str = "#f59e0b";
pub const GENERAL_PIN: &str = "#2563eb";

const PEN_WIDTH_PX: f64 = 2.0;
const HIGHLIGHTER_WIDTH_PX: f64 = 14.0;
const HIGHLIGHTER_OPACITY: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: &'static str,
    pub width_px: f64,
    pub opacity: f64,
}

impl StrokeStyle {
    pub fn for_stroke(tool: StrokeTool, scope: Scope) -> Self {
        match (tool, scope) {
            (StrokeTool::Pen, Scope::Pointed) => Self::pen(ACCENT),
            (StrokeTool::Pen, Scope::General) => Self::pen(GENERAL_ACCENT),
            (StrokeTool::Highlighter, _) => Self::highlighter(ACCENT),
        }
    }

    /// Unsaved ink, so it can be told apart from saved strokes.
    pub fn draft(tool: StrokeTool) -> Self {
        match tool {
            StrokeTool::Pen => Self::pen(DRAFT_INK),
            StrokeTool::Highlighter => Self::highlighter(DRAFT_INK),
        }
    }

    fn pen(color: &'static str) -> Self {
        Self {
            color,
            width_px: PEN_WIDTH_PX,
            opacity: 1.0,
        }
    }

    fn highlighter(color: &'static str) -> Self {
        Self {
            color,
            width_px: HIGHLIGHTER_WIDTH_PX,
            opacity: HIGHLIGHTER_OPACITY,
        }
    }
}

pub fn marker_color(scope: Scope) -> &'static str {
    match scope {
        Scope::Pointed => ACCENT,
        Scope::General => GENERAL_PIN,
    }
}

/// Paint layers, lowest first. The page image sits beneath all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Stroke,
    DraftStroke,
    Pin,
    DraftPin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderItem {
    Stroke {
        id: AnnotationId,
        segments: Vec<StrokePath>,
        style: StrokeStyle,
    },
    DraftStroke {
        segments: Vec<StrokePath>,
        style: StrokeStyle,
    },
    Pin {
        id: AnnotationId,
        number: Option<usize>,
        position: NormPoint,
        color: &'static str,
        highlighted: bool,
    },
    /// Unsaved pin; drawn above every persisted pin and pulsing.
    DraftPin { position: NormPoint },
}

impl RenderItem {
    pub fn layer(&self) -> Layer {
        match self {
            RenderItem::Stroke { .. } => Layer::Stroke,
            RenderItem::DraftStroke { .. } => Layer::DraftStroke,
            RenderItem::Pin { .. } => Layer::Pin,
            RenderItem::DraftPin { .. } => Layer::DraftPin,
        }
    }
}

/// Everything to paint over the page, in stacking order. Resolved
/// annotations are left out entirely.
pub fn render_plan(store: &AnnotationStore) -> Vec<RenderItem> {
    let numbers = store.marker_numbers();
    let hovered = store.hovered();
    let mut items = Vec::new();

    for annotation in store.annotations().iter().filter(|a| !a.resolved) {
        match &annotation.anchor {
            Anchor::Stroke { tool, segments } => items.push(RenderItem::Stroke {
                id: annotation.id.clone(),
                segments: segments.clone(),
                style: StrokeStyle::for_stroke(*tool, annotation.scope()),
            }),
            Anchor::Pin(position) => items.push(RenderItem::Pin {
                id: annotation.id.clone(),
                number: numbers.get(&annotation.id).copied(),
                position: *position,
                color: marker_color(annotation.scope()),
                highlighted: hovered == Some(&annotation.id),
            }),
            Anchor::Page => {}
        }
    }

    match store.draft() {
        Draft::Strokes {
            tool,
            segments,
            current,
        } => {
            let mut all: Vec<StrokePath> = segments.clone();
            if let Some(open) = current.as_ref().filter(|c| !c.is_empty()) {
                all.push(open.clone());
            }
            if !all.is_empty() {
                items.push(RenderItem::DraftStroke {
                    segments: all,
                    style: StrokeStyle::draft(*tool),
                });
            }
        }
        Draft::Pin(position) => items.push(RenderItem::DraftPin {
            position: *position,
        }),
        Draft::None => {}
    }

    // Stable: creation order within a layer, hovered pin raised to the top
    // of its layer.
    items.sort_by_key(|item| {
        let raised = matches!(item, RenderItem::Pin { highlighted: true, .. });
        (item.layer(), raised)
    });
    items
}

/// SVG path data for one segment in the `0 0 1 1` overlay viewBox. A single
/// point becomes a zero-length line so round caps draw a dot.
pub fn svg_path(segment: &StrokePath) -> String {
    let points = segment.points();
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            d.push(' ');
        }
        let cmd = if i == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{} {:.5} {:.5}", cmd, p.x(), p.y()));
    }
    if let [only] = points {
        d.push_str(&format!(" L {:.5} {:.5}", only.x(), only.y()));
    }
    d
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListIcon {
    Pin,
    Stroke(StrokeTool),
    General,
}

impl ListIcon {
    pub fn glyph(&self) -> &'static str {
        match self {
            ListIcon::Pin => "📍",
            ListIcon::Stroke(StrokeTool::Pen) => "✏️",
            ListIcon::Stroke(StrokeTool::Highlighter) => "🖍️",
            ListIcon::General => "📄",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ListIcon::Pin => "Pinned note",
            ListIcon::Stroke(StrokeTool::Pen) => "Pen drawing",
            ListIcon::Stroke(StrokeTool::Highlighter) => "Highlight",
            ListIcon::General => "Whole-page note",
        }
    }
}

/// One row of the side list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub id: AnnotationId,
    pub number: Option<usize>,
    pub icon: ListIcon,
    pub color: &'static str,
    pub text: Option<String>,
    pub attachment: Option<String>,
    /// Resolved rows stay listed, struck through.
    pub struck: bool,
    pub hovered: bool,
    pub created_at: String,
}

pub fn list_entries(store: &AnnotationStore) -> Vec<ListEntry> {
    let numbers = store.marker_numbers();
    store
        .annotations()
        .iter()
        .map(|a| {
            let icon = match (a.kind(), a.scope(), a.anchor.tool()) {
                (_, Scope::General, _) => ListIcon::General,
                (AnnotationKind::Stroke, _, Some(tool)) => ListIcon::Stroke(tool),
                _ => ListIcon::Pin,
            };
            ListEntry {
                id: a.id.clone(),
                number: numbers.get(&a.id).copied(),
                icon,
                color: marker_color(a.scope()),
                text: a.text.clone(),
                attachment: a.attachment.clone(),
                struck: a.resolved,
                hovered: store.hovered() == Some(&a.id),
                created_at: a.created_at.clone(),
            }
        })
        .collect()
}
