// src/annotation.rs
use crate::geometry::NormPoint;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier assigned by the backend.
///
/// Backends hand these out either as JSON strings or numbers; both are kept as
/// their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AnnotationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PageId(pub String);

fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

impl<'de> Deserialize<'de> for AnnotationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        opaque_id(deserializer).map(AnnotationId)
    }
}

impl<'de> Deserialize<'de> for PageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        opaque_id(deserializer).map(PageId)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        PageId(s.to_string())
    }
}

impl From<&str> for AnnotationId {
    fn from(s: &str) -> Self {
        AnnotationId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeTool {
    Pen,
    Highlighter,
}

impl StrokeTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeTool::Pen => "pen",
            StrokeTool::Highlighter => "highlighter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pen" => Some(StrokeTool::Pen),
            "highlighter" => Some(StrokeTool::Highlighter),
            _ => None,
        }
    }
}

/// One pointer-down/up segment of freehand ink.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrokePath {
    points: Vec<NormPoint>,
}

impl StrokePath {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_points(points: Vec<NormPoint>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: NormPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[NormPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Where an annotation sits on its page.
#[derive(Debug, Clone, PartialEq)]
pub enum Anchor {
    Pin(NormPoint),
    /// Always holds at least one non-empty segment.
    Stroke {
        tool: StrokeTool,
        segments: Vec<StrokePath>,
    },
    /// General scope: applies to the whole page.
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Pin,
    Stroke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Pointed,
    General,
}

impl Anchor {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Anchor::Stroke { .. } => AnnotationKind::Stroke,
            // General notes travel as pins without a position.
            Anchor::Pin(_) | Anchor::Page => AnnotationKind::Pin,
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Anchor::Page => Scope::General,
            _ => Scope::Pointed,
        }
    }

    pub fn position(&self) -> Option<NormPoint> {
        match self {
            Anchor::Pin(p) => Some(*p),
            _ => None,
        }
    }

    pub fn segments(&self) -> &[StrokePath] {
        match self {
            Anchor::Stroke { segments, .. } => segments,
            _ => &[],
        }
    }

    pub fn tool(&self) -> Option<StrokeTool> {
        match self {
            Anchor::Stroke { tool, .. } => Some(*tool),
            _ => None,
        }
    }
}

/// A persisted annotation on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub id: AnnotationId,
    pub page_id: PageId,
    pub anchor: Anchor,
    pub text: Option<String>,
    pub attachment: Option<String>,
    pub resolved: bool,
    /// Assigned by the backend; used for ordering.
    pub created_at: String,
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        self.anchor.kind()
    }

    pub fn scope(&self) -> Scope {
        self.anchor.scope()
    }

    /// Whether the annotation gets an on-image index number.
    pub fn is_indexed(&self) -> bool {
        self.scope() == Scope::Pointed && !self.resolved
    }
}

/// Confirmed draft content, ready to hand to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub page_id: PageId,
    pub anchor: Anchor,
    pub text: Option<String>,
    pub attachment: Option<String>,
}

/// Unsaved annotation under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Draft {
    #[default]
    None,
    Pin(NormPoint),
    Strokes {
        tool: StrokeTool,
        segments: Vec<StrokePath>,
        /// Segment being drawn while the pointer is down.
        current: Option<StrokePath>,
    },
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        match self {
            Draft::None => true,
            Draft::Pin(_) => false,
            Draft::Strokes {
                segments, current, ..
            } => segments.is_empty() && current.as_ref().map_or(true, |c| c.is_empty()),
        }
    }
}

/// Which authoring tool is active. Only one drawing mode at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthoringMode {
    /// Pan and zoom only.
    #[default]
    View,
    Pin,
    Stroke(StrokeTool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    PinPending,
    DrawingStroke,
}
