// src/geometry.rs
//
// Mapping between viewport pixels and normalized page space. Conversions are
// always made against the bounds of the image element being drawn over. The
// browser reports that rectangle after CSS transforms, so zoom and pan are
// already folded in and no zoom factor is divided out here.

use crate::error::ProofError;
use serde::Serialize;
use wasm_bindgen::JsCast;
use web_sys::{DomRect, Event, MouseEvent, TouchEvent};

/// A position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClientPoint {
    pub x: f64,
    pub y: f64,
}

impl ClientPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of the element drawn over, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn from_dom_rect(rect: &DomRect) -> Self {
        Self::new(rect.left(), rect.top(), rect.width(), rect.height())
    }

    fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }

    /// Inverse of [`to_normalized`].
    pub fn to_client(&self, point: NormPoint) -> ClientPoint {
        ClientPoint::new(
            self.left + point.x() * self.width,
            self.top + point.y() * self.height,
        )
    }
}

/// A coordinate expressed as a fraction of page width and height.
///
/// Both components are always inside `[0,1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormPoint {
    x: f64,
    y: f64,
}

impl NormPoint {
    pub fn new(x: f64, y: f64) -> Result<Self, ProofError> {
        if in_unit_range(x) && in_unit_range(y) {
            Ok(Self { x, y })
        } else {
            Err(ProofError::OutOfBounds { x, y })
        }
    }

    /// Clamp into range. Non-finite input is still rejected.
    pub fn clamped(x: f64, y: f64) -> Result<Self, ProofError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(ProofError::OutOfBounds { x, y });
        }
        Ok(Self {
            x: x.clamp(0.0, 1.0),
            y: y.clamp(0.0, 1.0),
        })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }
}

fn in_unit_range(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

/// How a caller treats points that land outside the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Reject with `OutOfBounds` (placing a new pin).
    Strict,
    /// Clamp to the nearest edge (drawing, slider dragging).
    Clamp,
}

pub fn to_normalized(
    point: ClientPoint,
    bounds: Bounds,
    placement: Placement,
) -> Result<NormPoint, ProofError> {
    if bounds.is_degenerate() {
        return Err(ProofError::OutOfBounds {
            x: f64::NAN,
            y: f64::NAN,
        });
    }
    let x = (point.x - bounds.left) / bounds.width;
    let y = (point.y - bounds.top) / bounds.height;
    match placement {
        Placement::Strict => NormPoint::new(x, y),
        Placement::Clamp => NormPoint::clamped(x, y),
    }
}

/// CSS percentage offsets `(left%, top%)` for an absolutely positioned marker.
pub fn to_viewport(point: NormPoint) -> (f64, f64) {
    (point.x() * 100.0, point.y() * 100.0)
}

/// Pixel offset inside the unscaled image. The shared CSS transform scales the
/// result along with the image, so the zoom factor is not applied here.
pub fn to_intrinsic_px(value: f64, intrinsic: u32) -> f64 {
    value * intrinsic as f64
}

/// Viewport position of a pointer, mouse or touch event.
///
/// Touch events use the first active touch, falling back to the first changed
/// touch for `touchend`.
pub fn client_point(event: &Event) -> Option<ClientPoint> {
    if let Some(touch_event) = event.dyn_ref::<TouchEvent>() {
        let touch = touch_event
            .touches()
            .get(0)
            .or_else(|| touch_event.changed_touches().get(0))?;
        return Some(ClientPoint::new(
            touch.client_x() as f64,
            touch.client_y() as f64,
        ));
    }
    event
        .dyn_ref::<MouseEvent>()
        .map(|mouse| ClientPoint::new(mouse.client_x() as f64, mouse.client_y() as f64))
}
