// src/compare.rs
//
// Side-by-side version comparison: the revised page is laid over the base
// page and revealed up to a draggable vertical split. Nothing here is
// persisted.

use crate::app_config::PageInfo;
use crate::error::ProofError;
use crate::geometry::{to_intrinsic_px, to_normalized, Bounds, ClientPoint, Placement};

#[derive(Debug, Clone, PartialEq)]
pub struct ComparePair {
    pub base: PageInfo,
    pub revised: PageInfo,
}

impl ComparePair {
    pub fn new(base: PageInfo, revised: PageInfo) -> Self {
        Self { base, revised }
    }

    /// Unscaled width both images are laid out at.
    pub fn intrinsic_width(&self) -> u32 {
        self.base.width.max(self.revised.width)
    }
}

/// Fraction of the page width showing the revised version.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealSplit(f64);

impl Default for RevealSplit {
    fn default() -> Self {
        RevealSplit(0.5)
    }
}

impl RevealSplit {
    pub fn new(fraction: f64) -> Self {
        RevealSplit(if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.5
        })
    }

    /// Split under the pointer; dragging past either edge pins to it.
    pub fn from_pointer(point: ClientPoint, bounds: Bounds) -> Result<Self, ProofError> {
        let p = to_normalized(point, bounds, Placement::Clamp)?;
        Ok(RevealSplit(p.x()))
    }

    pub fn fraction(&self) -> f64 {
        self.0
    }

    /// Reveal width in unscaled image pixels.
    pub fn reveal_width_px(&self, intrinsic_width: u32) -> f64 {
        to_intrinsic_px(self.0, intrinsic_width)
    }

    /// Right-hand inset for a CSS `clip-path: inset(...)` on the revised image.
    pub fn clip_inset_percent(&self) -> f64 {
        (1.0 - self.0) * 100.0
    }

    pub fn nudge(&self, delta: f64) -> Self {
        RevealSplit::new(self.0 + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::PageId;

    fn page(id: &str, width: u32, version: u32) -> PageInfo {
        PageInfo {
            id: PageId::from(id),
            label: "Cover".to_string(),
            image_url: format!("{}.jpg", id),
            width,
            height: 1600,
            version,
        }
    }

    #[test]
    fn test_split_from_pointer_clamps() {
        let bounds = Bounds::new(100.0, 0.0, 400.0, 300.0);
        let mid = RevealSplit::from_pointer(ClientPoint::new(200.0, 50.0), bounds).unwrap();
        assert_eq!(mid.fraction(), 0.25);
        let past = RevealSplit::from_pointer(ClientPoint::new(900.0, 50.0), bounds).unwrap();
        assert_eq!(past.fraction(), 1.0);
        let before = RevealSplit::from_pointer(ClientPoint::new(0.0, 50.0), bounds).unwrap();
        assert_eq!(before.fraction(), 0.0);
    }

    #[test]
    fn test_reveal_width_uses_unscaled_size() {
        let pair = ComparePair::new(page("v1", 1200, 1), page("v2", 1000, 2));
        let split = RevealSplit::new(0.25);
        assert_eq!(split.reveal_width_px(pair.intrinsic_width()), 300.0);
        assert_eq!(split.clip_inset_percent(), 75.0);
    }

    #[test]
    fn test_new_and_nudge_clamp() {
        assert_eq!(RevealSplit::new(3.0).fraction(), 1.0);
        assert_eq!(RevealSplit::new(f64::NAN), RevealSplit::default());
        assert_eq!(RevealSplit::new(0.95).nudge(0.1).fraction(), 1.0);
    }
}
