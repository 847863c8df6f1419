//! Overlay placement math
//!
//! Pure functions from `(position, target bounding box, viewport)` to the
//! overlay's top-left anchor and the spotlight rectangle. No internal
//! state: recomputing at any time (step change, scroll, resize) with the
//! same inputs yields the same outputs.
//!
//! Placement deliberately uses a fixed overlay footprint rather than a
//! measured one, so anchors can be computed before the panel renders.

use serde::{Deserialize, Serialize};

use crate::surface::{BoundingBox, Point, Viewport};
use crate::types::{ClampMode, StepPosition};

/// Fixed overlay footprint and placement offsets.
///
/// All lengths share the host's bounding-box unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayGeometry {
    pub overlay_width: f64,
    pub overlay_height: f64,
    /// Distance kept between the target's edge and the overlay
    pub gap: f64,
    /// Spotlight expansion beyond the target's bounding box, per side
    pub spotlight_padding: f64,
    pub clamp: ClampMode,
}

impl Default for OverlayGeometry {
    fn default() -> Self {
        Self {
            overlay_width: 400.0,
            overlay_height: 350.0,
            gap: 20.0,
            spotlight_padding: 8.0,
            clamp: ClampMode::Clamp,
        }
    }
}

impl OverlayGeometry {
    /// Compute the overlay's top-left anchor.
    ///
    /// A missing target forces centered placement whatever `position`
    /// says. Under `ClampMode::Clamp` the anchor is pulled back inside the
    /// viewport after the position formula; `Unclamped` reproduces the
    /// raw formula and may place the overlay partially off-screen near
    /// viewport edges.
    pub fn anchor(
        &self,
        position: StepPosition,
        target: Option<&BoundingBox>,
        viewport: Viewport,
    ) -> Point {
        let raw = match target {
            None => self.centered(viewport),
            Some(b) => match position {
                StepPosition::Center => self.centered(viewport),
                StepPosition::Top => Point {
                    x: b.center().x - self.overlay_width / 2.0,
                    y: b.y - (self.overlay_height + self.gap),
                },
                StepPosition::Bottom => Point {
                    x: b.center().x - self.overlay_width / 2.0,
                    y: b.bottom() + self.gap,
                },
                StepPosition::Left => Point {
                    x: b.x - (self.overlay_width + self.gap),
                    y: b.center().y - self.overlay_height / 2.0,
                },
                StepPosition::Right => Point {
                    x: b.right() + self.gap,
                    y: b.center().y - self.overlay_height / 2.0,
                },
            },
        };

        match self.clamp {
            ClampMode::Unclamped => raw,
            ClampMode::Clamp => Point {
                x: clamp_axis(raw.x, self.overlay_width, viewport.width),
                y: clamp_axis(raw.y, self.overlay_height, viewport.height),
            },
        }
    }

    /// Spotlight rectangle: the target grown by the configured padding.
    ///
    /// Drawn above normal content but below the overlay panel; never
    /// clamped (a partially off-screen target keeps an accurate cutout).
    pub fn spotlight(&self, target: &BoundingBox) -> BoundingBox {
        target.expanded(self.spotlight_padding)
    }

    fn centered(&self, viewport: Viewport) -> Point {
        Point {
            x: viewport.width / 2.0 - self.overlay_width / 2.0,
            y: viewport.height / 2.0 - self.overlay_height / 2.0,
        }
    }
}

/// Pull `pos` back so `[pos, pos + extent]` fits inside `[0, limit]`.
///
/// When the overlay is larger than the viewport the top/left edge wins.
fn clamp_axis(pos: f64, extent: f64, limit: f64) -> f64 {
    pos.min(limit - extent).max(0.0)
}
