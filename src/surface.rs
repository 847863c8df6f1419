//! Host render surface abstraction
//!
//! The engine's only coupling to the surrounding UI framework. A host
//! embeds the engine by implementing [`RenderSurface`] over whatever render
//! tree it owns (DOM, retained-mode scene graph, terminal cells); everything
//! else in this crate works purely in the geometry types defined here.
//!
//! Coordinates are viewport-relative and use the host's native length unit.

use serde::{Deserialize, Serialize};

/// Screen-space bounding box of a live UI element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (x + width)
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (y + height)
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center point of the box
    #[inline]
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// This box grown by `pad` units on every side
    pub fn expanded(&self, pad: f64) -> Self {
        Self {
            x: self.x - pad,
            y: self.y - pad,
            width: self.width + pad * 2.0,
            height: self.height + pad * 2.0,
        }
    }
}

/// Visible viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A screen-space point (overlay anchors are top-left corners)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Capability interface the host UI provides to the engine.
///
/// Implementations must be cheap to call repeatedly: the sequencer
/// re-resolves targets on every step entry and on every `refresh()`.
pub trait RenderSurface {
    /// Locate the element matching `target` and return its bounding box.
    ///
    /// Returns `None` when nothing matches. When several elements match,
    /// the first in the host's traversal order wins.
    fn find_element(&self, target: &str) -> Option<BoundingBox>;

    /// Ask the host to smooth-scroll the matching element into the visible
    /// viewport. Best-effort: a miss is silently ignored.
    fn scroll_into_view(&self, target: &str);

    /// Current visible viewport dimensions
    fn viewport(&self) -> Viewport;
}
