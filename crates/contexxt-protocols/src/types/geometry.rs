//! Geometry primitives and the shared positioning rules.
//!
//! Both floating surfaces reduce their layout to one of two rules:
//! overlays are anchored to an element's document-space box, the popover
//! is placed next to a point with a four-quadrant flip.

use serde::{Deserialize, Serialize};

/// A point in viewport (client) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// An axis-aligned box. `x`/`y` are the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the box covers no area.
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Shift the box by the given offsets.
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Window size and current scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// Absolute position of a floating container plus whether it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub displayed: bool,
}

impl Placement {
    /// Anchor a container over an element.
    ///
    /// `client_rect` is the element's viewport-relative box; the result is in
    /// document coordinates. A zero-area box yields a hidden placement so the
    /// container can come back without being recreated.
    pub fn anchored(client_rect: Rect, viewport: &Viewport) -> Self {
        let doc = client_rect.translate(viewport.scroll_x, viewport.scroll_y);
        Self {
            left: doc.x,
            top: doc.y,
            width: doc.width,
            height: doc.height,
            displayed: !client_rect.is_empty(),
        }
    }

    /// Place a box of `size` next to `anchor`, flipping and clamping so it stays on screen.
    ///
    /// Prefers right/below of the anchor offset by `padding`. Overflowing the right
    /// edge flips it to the left of the anchor, overflowing the bottom flips it above.
    /// The result never goes below `padding` on either axis.
    pub fn beside_point(anchor: Point, size: Size, viewport: &Viewport, padding: f64) -> Self {
        let mut left = anchor.x + padding;
        let mut top = anchor.y + padding;
        if left + size.width > viewport.width {
            left = anchor.x - size.width - padding;
        }
        if top + size.height > viewport.height {
            top = anchor.y - size.height - padding;
        }
        Self {
            left: left.max(padding),
            top: top.max(padding),
            width: size.width,
            height: size.height,
            displayed: true,
        }
    }
}
