#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Layout box in viewport coordinates, as written by the host layout pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.w,
            height: self.h,
        }
    }
}

/// Measured bounding box of the element a floating panel is attached to.
///
/// Edges are stored alongside the extents so placement math reads the same
/// way a layout engine reports a client rect.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorRect {
    pub top: f32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
}

impl AnchorRect {
    pub fn from_edges(top: f32, left: f32, right: f32, bottom: f32) -> Self {
        Self {
            top,
            left,
            right,
            bottom,
            width: right - left,
            height: bottom - top,
        }
    }
}

impl From<Rect> for AnchorRect {
    fn from(r: Rect) -> Self {
        Self {
            top: r.y,
            left: r.x,
            right: r.x + r.w,
            bottom: r.y + r.h,
            width: r.w,
            height: r.h,
        }
    }
}

/// Size of the containing surface (`innerWidth`/`innerHeight`).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub inner_width: f32,
    pub inner_height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            inner_width: 1280.0,
            inner_height: 800.0,
        }
    }
}

impl Viewport {
    pub fn new(inner_width: f32, inner_height: f32) -> Self {
        Self {
            inner_width,
            inner_height,
        }
    }

    pub fn contains(&self, r: &AnchorRect) -> bool {
        r.top >= 0.0 && r.left >= 0.0 && r.bottom <= self.inner_height && r.right <= self.inner_width
    }
}
