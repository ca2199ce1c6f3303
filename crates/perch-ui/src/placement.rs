//! # Placement
//!
//! Positions a floating panel next to its anchor.
//!
//! The requested `Direction` picks the *primary* axis: `Top`/`Bottom` place
//! the panel above or below the anchor, `Left`/`Right` beside it. The other
//! axis is the *cross* axis, where the panel starts aligned with the anchor's
//! top (or left) edge.
//!
//! With `auto_reposition` on, a primary-axis overflow flips the direction
//! once (never back again in the same call), and a cross-axis overflow
//! aligns the panel with the anchor's opposite edge instead. Nothing here
//! fails: if neither side fits, the flipped position is returned anyway and
//! the panel's container is expected to clip or scroll.
//!
//! ```rust
//! use perch_core::{AnchorRect, Size, Viewport};
//! use perch_ui::placement::*;
//!
//! let anchor = AnchorRect::from_edges(500.0, 100.0, 200.0, 540.0);
//! let out = compute_position(
//!     Some(&anchor),
//!     Direction::Bottom,
//!     Offset::new(5.0, 0.0),
//!     Size { width: 100.0, height: 300.0 },
//!     true,
//!     Viewport::new(800.0, 600.0),
//! );
//! let p = out.placement().unwrap();
//! assert_eq!(p.resolved_direction, Direction::Top);
//! assert_eq!(p.top, 195.0);
//! ```

use perch_core::{AnchorRect, Size, Viewport};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Direction {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// `Top`/`Bottom`: the primary axis is vertical.
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Top | Direction::Bottom)
    }
}

/// Gap between the anchor and the panel edge, in px.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    pub vertical: f32,
    pub horizontal: f32,
}

impl Offset {
    pub fn new(vertical: f32, horizontal: f32) -> Self {
        Self {
            vertical,
            horizontal,
        }
    }

    pub fn uniform(v: f32) -> Self {
        Self::new(v, v)
    }
}

/// Measured panel size; zero before the first layout pass.
pub type PanelSize = Size;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub top: f32,
    pub left: f32,
    pub resolved_direction: Direction,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PositionStyle {
    /// No anchor measured yet; render nothing positioned.
    Unpositioned { direction: Direction },
    Positioned(Placement),
}

impl PositionStyle {
    pub fn placement(&self) -> Option<Placement> {
        match self {
            PositionStyle::Positioned(p) => Some(*p),
            PositionStyle::Unpositioned { .. } => None,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            PositionStyle::Positioned(p) => p.resolved_direction,
            PositionStyle::Unpositioned { direction } => *direction,
        }
    }
}

/// One axis of the problem, in that axis' coordinates.
struct Span {
    start: f32,
    end: f32,
    extent: f32,
    gap: f32,
    limit: f32,
}

impl Span {
    fn before(&self) -> f32 {
        self.start - self.extent - self.gap
    }

    fn after(&self) -> f32 {
        self.end + self.gap
    }

    /// Position on the primary axis and whether the side was flipped.
    fn primary(&self, toward_start: bool, auto: bool) -> (f32, bool) {
        let (before, after) = (self.before(), self.after());
        if toward_start {
            if auto && before < 0.0 {
                (after, true)
            } else {
                (before, false)
            }
        } else if auto && after + self.extent > self.limit {
            (before, true)
        } else {
            (after, false)
        }
    }

    fn cross(&self, auto: bool) -> f32 {
        let aligned_start = self.start + self.gap;
        if auto && aligned_start + self.extent > self.limit {
            self.end - self.extent - self.gap
        } else {
            aligned_start
        }
    }
}

pub fn compute_position(
    anchor: Option<&AnchorRect>,
    direction: Direction,
    offset: Offset,
    panel: PanelSize,
    auto_reposition: bool,
    viewport: Viewport,
) -> PositionStyle {
    let Some(anchor) = anchor else {
        return PositionStyle::Unpositioned { direction };
    };

    let vertical = Span {
        start: anchor.top,
        end: anchor.bottom,
        extent: panel.height,
        gap: offset.vertical,
        limit: viewport.inner_height,
    };
    let horizontal = Span {
        start: anchor.left,
        end: anchor.right,
        extent: panel.width,
        gap: offset.horizontal,
        limit: viewport.inner_width,
    };

    let toward_start = matches!(direction, Direction::Top | Direction::Left);
    let (top, left, flipped) = if direction.is_vertical() {
        let (top, flipped) = vertical.primary(toward_start, auto_reposition);
        (top, horizontal.cross(auto_reposition), flipped)
    } else {
        let (left, flipped) = horizontal.primary(toward_start, auto_reposition);
        (vertical.cross(auto_reposition), left, flipped)
    };

    let resolved_direction = if flipped {
        log::debug!("placement: {direction:?} overflows, flipping");
        direction.opposite()
    } else {
        direction
    };

    PositionStyle::Positioned(Placement {
        top,
        left,
        resolved_direction,
    })
}

/// Every input `compute_position` reads, so a cache can compare them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementInputs {
    pub anchor: Option<AnchorRect>,
    pub direction: Direction,
    pub offset: Offset,
    pub panel: PanelSize,
    pub auto_reposition: bool,
    pub viewport: Viewport,
}

impl PlacementInputs {
    pub fn compute(&self) -> PositionStyle {
        compute_position(
            self.anchor.as_ref(),
            self.direction,
            self.offset,
            self.panel,
            self.auto_reposition,
            self.viewport,
        )
    }
}

/// Memoized placement: recomputes only when the inputs change.
#[derive(Default)]
pub struct PlacementCache {
    last: Option<(PlacementInputs, PositionStyle)>,
    recomputes: u64,
}

impl PlacementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, inputs: PlacementInputs) -> PositionStyle {
        if let Some((prev, out)) = &self.last
            && *prev == inputs
        {
            return *out;
        }
        let out = inputs.compute();
        self.recomputes += 1;
        log::trace!("placement recomputed: {out:?}");
        self.last = Some((inputs, out));
        out
    }

    pub fn current(&self) -> Option<PositionStyle> {
        self.last.map(|(_, out)| out)
    }

    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }
}
