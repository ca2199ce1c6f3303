//! Enum-keyed style records for floating panels.
//!
//! Each `Variant` maps to a partial `StyleRecord`; records are merged left to
//! right, later fields winning. `PanelStyle` is the fully resolved result a
//! renderer consumes.

use perch_core::Vec2;

use crate::placement::{Direction, PositionStyle};
use crate::popup::OpenPhase;

/// Distance the panel slides in from, towards the anchor.
pub const ENTER_SLIDE: f32 = 8.0;
pub const PANEL_Z_INDEX: i32 = 1000;
pub const MASK_OPACITY: f32 = 0.45;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StyleRecord {
    /// Panel edge that faces the anchor; scale/slide transitions start there.
    pub origin: Option<Direction>,
    pub enter_offset: Option<Vec2>,
    pub opacity: Option<f32>,
    pub z_index: Option<i32>,
    pub pointer_events: Option<bool>,
    pub visible: Option<bool>,
}

impl StyleRecord {
    pub fn merge(self, other: StyleRecord) -> StyleRecord {
        StyleRecord {
            origin: other.origin.or(self.origin),
            enter_offset: other.enter_offset.or(self.enter_offset),
            opacity: other.opacity.or(self.opacity),
            z_index: other.z_index.or(self.z_index),
            pointer_events: other.pointer_events.or(self.pointer_events),
            visible: other.visible.or(self.visible),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Direction(Direction),
    Phase(OpenPhase),
    Mask,
}

pub fn variant_style(variant: Variant) -> StyleRecord {
    let slide = |x: f32, y: f32| Some(Vec2 { x, y });
    match variant {
        Variant::Direction(Direction::Bottom) => StyleRecord {
            origin: Some(Direction::Top),
            enter_offset: slide(0.0, -ENTER_SLIDE),
            ..Default::default()
        },
        Variant::Direction(Direction::Top) => StyleRecord {
            origin: Some(Direction::Bottom),
            enter_offset: slide(0.0, ENTER_SLIDE),
            ..Default::default()
        },
        Variant::Direction(Direction::Left) => StyleRecord {
            origin: Some(Direction::Right),
            enter_offset: slide(ENTER_SLIDE, 0.0),
            ..Default::default()
        },
        Variant::Direction(Direction::Right) => StyleRecord {
            origin: Some(Direction::Left),
            enter_offset: slide(-ENTER_SLIDE, 0.0),
            ..Default::default()
        },
        Variant::Phase(OpenPhase::Closed) => StyleRecord {
            opacity: Some(0.0),
            pointer_events: Some(false),
            visible: Some(false),
            ..Default::default()
        },
        Variant::Phase(OpenPhase::Open) => StyleRecord {
            opacity: Some(1.0),
            pointer_events: Some(true),
            visible: Some(true),
            ..Default::default()
        },
        Variant::Phase(OpenPhase::Exiting) => StyleRecord {
            opacity: Some(0.0),
            pointer_events: Some(false),
            visible: Some(true),
            ..Default::default()
        },
        Variant::Mask => StyleRecord {
            opacity: Some(MASK_OPACITY),
            z_index: Some(PANEL_Z_INDEX - 1),
            ..Default::default()
        },
    }
}

pub fn merge_variants(variants: &[Variant]) -> StyleRecord {
    variants
        .iter()
        .fold(StyleRecord::default(), |acc, v| acc.merge(variant_style(*v)))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PanelStyle {
    /// `None` until an anchor has been measured.
    pub top: Option<f32>,
    pub left: Option<f32>,
    pub origin: Direction,
    pub enter_offset: Vec2,
    pub opacity: f32,
    pub z_index: i32,
    pub pointer_events: bool,
    pub visible: bool,
}

impl PanelStyle {
    pub fn resolve(position: PositionStyle, phase: OpenPhase) -> Self {
        let rec = merge_variants(&[
            Variant::Direction(position.direction()),
            Variant::Phase(phase),
        ]);
        let placement = position.placement();
        Self {
            top: placement.map(|p| p.top),
            left: placement.map(|p| p.left),
            ..Self::from_record(rec, PANEL_Z_INDEX)
        }
    }

    /// Full-viewport backdrop behind the panel.
    pub fn mask(phase: OpenPhase) -> Self {
        let rec = merge_variants(&[Variant::Phase(phase), Variant::Mask]);
        let mut style = Self::from_record(rec, PANEL_Z_INDEX - 1);
        style.top = Some(0.0);
        style.left = Some(0.0);
        if phase == OpenPhase::Exiting {
            style.opacity = 0.0;
        }
        style
    }

    fn from_record(rec: StyleRecord, z_index: i32) -> Self {
        Self {
            top: None,
            left: None,
            origin: rec.origin.unwrap_or(Direction::Top),
            enter_offset: rec.enter_offset.unwrap_or_default(),
            opacity: rec.opacity.unwrap_or(1.0),
            z_index: rec.z_index.unwrap_or(z_index),
            pointer_events: rec.pointer_events.unwrap_or(true),
            visible: rec.visible.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Placement;

    #[test]
    fn later_records_win() {
        let a = StyleRecord {
            opacity: Some(0.2),
            z_index: Some(3),
            ..Default::default()
        };
        let b = StyleRecord {
            opacity: Some(0.9),
            ..Default::default()
        };
        let merged = a.merge(b);
        assert_eq!(merged.opacity, Some(0.9));
        assert_eq!(merged.z_index, Some(3));
    }

    #[test]
    fn flipped_panel_grows_from_the_anchor_side() {
        let position = PositionStyle::Positioned(Placement {
            top: 195.0,
            left: 100.0,
            resolved_direction: Direction::Top,
        });
        let style = PanelStyle::resolve(position, OpenPhase::Open);
        assert_eq!(style.top, Some(195.0));
        assert_eq!(style.origin, Direction::Bottom);
        assert_eq!(style.enter_offset, Vec2 { x: 0.0, y: ENTER_SLIDE });
        assert!(style.visible && style.pointer_events);
        assert_eq!(style.z_index, PANEL_Z_INDEX);
    }

    #[test]
    fn exiting_panel_is_visible_but_inert() {
        let position = PositionStyle::Unpositioned {
            direction: Direction::Right,
        };
        let style = PanelStyle::resolve(position, OpenPhase::Exiting);
        assert_eq!(style.top, None);
        assert_eq!(style.origin, Direction::Left);
        assert!(style.visible);
        assert!(!style.pointer_events);
        assert_eq!(style.opacity, 0.0);
    }

    #[test]
    fn mask_sits_below_panel() {
        let open = PanelStyle::mask(OpenPhase::Open);
        assert_eq!(open.opacity, MASK_OPACITY);
        assert_eq!(open.z_index, PANEL_Z_INDEX - 1);
        assert_eq!(PanelStyle::mask(OpenPhase::Exiting).opacity, 0.0);
        assert!(!PanelStyle::mask(OpenPhase::Closed).visible);
    }
}
