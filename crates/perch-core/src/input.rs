use crate::{NodeId, Vec2, Viewport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,   // Left mouse, touch
    Secondary, // Right mouse
    Tertiary,  // Middle mouse
}

#[derive(Clone, Debug)]
pub struct PointerEvent {
    pub id: PointerId,
    pub kind: PointerKind,
    pub button: PointerButton,
    pub position: Vec2,
    /// Node under the pointer after hit-testing; `None` means the window itself.
    pub target: Option<NodeId>,
}

impl PointerEvent {
    pub fn down(target: Option<NodeId>, position: Vec2) -> Self {
        Self {
            id: PointerId(0),
            kind: PointerKind::Mouse,
            button: PointerButton::Primary,
            position,
            target,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScrollEvent {
    /// Scrolled container; `None` is the window's own scroll.
    pub target: Option<NodeId>,
    pub delta: Vec2,
}

/// Events delivered through [`crate::EventHub`], the window/document surface.
#[derive(Clone, Debug)]
pub enum WindowEvent {
    PointerDown(PointerEvent),
    Resize(Viewport),
    Scroll(ScrollEvent),
}

impl WindowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WindowEvent::PointerDown(_) => EventKind::PointerDown,
            WindowEvent::Resize(_) => EventKind::Resize,
            WindowEvent::Scroll(_) => EventKind::Scroll,
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        match self {
            WindowEvent::PointerDown(p) => p.target,
            WindowEvent::Resize(_) => None,
            WindowEvent::Scroll(s) => s.target,
        }
    }

    /// Pointer-downs bubble to the window; scrolls of inner containers do not.
    pub fn bubbles(&self) -> bool {
        matches!(self, WindowEvent::PointerDown(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerDown,
    Resize,
    Scroll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Capture,
    Bubble,
}
