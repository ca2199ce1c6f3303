//! Floating panels: where to put them and when to close them.
//!
//! - `placement`: pure positioning of a panel next to an anchor, flipping on
//!   overflow.
//! - `dismiss`: closes an open panel on outside pointer-down, resize, scroll
//!   or an explicit request.
//! - `popup`: the open/exit lifecycle shared by selects, tag menus and drawers.
//! - `style`: resolved panel and mask styles per direction and phase.

pub mod dismiss;
pub mod placement;
pub mod popup;
pub mod style;
pub mod tests;

pub use dismiss::{
    DEFAULT_DISMISS_DELAY, DismissOptions, DismissReason, DismissState, DismissTriggers,
    DismissalCoordinator,
};
pub use placement::{
    Direction, Offset, PanelSize, Placement, PlacementCache, PlacementInputs, PositionStyle,
    compute_position,
};
pub use popup::{OpenPhase, Popup, PopupConfig};
pub use style::{PanelStyle, StyleRecord, Variant};
