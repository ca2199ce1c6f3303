pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::effects::{Dispose, effect, on_unmount};
pub use crate::error::{Error, Result};
pub use crate::events::{EventHub, Subscription, Timeout};
pub use crate::geometry::{AnchorRect, Rect, Size, Vec2, Viewport};
pub use crate::input::{EventKind, Phase, PointerEvent, ScrollEvent, WindowEvent};
pub use crate::scope::{Scope, current_scope};
pub use crate::selector::{Selector, SelectorList};
pub use crate::signal::{Signal, signal};
pub use crate::tree::{Node, NodeId, NodeTree};
pub use web_time::Duration;
