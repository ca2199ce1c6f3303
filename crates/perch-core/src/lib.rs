//! # Perch core
//!
//! The pieces every floating panel builds on:
//!
//! - `NodeTree`: explicit, owned node tree with layout rects and a portal
//!   layer (`overlay()`) for floating content.
//! - `SelectorList`: `#id`, `.class`, `[attr]` selectors matched against a
//!   node or its ancestor chain.
//! - `EventHub`: the window/document surface, with listeners for pointer-down,
//!   resize and scroll, one-shot timers, and the live `Viewport`.
//! - `Signal`, `Scope`, `effect`: small reactive and cleanup helpers.
//!
//! Nothing here is global. A host owns one `EventHub` and one `NodeTree`,
//! writes layout results into the tree, and forwards platform events:
//!
//! ```rust
//! use perch_core::*;
//!
//! let hub = EventHub::new(Viewport::new(1024.0, 768.0));
//! let mut tree = NodeTree::new();
//! let list = tree
//!     .insert(tree.body(), Node::new("ul").class("scroll-list"))
//!     .unwrap();
//!
//! hub.dispatch(
//!     &tree,
//!     WindowEvent::Scroll(ScrollEvent {
//!         target: Some(list),
//!         delta: Vec2 { x: 0.0, y: 24.0 },
//!     }),
//! );
//! hub.run_due_timers();
//! ```
//!
//! Registrations are RAII: a `Subscription` or `Timeout` unregisters itself
//! on drop, and a `Scope` runs its disposers when disposed or dropped.

pub mod clock;
pub mod effects;
pub mod error;
pub mod events;
pub mod geometry;
pub mod input;
pub mod prelude;
pub mod scope;
pub mod selector;
pub mod signal;
pub mod tree;

pub use clock::*;
pub use effects::*;
pub use error::*;
pub use events::*;
pub use geometry::*;
pub use input::*;
pub use scope::*;
pub use selector::*;
pub use signal::*;
pub use tree::*;
