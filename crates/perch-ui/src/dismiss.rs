//! # Dismissal
//!
//! `DismissalCoordinator` decides when an open floating panel should close.
//! It owns one logical close callback and calls it for:
//!
//! - a pointer-down outside the panel root whose target (and its ancestors)
//!   match none of the excluded selectors. The callback runs after
//!   `DismissOptions::delay`, so the click that opened the panel cannot close
//!   it in the same tick, and repeated clicks schedule it only once;
//! - a window resize;
//! - a scroll anywhere (listened in the capture phase), unless the scrolled
//!   node matches an excluded selector;
//! - `request_close()`.
//!
//! Listeners exist only while both `sync` flags are true. They are dropped
//! (and a pending delayed close cancelled) when the flags change, when the
//! coordinator closes, and when it is dropped. After a close the next `sync`
//! attaches again, even with unchanged flags.
//!
//! ```rust
//! use perch_core::*;
//! use perch_ui::dismiss::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let clock = ManualClock::new();
//! let hub = EventHub::with_clock(Viewport::default(), clock.clone());
//! let mut tree = NodeTree::new();
//! let panel = tree.insert(tree.overlay(), Node::new("div")).unwrap();
//!
//! let closed = Rc::new(Cell::new(false));
//! let mut dismiss = DismissalCoordinator::new(&hub, DismissOptions::default());
//! dismiss.set_root(Some(panel));
//! dismiss.set_on_close({
//!     let closed = closed.clone();
//!     move |_| closed.set(true)
//! });
//! dismiss.sync(true, true);
//!
//! hub.dispatch(&tree, WindowEvent::PointerDown(PointerEvent::down(None, Vec2::default())));
//! clock.advance(DEFAULT_DISMISS_DELAY);
//! hub.run_due_timers();
//! assert!(closed.get());
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bitflags::bitflags;
use perch_core::prelude::*;

/// Delay between an outside pointer-down and the close callback.
pub const DEFAULT_DISMISS_DELAY: Duration = Duration::from_millis(100);

bitflags! {
    /// Window events that dismiss the panel. Explicit close is always available.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
    pub struct DismissTriggers: u8 {
        const POINTER_DOWN = 1 << 0;
        const RESIZE = 1 << 1;
        const SCROLL = 1 << 2;
    }
}

impl Default for DismissTriggers {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissState {
    Idle,
    Active,
    Closing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissReason {
    OutsidePointer,
    Resize,
    Scroll,
    Explicit,
}

#[derive(Clone, Debug)]
pub struct DismissOptions {
    pub excluded: SelectorList,
    pub triggers: DismissTriggers,
    pub delay: Duration,
}

impl Default for DismissOptions {
    fn default() -> Self {
        Self {
            excluded: SelectorList::default(),
            triggers: DismissTriggers::default(),
            delay: DEFAULT_DISMISS_DELAY,
        }
    }
}

impl DismissOptions {
    pub fn exclude<S: AsRef<str>>(mut self, selectors: &[S]) -> Result<Self> {
        self.excluded = SelectorList::from_strs(selectors)?;
        Ok(self)
    }
    pub fn triggers(mut self, triggers: DismissTriggers) -> Self {
        self.triggers = triggers;
        self
    }
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type CloseFn = Rc<dyn Fn(DismissReason)>;

struct Shared {
    hub: EventHub,
    state: DismissState,
    root: Option<NodeId>,
    options: DismissOptions,
    on_close: Option<CloseFn>,
    listeners: Vec<Subscription>,
    pending: Option<Timeout>,
    closes: u64,
    // last (is_active, should_listen) seen by `sync`; cleared when a close
    // drops the listeners so the next `sync` attaches again
    flags: Option<(bool, bool)>,
}

pub struct DismissalCoordinator {
    shared: Rc<RefCell<Shared>>,
}

impl DismissalCoordinator {
    pub fn new(hub: &EventHub, options: DismissOptions) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                hub: hub.clone(),
                state: DismissState::Idle,
                root: None,
                options,
                on_close: None,
                listeners: Vec::new(),
                pending: None,
                closes: 0,
                flags: None,
            })),
        }
    }

    pub fn set_on_close(&self, f: impl Fn(DismissReason) + 'static) {
        self.shared.borrow_mut().on_close = Some(Rc::new(f));
    }

    pub fn clear_on_close(&self) {
        self.shared.borrow_mut().on_close = None;
    }

    /// Panel root for containment checks; `None` treats every target as outside.
    pub fn set_root(&self, root: Option<NodeId>) {
        self.shared.borrow_mut().root = root;
    }

    pub fn state(&self) -> DismissState {
        self.shared.borrow().state
    }

    pub fn is_listening(&self) -> bool {
        !self.shared.borrow().listeners.is_empty()
    }

    pub fn has_pending_close(&self) -> bool {
        self.shared.borrow().pending.is_some()
    }

    /// How many times the close callback has been triggered.
    pub fn close_count(&self) -> u64 {
        self.shared.borrow().closes
    }

    /// Attach or detach listeners to match the flags. Only a change in the
    /// pair, or a close since the last call, does anything; the previous
    /// registration is always torn down first.
    pub fn sync(&mut self, is_active: bool, should_listen: bool) {
        let flags = Some((is_active, should_listen));
        let previous = std::mem::replace(&mut self.shared.borrow_mut().flags, flags);
        if previous == flags {
            return;
        }
        self.detach();
        if is_active && should_listen {
            self.attach();
        }
    }

    pub fn request_close(&self) {
        fire(&self.shared, DismissReason::Explicit);
    }

    fn attach(&self) {
        let weak = Rc::downgrade(&self.shared);
        let (hub, triggers) = {
            let s = self.shared.borrow();
            (s.hub.clone(), s.options.triggers)
        };

        let mut listeners = Vec::new();
        if triggers.contains(DismissTriggers::POINTER_DOWN) {
            let weak = weak.clone();
            listeners.push(hub.listen(EventKind::PointerDown, Phase::Bubble, move |ev, tree| {
                on_pointer_down(&weak, ev, tree)
            }));
        }
        if triggers.contains(DismissTriggers::RESIZE) {
            let weak = weak.clone();
            listeners.push(hub.listen(EventKind::Resize, Phase::Bubble, move |_, _| {
                if let Some(shared) = weak.upgrade() {
                    fire(&shared, DismissReason::Resize);
                }
            }));
        }
        if triggers.contains(DismissTriggers::SCROLL) {
            let weak = weak.clone();
            listeners.push(hub.listen(EventKind::Scroll, Phase::Capture, move |ev, tree| {
                on_scroll(&weak, ev, tree)
            }));
        }

        let mut s = self.shared.borrow_mut();
        s.listeners = listeners;
        s.state = DismissState::Active;
        log::debug!("dismiss: active ({triggers:?})");
    }

    fn detach(&self) {
        let (listeners, pending) = {
            let mut s = self.shared.borrow_mut();
            if s.state == DismissState::Active {
                s.state = DismissState::Idle;
            }
            (std::mem::take(&mut s.listeners), s.pending.take())
        };
        if !listeners.is_empty() {
            log::debug!("dismiss: detached {} listener(s)", listeners.len());
        }
        drop(listeners);
        drop(pending);
    }
}

impl Drop for DismissalCoordinator {
    fn drop(&mut self) {
        self.detach();
    }
}

fn on_pointer_down(weak: &Weak<RefCell<Shared>>, ev: &WindowEvent, tree: &NodeTree) {
    let Some(shared) = weak.upgrade() else { return };
    let WindowEvent::PointerDown(pe) = ev else { return };

    let mut s = shared.borrow_mut();
    if s.state != DismissState::Active || s.pending.is_some() {
        return;
    }
    if let Some(target) = pe.target {
        if s.options.excluded.closest(tree, target).is_some() {
            log::trace!("dismiss: pointer-down on excluded {target:?}");
            return;
        }
        if let Some(root) = s.root
            && tree.contains(root, target)
        {
            return;
        }
    }

    let delayed = Rc::downgrade(&shared);
    let timeout = s.hub.set_timeout(s.options.delay, move || {
        if let Some(shared) = delayed.upgrade() {
            fire(&shared, DismissReason::OutsidePointer);
        }
    });
    s.pending = Some(timeout);
    log::trace!("dismiss: outside pointer-down, closing in {:?}", s.options.delay);
}

fn on_scroll(weak: &Weak<RefCell<Shared>>, ev: &WindowEvent, tree: &NodeTree) {
    let Some(shared) = weak.upgrade() else { return };
    let WindowEvent::Scroll(scroll) = ev else { return };

    let excluded = scroll
        .target
        .is_some_and(|t| shared.borrow().options.excluded.matches(tree, t));
    if excluded {
        log::trace!("dismiss: scroll inside excluded {:?}", scroll.target);
        return;
    }
    fire(&shared, DismissReason::Scroll);
}

fn fire(shared: &Rc<RefCell<Shared>>, reason: DismissReason) {
    let (callback, listeners, pending) = {
        let mut s = shared.borrow_mut();
        if s.state != DismissState::Active {
            return;
        }
        s.state = DismissState::Closing;
        s.closes += 1;
        s.flags = None;
        (
            s.on_close.clone(),
            std::mem::take(&mut s.listeners),
            s.pending.take(),
        )
    };
    log::debug!("dismiss: closing ({reason:?})");

    // Listeners go before the callback runs so a re-open inside it starts clean.
    drop(listeners);
    drop(pending);
    if let Some(cb) = callback {
        cb(reason);
    }

    let mut s = shared.borrow_mut();
    if s.state == DismissState::Closing {
        s.state = DismissState::Idle;
    }
}
