//! # Event hub
//!
//! `EventHub` stands in for the global `window`/`document` event target. It is
//! shared by every open panel and passed around by reference (it is a cheap
//! `Rc` handle):
//!
//! - `listen` registers a handler for one `EventKind` in a `Phase` and
//!   returns a `Subscription`; dropping it unregisters the handler.
//! - `set_timeout` schedules a one-shot callback and returns a `Timeout`;
//!   dropping it cancels the callback if it has not fired yet.
//! - `dispatch` delivers a `WindowEvent`. Capture listeners see every event,
//!   bubble listeners see pointer-downs and window-level scrolls only.
//! - `run_due_timers` fires expired timeouts; hosts call it once per frame.
//!
//! ```rust
//! use perch_core::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let hub = EventHub::new(Viewport::new(800.0, 600.0));
//! let tree = NodeTree::new();
//! let hits = Rc::new(Cell::new(0));
//!
//! let sub = hub.listen(EventKind::Resize, Phase::Bubble, {
//!     let hits = hits.clone();
//!     move |_, _| hits.set(hits.get() + 1)
//! });
//! hub.dispatch(&tree, WindowEvent::Resize(Viewport::new(640.0, 480.0)));
//! drop(sub);
//! hub.dispatch(&tree, WindowEvent::Resize(Viewport::new(800.0, 600.0)));
//!
//! assert_eq!(hits.get(), 1);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};
use web_time::{Duration, Instant};

use crate::{Clock, EventKind, NodeTree, Phase, SystemClock, Viewport, WindowEvent};

new_key_type! {
    struct ListenerKey;
    struct TimerKey;
}

pub type Handler = Rc<dyn Fn(&WindowEvent, &NodeTree)>;

struct Listener {
    kind: EventKind,
    phase: Phase,
    handler: Handler,
}

struct Timer {
    deadline: Instant,
    seq: u64,
    f: Box<dyn FnOnce()>,
}

struct HubInner {
    listeners: RefCell<SlotMap<ListenerKey, Listener>>,
    // registration order; slotmap iteration order is not stable across reuse
    order: RefCell<Vec<ListenerKey>>,
    timers: RefCell<SlotMap<TimerKey, Timer>>,
    next_seq: Cell<u64>,
    viewport: Cell<Viewport>,
    clock: Rc<dyn Clock>,
}

impl HubInner {
    fn remove_listener(&self, key: ListenerKey) -> bool {
        let removed = self.listeners.borrow_mut().remove(key).is_some();
        if removed {
            self.order.borrow_mut().retain(|k| *k != key);
        }
        removed
    }
}

#[derive(Clone)]
pub struct EventHub {
    inner: Rc<HubInner>,
}

impl EventHub {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_clock(viewport, SystemClock)
    }

    pub fn with_clock(viewport: Viewport, clock: impl Clock) -> Self {
        Self {
            inner: Rc::new(HubInner {
                listeners: RefCell::new(SlotMap::with_key()),
                order: RefCell::new(Vec::new()),
                timers: RefCell::new(SlotMap::with_key()),
                next_seq: Cell::new(0),
                viewport: Cell::new(viewport),
                clock: Rc::new(clock),
            }),
        }
    }

    /// Live viewport; updated by `Resize` events before any listener runs.
    pub fn viewport(&self) -> Viewport {
        self.inner.viewport.get()
    }

    pub fn now(&self) -> Instant {
        self.inner.clock.now()
    }

    pub fn listen(
        &self,
        kind: EventKind,
        phase: Phase,
        handler: impl Fn(&WindowEvent, &NodeTree) + 'static,
    ) -> Subscription {
        let key = self.inner.listeners.borrow_mut().insert(Listener {
            kind,
            phase,
            handler: Rc::new(handler),
        });
        self.inner.order.borrow_mut().push(key);
        log::trace!("listen {kind:?}/{phase:?} -> {key:?}");
        Subscription {
            hub: Rc::downgrade(&self.inner),
            key: Some(key),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn dispatch(&self, tree: &NodeTree, event: WindowEvent) {
        if let WindowEvent::Resize(vp) = &event {
            self.inner.viewport.set(*vp);
        }

        let kind = event.kind();
        let reaches_bubble = event.bubbles() || event.target().is_none();
        let snapshot: Vec<ListenerKey> = {
            let listeners = self.inner.listeners.borrow();
            let order = self.inner.order.borrow();
            let mut keys = Vec::new();
            for phase in [Phase::Capture, Phase::Bubble] {
                if phase == Phase::Bubble && !reaches_bubble {
                    continue;
                }
                keys.extend(order.iter().copied().filter(|k| {
                    listeners
                        .get(*k)
                        .is_some_and(|l| l.kind == kind && l.phase == phase)
                }));
            }
            keys
        };
        log::trace!("dispatch {kind:?} to {} listener(s)", snapshot.len());

        for key in snapshot {
            // A handler may unregister later listeners; skip those.
            let handler = self
                .inner
                .listeners
                .borrow()
                .get(key)
                .map(|l| l.handler.clone());
            if let Some(h) = handler {
                h(&event, tree);
            }
        }
    }

    pub fn set_timeout(&self, delay: Duration, f: impl FnOnce() + 'static) -> Timeout {
        let seq = self.inner.next_seq.get();
        self.inner.next_seq.set(seq + 1);
        let key = self.inner.timers.borrow_mut().insert(Timer {
            deadline: self.now() + delay,
            seq,
            f: Box::new(f),
        });
        Timeout {
            hub: Rc::downgrade(&self.inner),
            key,
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Fire every timeout whose deadline has passed, earliest first.
    /// Returns how many fired.
    pub fn run_due_timers(&self) -> usize {
        let mut fired = 0;
        loop {
            let now = self.now();
            let due = {
                let timers = self.inner.timers.borrow();
                timers
                    .iter()
                    .filter(|(_, t)| t.deadline <= now)
                    .min_by_key(|(_, t)| (t.deadline, t.seq))
                    .map(|(k, _)| k)
            };
            let Some(key) = due else { break };
            let timer = self.inner.timers.borrow_mut().remove(key);
            if let Some(timer) = timer {
                (timer.f)();
                fired += 1;
            }
        }
        fired
    }
}

/// Registered listener. Dropping it unregisters the handler.
pub struct Subscription {
    hub: Weak<HubInner>,
    key: Option<ListenerKey>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        match (self.hub.upgrade(), self.key) {
            (Some(hub), Some(key)) => hub.listeners.borrow().contains_key(key),
            _ => false,
        }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let (Some(hub), Some(key)) = (self.hub.upgrade(), self.key.take()) {
            hub.remove_listener(key);
            log::trace!("unlisten {key:?}");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// Scheduled one-shot callback. Dropping it before the deadline cancels it.
pub struct Timeout {
    hub: Weak<HubInner>,
    key: TimerKey,
}

impl Timeout {
    pub fn is_pending(&self) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|hub| hub.timers.borrow().contains_key(self.key))
    }
}

impl Drop for Timeout {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.timers.borrow_mut().remove(self.key);
        }
    }
}
