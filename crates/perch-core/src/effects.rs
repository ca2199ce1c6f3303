//! Cleanup handles.
//!
//! A `Dispose` wraps one cleanup that runs at most once, however many clones
//! of the handle call `run`. Registration guards such as `Subscription` and
//! `Timeout` release themselves on drop, so `Dispose::holding` is usually all
//! a component needs to tie them to a `Scope`.

use std::cell::Cell;
use std::rc::Rc;

type Cleanup = Box<dyn FnOnce()>;

#[derive(Clone)]
pub struct Dispose(Rc<Cell<Option<Cleanup>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(Cell::new(Some(Box::new(f)))))
    }

    /// Keeps `guard` alive until the handle runs, then drops it.
    pub fn holding<T: 'static>(guard: T) -> Self {
        Self::new(move || drop(guard))
    }

    /// Runs every handle in order as a single cleanup.
    pub fn all(handles: impl IntoIterator<Item = Dispose>) -> Self {
        let handles: Vec<_> = handles.into_iter().collect();
        Self::new(move || handles.iter().for_each(Dispose::run))
    }

    pub fn run(&self) {
        if let Some(f) = self.0.take() {
            f()
        }
    }

    pub fn is_spent(&self) -> bool {
        let f = self.0.take();
        let spent = f.is_none();
        self.0.set(f);
        spent
    }
}

/// Run `f` now. The cleanup it returns is also owned by the current scope,
/// if any, and runs when that scope is disposed.
pub fn effect<F>(f: F) -> Dispose
where
    F: FnOnce() -> Dispose + 'static,
{
    let dispose = f();
    match crate::scope::current_scope() {
        Some(scope) => {
            let owned = dispose.clone();
            scope.add_disposer(move || owned.run());
        }
        None => log::trace!("effect outside a scope; caller owns its cleanup"),
    }
    dispose
}

pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}
