//! # Popup
//!
//! `Popup` is the shared engine behind selects, tag menus and drawers. It
//! owns a panel node (and an optional mask) mounted under the tree's overlay
//! layer, keeps the panel placed next to its anchor, and closes it through a
//! `DismissalCoordinator`.
//!
//! Lifecycle:
//!
//! ```text
//! Closed --open()--> Open --dismissal / close()--> Exiting --tick() / finish_exit()--> Closed
//! ```
//!
//! While `Exiting`, the panel is still visible (its exit transition plays)
//! but the coordinator no longer listens. When window triggers are not
//! dismissal triggers (a drawer that stays open on scroll, say), the popup
//! remeasures its anchor and recomputes the placement inside the same
//! dispatch, before the host paints again.
//!
//! ```rust
//! use perch_core::*;
//! use perch_ui::*;
//!
//! let hub = EventHub::new(Viewport::new(800.0, 600.0));
//! let mut tree = NodeTree::new();
//! let trigger = tree
//!     .insert(tree.body(), Node::new("button").rect(Rect::new(100.0, 500.0, 100.0, 40.0)))
//!     .unwrap();
//!
//! let mut select = Popup::new(&hub, &mut tree, trigger, PopupConfig::select()).unwrap();
//! select.open(&mut tree).unwrap();
//!
//! // host lays out the panel, then reports its size
//! tree.set_rect(select.panel(), Rect::new(0.0, 0.0, 100.0, 300.0)).unwrap();
//! let placement = select.measure_panel(&tree).placement().unwrap();
//! assert_eq!(placement.resolved_direction, Direction::Top);
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use perch_core::prelude::*;
use web_time::Instant;

use crate::dismiss::{DismissOptions, DismissTriggers, DismissalCoordinator};
use crate::placement::{
    Direction, Offset, PanelSize, PlacementCache, PlacementInputs, PositionStyle,
};
use crate::style::PanelStyle;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpenPhase {
    #[default]
    Closed,
    Open,
    Exiting,
}

/// Recognized popup options.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PopupConfig {
    pub direction: Direction,
    pub offset: Offset,
    pub auto_reposition: bool,
    pub exclude_selectors: Vec<String>,
    pub mask: bool,
    pub triggers: DismissTriggers,
    pub dismiss_delay_ms: u64,
    pub exit_duration_ms: u64,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            direction: Direction::Bottom,
            offset: Offset::default(),
            auto_reposition: true,
            exclude_selectors: Vec::new(),
            mask: false,
            triggers: DismissTriggers::all(),
            dismiss_delay_ms: millis(crate::dismiss::DEFAULT_DISMISS_DELAY),
            exit_duration_ms: 150,
        }
    }
}

impl PopupConfig {
    /// Dropdown under a select field.
    pub fn select() -> Self {
        Self::default().offset(Offset::new(4.0, 0.0))
    }

    /// Suggestion menu under a tag input; typing in the input keeps it open.
    pub fn tag_menu() -> Self {
        Self::default()
            .offset(Offset::new(4.0, 0.0))
            .exclude([".tag-input"])
    }

    /// Edge drawer with a mask. Window changes move it rather than close it.
    pub fn drawer(direction: Direction) -> Self {
        Self {
            direction,
            auto_reposition: false,
            mask: true,
            triggers: DismissTriggers::POINTER_DOWN,
            exit_duration_ms: 300,
            ..Self::default()
        }
    }

    pub fn direction(mut self, d: Direction) -> Self {
        self.direction = d;
        self
    }
    pub fn offset(mut self, o: Offset) -> Self {
        self.offset = o;
        self
    }
    pub fn auto_reposition(mut self, on: bool) -> Self {
        self.auto_reposition = on;
        self
    }
    pub fn exclude<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_selectors
            .extend(selectors.into_iter().map(Into::into));
        self
    }
    pub fn mask(mut self, on: bool) -> Self {
        self.mask = on;
        self
    }
    pub fn triggers(mut self, t: DismissTriggers) -> Self {
        self.triggers = t;
        self
    }
    pub fn dismiss_delay(mut self, d: Duration) -> Self {
        self.dismiss_delay_ms = millis(d);
        self
    }
    pub fn exit_duration(mut self, d: Duration) -> Self {
        self.exit_duration_ms = millis(d);
        self
    }

    fn dismiss_options(&self) -> Result<DismissOptions> {
        Ok(DismissOptions::default()
            .exclude(self.exclude_selectors.as_slice())?
            .triggers(self.triggers)
            .delay(Duration::from_millis(self.dismiss_delay_ms)))
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Clone, Copy)]
struct Params {
    direction: Direction,
    offset: Offset,
    auto_reposition: bool,
}

struct PopupState {
    phase: OpenPhase,
    anchor_rect: Option<AnchorRect>,
    panel_size: PanelSize,
    cache: PlacementCache,
    position: PositionStyle,
    exit_started: Option<Instant>,
}

impl PopupState {
    fn recompute(&mut self, params: Params, viewport: Viewport) -> PositionStyle {
        self.position = self.cache.resolve(PlacementInputs {
            anchor: self.anchor_rect,
            direction: params.direction,
            offset: params.offset,
            panel: self.panel_size,
            auto_reposition: params.auto_reposition,
            viewport,
        });
        self.position
    }
}

pub struct Popup {
    hub: EventHub,
    config: PopupConfig,
    anchor: NodeId,
    panel: NodeId,
    mask: Option<NodeId>,
    open: Signal<bool>,
    state: Rc<RefCell<PopupState>>,
    dismiss: DismissalCoordinator,
    // window watchers of the current open; disposed when it ends
    watch: Option<Scope>,
}

impl Popup {
    pub fn new(
        hub: &EventHub,
        tree: &mut NodeTree,
        anchor: NodeId,
        config: PopupConfig,
    ) -> Result<Self> {
        if tree.get(anchor).is_none() {
            return Err(Error::UnknownNode(anchor));
        }
        let options = config.dismiss_options()?;

        let overlay = tree.overlay();
        let mask = if config.mask {
            Some(tree.insert(overlay, Node::new("div").class("perch-mask").hidden())?)
        } else {
            None
        };
        let panel = tree.insert(overlay, Node::new("div").class("perch-panel").hidden())?;

        let open = signal(false);
        let state = Rc::new(RefCell::new(PopupState {
            phase: OpenPhase::Closed,
            anchor_rect: None,
            panel_size: PanelSize::default(),
            cache: PlacementCache::new(),
            position: PositionStyle::Unpositioned {
                direction: config.direction,
            },
            exit_started: None,
        }));

        let dismiss = DismissalCoordinator::new(hub, options);
        dismiss.set_root(Some(panel));
        dismiss.set_on_close({
            let state = Rc::downgrade(&state);
            let open = open.clone();
            let hub = hub.clone();
            move |reason| {
                log::debug!("popup: dismissed ({reason:?})");
                begin_exit(&state, &open, hub.now());
            }
        });

        Ok(Self {
            hub: hub.clone(),
            config,
            anchor,
            panel,
            mask,
            open,
            state,
            dismiss,
            watch: None,
        })
    }

    fn params(&self) -> Params {
        Params {
            direction: self.config.direction,
            offset: self.config.offset,
            auto_reposition: self.config.auto_reposition,
        }
    }

    pub fn config(&self) -> &PopupConfig {
        &self.config
    }
    pub fn anchor(&self) -> NodeId {
        self.anchor
    }
    pub fn panel(&self) -> NodeId {
        self.panel
    }
    pub fn mask_node(&self) -> Option<NodeId> {
        self.mask
    }
    pub fn phase(&self) -> OpenPhase {
        self.state.borrow().phase
    }
    pub fn is_open(&self) -> bool {
        self.open.get()
    }
    pub fn open_signal(&self) -> Signal<bool> {
        self.open.clone()
    }
    pub fn dismissal(&self) -> &DismissalCoordinator {
        &self.dismiss
    }

    /// Last computed position.
    pub fn position(&self) -> PositionStyle {
        self.state.borrow().position
    }

    pub fn style(&self) -> PanelStyle {
        let st = self.state.borrow();
        PanelStyle::resolve(st.position, st.phase)
    }

    pub fn mask_style(&self) -> Option<PanelStyle> {
        self.mask.map(|_| PanelStyle::mask(self.phase()))
    }

    pub fn open(&mut self, tree: &mut NodeTree) -> Result<()> {
        // settle whatever a dismissal left behind before changing phase
        self.sync();
        if self.phase() == OpenPhase::Open {
            return Ok(());
        }

        tree.set_visible(self.panel, true)?;
        if let Some(mask) = self.mask {
            tree.set_visible(mask, true)?;
        }

        let anchor_rect = tree.measure(self.anchor);
        if anchor_rect.is_none() {
            log::debug!("popup: anchor {:?} not laid out yet", self.anchor);
        }
        let position = {
            let mut st = self.state.borrow_mut();
            st.phase = OpenPhase::Open;
            st.exit_started = None;
            st.anchor_rect = anchor_rect;
            st.panel_size = tree.measure_size(self.panel);
            st.recompute(self.params(), self.hub.viewport())
        };
        log::debug!("popup: open at {position:?}");

        self.open.replace_if_changed(true);
        self.sync();
        self.watch_window();
        Ok(())
    }

    /// Explicit close request. The panel plays its exit before unmounting.
    pub fn close(&mut self) {
        if self.phase() != OpenPhase::Open {
            return;
        }
        self.dismiss.request_close();
        if self.phase() == OpenPhase::Open {
            // coordinator was not listening; close directly
            begin_exit(&Rc::downgrade(&self.state), &self.open, self.hub.now());
        }
        self.sync();
    }

    pub fn toggle(&mut self, tree: &mut NodeTree) -> Result<()> {
        if self.phase() == OpenPhase::Open {
            self.close();
            Ok(())
        } else {
            self.open(tree)
        }
    }

    /// Exit transition finished: hide the panel and return to `Closed`.
    pub fn finish_exit(&mut self, tree: &mut NodeTree) -> Result<()> {
        if self.phase() == OpenPhase::Open {
            return Ok(());
        }
        tree.set_visible(self.panel, false)?;
        if let Some(mask) = self.mask {
            tree.set_visible(mask, false)?;
        }
        {
            let mut st = self.state.borrow_mut();
            st.phase = OpenPhase::Closed;
            st.exit_started = None;
            st.anchor_rect = None;
        }
        self.sync();
        log::debug!("popup: unmounted");
        Ok(())
    }

    /// Per-frame upkeep. Completes the exit transition once it has run for
    /// `exit_duration_ms`; returns whether the panel was unmounted.
    pub fn tick(&mut self, tree: &mut NodeTree) -> Result<bool> {
        self.sync();
        let started = {
            let st = self.state.borrow();
            (st.phase == OpenPhase::Exiting).then_some(st.exit_started).flatten()
        };
        let Some(started) = started else {
            return Ok(false);
        };
        let elapsed = self.hub.now().saturating_duration_since(started);
        if elapsed >= Duration::from_millis(self.config.exit_duration_ms) {
            self.finish_exit(tree)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Read the panel's laid-out size and recompute the placement.
    pub fn measure_panel(&mut self, tree: &NodeTree) -> PositionStyle {
        let mut st = self.state.borrow_mut();
        st.panel_size = tree.measure_size(self.panel);
        st.recompute(self.params(), self.hub.viewport())
    }

    /// Remeasure the anchor (e.g. after the host moved it) and recompute.
    pub fn remeasure_anchor(&mut self, tree: &NodeTree) -> PositionStyle {
        let mut st = self.state.borrow_mut();
        if st.phase == OpenPhase::Open {
            st.anchor_rect = tree.measure(self.anchor);
        }
        st.recompute(self.params(), self.hub.viewport())
    }

    /// Remove the panel and mask from the tree. The popup is consumed.
    pub fn unmount(mut self, tree: &mut NodeTree) -> Result<()> {
        self.stop_watching();
        tree.remove(self.panel)?;
        if let Some(mask) = self.mask {
            tree.remove(mask)?;
        }
        Ok(())
    }

    fn sync(&mut self) {
        let phase = self.phase();
        let is_active = phase == OpenPhase::Open;
        self.dismiss.sync(is_active, true);
        if !is_active {
            self.stop_watching();
        }
    }

    fn watch_window(&mut self) {
        self.stop_watching();
        let hub = self.hub.clone();
        let state = Rc::downgrade(&self.state);
        let (anchor, panel, params) = (self.anchor, self.panel, self.params());

        let scope = Scope::new();
        scope.run(|| {
            effect(move || {
                let handler = {
                    let hub = hub.clone();
                    move |_: &WindowEvent, tree: &NodeTree| {
                        reposition(&state, &hub, tree, anchor, panel, params)
                    }
                };
                Dispose::all([
                    Dispose::holding(hub.listen(EventKind::Resize, Phase::Bubble, handler.clone())),
                    Dispose::holding(hub.listen(EventKind::Scroll, Phase::Capture, handler)),
                ])
            })
        });
        self.watch = Some(scope);
    }

    fn stop_watching(&mut self) {
        if let Some(scope) = self.watch.take() {
            scope.dispose();
        }
    }
}

fn begin_exit(state: &Weak<RefCell<PopupState>>, open: &Signal<bool>, now: Instant) {
    let Some(state) = state.upgrade() else { return };
    {
        let mut st = state.borrow_mut();
        if st.phase != OpenPhase::Open {
            return;
        }
        st.phase = OpenPhase::Exiting;
        st.exit_started = Some(now);
    }
    open.replace_if_changed(false);
}

fn reposition(
    state: &Weak<RefCell<PopupState>>,
    hub: &EventHub,
    tree: &NodeTree,
    anchor: NodeId,
    panel: NodeId,
    params: Params,
) {
    let Some(state) = state.upgrade() else { return };
    let mut st = state.borrow_mut();
    if st.phase != OpenPhase::Open {
        return;
    }
    st.anchor_rect = tree.measure(anchor);
    if tree.rect(panel).is_some() {
        st.panel_size = tree.measure_size(panel);
    }
    let position = st.recompute(params, hub.viewport());
    log::trace!("popup: repositioned to {position:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ManualClock, EventHub, NodeTree, NodeId) {
        let _ = env_logger::builder().is_test(true).try_init();
        let clock = ManualClock::new();
        let hub = EventHub::with_clock(Viewport::new(800.0, 600.0), clock.clone());
        let mut tree = NodeTree::new();
        let anchor = tree
            .insert(
                tree.body(),
                Node::new("button").rect(Rect::new(100.0, 500.0, 100.0, 40.0)),
            )
            .unwrap();
        (clock, hub, tree, anchor)
    }

    #[test]
    fn open_then_measure_corrects_provisional_position() {
        let (_, hub, mut tree, anchor) = setup();
        let mut popup = Popup::new(
            &hub,
            &mut tree,
            anchor,
            PopupConfig::default().offset(Offset::new(5.0, 0.0)),
        )
        .unwrap();

        popup.open(&mut tree).unwrap();
        assert!(popup.is_open());
        assert!(tree.is_visible(popup.panel()));
        let provisional = popup.position().placement().unwrap();
        assert_eq!(provisional.top, 545.0);

        tree.set_rect(popup.panel(), Rect::new(0.0, 0.0, 160.0, 300.0))
            .unwrap();
        let settled = popup.measure_panel(&tree).placement().unwrap();
        assert_eq!(settled.resolved_direction, Direction::Top);
        assert_eq!(settled.top, 195.0);
        assert_eq!(popup.style().origin, Direction::Bottom);
    }

    #[test]
    fn remeasure_follows_an_anchor_the_host_moved() {
        let (_, hub, mut tree, anchor) = setup();
        let mut popup = Popup::new(&hub, &mut tree, anchor, PopupConfig::select()).unwrap();
        popup.open(&mut tree).unwrap();
        assert_eq!(popup.position().placement().unwrap().top, 544.0);

        // layout moved the trigger without any window event
        tree.set_rect(anchor, Rect::new(300.0, 100.0, 100.0, 40.0))
            .unwrap();
        assert_eq!(popup.position().placement().unwrap().top, 544.0);

        let moved = popup.remeasure_anchor(&tree).placement().unwrap();
        assert_eq!((moved.top, moved.left), (144.0, 300.0));
        assert_eq!(moved.resolved_direction, Direction::Bottom);
    }

    #[test]
    fn duration_builders_saturate_to_millis() {
        let config = PopupConfig::default()
            .dismiss_delay(Duration::from_millis(250))
            .exit_duration(Duration::MAX);
        assert_eq!(config.dismiss_delay_ms, 250);
        assert_eq!(config.exit_duration_ms, u64::MAX);
        assert_eq!(PopupConfig::default().dismiss_delay_ms, 100);
    }

    #[test]
    fn unmeasured_anchor_stays_unpositioned() {
        let (_, hub, mut tree, _) = setup();
        let bare = tree.insert(tree.body(), Node::new("span")).unwrap();
        let mut popup = Popup::new(&hub, &mut tree, bare, PopupConfig::select()).unwrap();
        popup.open(&mut tree).unwrap();
        assert_eq!(
            popup.position(),
            PositionStyle::Unpositioned {
                direction: Direction::Bottom
            }
        );
        assert_eq!(popup.style().top, None);
    }

    #[test]
    fn explicit_close_exits_then_unmounts_after_transition() {
        let (clock, hub, mut tree, anchor) = setup();
        let mut popup = Popup::new(&hub, &mut tree, anchor, PopupConfig::select()).unwrap();
        popup.open(&mut tree).unwrap();

        popup.close();
        assert_eq!(popup.phase(), OpenPhase::Exiting);
        assert!(!popup.is_open());
        assert!(!popup.dismissal().is_listening());
        assert!(tree.is_visible(popup.panel()));

        clock.advance_ms(100);
        assert!(!popup.tick(&mut tree).unwrap());
        clock.advance_ms(50);
        assert!(popup.tick(&mut tree).unwrap());
        assert_eq!(popup.phase(), OpenPhase::Closed);
        assert!(!tree.is_visible(popup.panel()));
    }

    #[test]
    fn reopen_after_dismissal_listens_again() {
        let (clock, hub, mut tree, anchor) = setup();
        let mut popup = Popup::new(&hub, &mut tree, anchor, PopupConfig::select()).unwrap();
        popup.open(&mut tree).unwrap();

        hub.dispatch(&tree, WindowEvent::Resize(Viewport::new(700.0, 600.0)));
        assert_eq!(popup.phase(), OpenPhase::Exiting);

        popup.open(&mut tree).unwrap();
        assert_eq!(popup.phase(), OpenPhase::Open);
        assert!(popup.dismissal().is_listening());

        hub.dispatch(
            &tree,
            WindowEvent::PointerDown(PointerEvent::down(None, Vec2::default())),
        );
        clock.advance_ms(100);
        hub.run_due_timers();
        assert!(!popup.is_open());
        assert_eq!(popup.dismissal().close_count(), 2);
    }

    #[test]
    fn toggle_and_unmount_release_everything() {
        let (_, hub, mut tree, anchor) = setup();
        let before = tree.len();
        let mut popup =
            Popup::new(&hub, &mut tree, anchor, PopupConfig::drawer(Direction::Left)).unwrap();
        assert_eq!(tree.len(), before + 2);

        popup.toggle(&mut tree).unwrap();
        assert!(popup.mask_style().unwrap().visible);
        assert!(hub.listener_count() > 0);

        popup.toggle(&mut tree).unwrap();
        assert_eq!(popup.phase(), OpenPhase::Exiting);

        popup.unmount(&mut tree).unwrap();
        assert_eq!(tree.len(), before);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn bad_exclusion_selector_is_rejected() {
        let (_, hub, mut tree, anchor) = setup();
        let err = Popup::new(
            &hub,
            &mut tree,
            anchor,
            PopupConfig::select().exclude(["div >"]),
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::InvalidSelector { .. }));
    }

    #[test]
    fn unknown_anchor_is_rejected() {
        let (_, hub, mut tree, anchor) = setup();
        tree.remove(anchor).unwrap();
        let err = Popup::new(&hub, &mut tree, anchor, PopupConfig::select())
            .err()
            .unwrap();
        assert_eq!(err, Error::UnknownNode(anchor));
    }
}
