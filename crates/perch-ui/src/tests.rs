#[cfg(test)]
mod tests {
    use crate::*;
    use perch_core::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Page {
        clock: ManualClock,
        hub: EventHub,
        tree: NodeTree,
    }

    impl Page {
        fn new() -> Self {
            let _ = env_logger::builder().is_test(true).try_init();
            let clock = ManualClock::new();
            let hub = EventHub::with_clock(Viewport::new(800.0, 600.0), clock.clone());
            Self {
                clock,
                hub,
                tree: NodeTree::new(),
            }
        }

        fn add(&mut self, parent: NodeId, node: Node) -> NodeId {
            self.tree.insert(parent, node).unwrap()
        }

        fn click(&self, target: Option<NodeId>) {
            self.hub.dispatch(
                &self.tree,
                WindowEvent::PointerDown(PointerEvent::down(target, Vec2::default())),
            );
        }

        fn scroll(&self, target: Option<NodeId>) {
            self.hub.dispatch(
                &self.tree,
                WindowEvent::Scroll(ScrollEvent {
                    target,
                    delta: Vec2 { x: 0.0, y: 16.0 },
                }),
            );
        }

        fn wait_ms(&self, ms: u64) -> usize {
            self.clock.advance_ms(ms);
            self.hub.run_due_timers()
        }
    }

    #[test]
    fn select_near_bottom_flips_then_closes_on_outside_click() {
        let mut page = Page::new();
        let body = page.tree.body();
        let trigger = page.add(
            body,
            Node::new("button").rect(Rect::new(100.0, 500.0, 100.0, 40.0)),
        );
        let mut select =
            Popup::new(&page.hub, &mut page.tree, trigger, PopupConfig::select()).unwrap();

        select.open(&mut page.tree).unwrap();
        page.tree
            .set_rect(select.panel(), Rect::new(0.0, 0.0, 100.0, 300.0))
            .unwrap();
        let placed = select.measure_panel(&page.tree).placement().unwrap();
        assert_eq!(placed.resolved_direction, Direction::Top);
        assert_eq!(placed.top, 500.0 - 300.0 - 4.0);
        assert_eq!(placed.left, 100.0);

        page.click(Some(body));
        page.click(Some(body));
        assert_eq!(page.hub.pending_timers(), 1);

        assert_eq!(page.wait_ms(99), 0);
        assert!(select.is_open());
        assert_eq!(page.wait_ms(1), 1);
        assert_eq!(select.phase(), OpenPhase::Exiting);
        assert_eq!(select.dismissal().close_count(), 1);

        assert!(!select.tick(&mut page.tree).unwrap());
        page.clock.advance_ms(150);
        assert!(select.tick(&mut page.tree).unwrap());
        assert!(!page.tree.is_visible(select.panel()));
    }

    #[test]
    fn tag_menu_stays_open_while_typing_in_the_input() {
        let mut page = Page::new();
        let body = page.tree.body();
        let input = page.add(
            body,
            Node::new("div")
                .class("tag-input")
                .rect(Rect::new(40.0, 40.0, 300.0, 32.0)),
        );
        let chip = page.add(input, Node::new("span").class("chip"));
        let mut menu =
            Popup::new(&page.hub, &mut page.tree, input, PopupConfig::tag_menu()).unwrap();
        menu.open(&mut page.tree).unwrap();

        page.click(Some(input));
        page.click(Some(chip));
        assert!(!menu.dismissal().has_pending_close());

        // the excluded input scrolling its own content
        page.scroll(Some(input));
        assert!(menu.is_open());

        page.click(Some(body));
        page.wait_ms(100);
        assert_eq!(menu.phase(), OpenPhase::Exiting);
    }

    #[test]
    fn click_inside_panel_keeps_it_open() {
        let mut page = Page::new();
        let body = page.tree.body();
        let trigger = page.add(
            body,
            Node::new("button").rect(Rect::new(10.0, 10.0, 80.0, 30.0)),
        );
        let mut popup =
            Popup::new(&page.hub, &mut page.tree, trigger, PopupConfig::select()).unwrap();
        let option = page.add(popup.panel(), Node::new("li").attr("role", "option"));
        popup.open(&mut page.tree).unwrap();

        page.click(Some(option));
        page.click(Some(popup.panel()));
        assert_eq!(page.wait_ms(500), 0);
        assert!(popup.is_open());
    }

    #[test]
    fn drawer_follows_its_anchor_instead_of_closing() {
        let mut page = Page::new();
        let body = page.tree.body();
        let handle = page.add(
            body,
            Node::new("button").rect(Rect::new(0.0, 0.0, 40.0, 40.0)),
        );
        let mut drawer = Popup::new(
            &page.hub,
            &mut page.tree,
            handle,
            PopupConfig::drawer(Direction::Right),
        )
        .unwrap();
        drawer.open(&mut page.tree).unwrap();
        page.tree
            .set_rect(drawer.panel(), Rect::new(0.0, 0.0, 320.0, 600.0))
            .unwrap();
        let placed = drawer.measure_panel(&page.tree).placement().unwrap();
        assert_eq!((placed.top, placed.left), (0.0, 40.0));

        page.tree
            .set_rect(handle, Rect::new(10.0, 100.0, 40.0, 40.0))
            .unwrap();
        page.scroll(Some(body));
        assert_eq!(drawer.phase(), OpenPhase::Open);
        let placed = drawer.position().placement().unwrap();
        assert_eq!((placed.top, placed.left), (100.0, 50.0));

        page.hub
            .dispatch(&page.tree, WindowEvent::Resize(Viewport::new(400.0, 300.0)));
        assert!(drawer.is_open());
        // no auto-reposition: the drawer keeps its side even when it overflows
        assert_eq!(drawer.position().direction(), Direction::Right);

        // clicking the backdrop is an outside click
        let mask = drawer.mask_node().unwrap();
        page.click(Some(mask));
        page.wait_ms(100);
        assert_eq!(drawer.phase(), OpenPhase::Exiting);
        assert_eq!(drawer.mask_style().unwrap().opacity, 0.0);
    }

    #[test]
    fn resize_and_scroll_close_a_select() {
        let mut page = Page::new();
        let body = page.tree.body();
        let trigger = page.add(
            body,
            Node::new("button").rect(Rect::new(10.0, 10.0, 80.0, 30.0)),
        );
        let mut popup =
            Popup::new(&page.hub, &mut page.tree, trigger, PopupConfig::select()).unwrap();

        popup.open(&mut page.tree).unwrap();
        page.hub
            .dispatch(&page.tree, WindowEvent::Resize(Viewport::new(640.0, 480.0)));
        assert_eq!(popup.phase(), OpenPhase::Exiting);
        popup.finish_exit(&mut page.tree).unwrap();

        popup.open(&mut page.tree).unwrap();
        page.scroll(Some(body));
        assert_eq!(popup.phase(), OpenPhase::Exiting);
        assert_eq!(popup.dismissal().close_count(), 2);
    }

    #[test]
    fn two_panels_close_independently() {
        let mut page = Page::new();
        let body = page.tree.body();
        let a_trigger = page.add(
            body,
            Node::new("button").rect(Rect::new(100.0, 100.0, 100.0, 40.0)),
        );
        let b_trigger = page.add(
            body,
            Node::new("button").rect(Rect::new(400.0, 100.0, 100.0, 40.0)),
        );
        let mut a =
            Popup::new(&page.hub, &mut page.tree, a_trigger, PopupConfig::select()).unwrap();
        let mut b =
            Popup::new(&page.hub, &mut page.tree, b_trigger, PopupConfig::select()).unwrap();
        a.open(&mut page.tree).unwrap();
        b.open(&mut page.tree).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        b.open_signal().subscribe({
            let seen = seen.clone();
            move |open| seen.borrow_mut().push(*open)
        });

        page.click(Some(a.panel()));
        assert!(!a.dismissal().has_pending_close());
        assert!(b.dismissal().has_pending_close());

        page.wait_ms(100);
        assert!(a.is_open());
        assert_eq!(b.phase(), OpenPhase::Exiting);
        assert_eq!(*seen.borrow(), vec![false]);

        a.close();
        assert_eq!(a.phase(), OpenPhase::Exiting);
        assert_eq!(a.dismissal().close_count(), 1);
        assert_eq!(b.dismissal().close_count(), 1);
    }

    #[test]
    fn dropping_a_popup_releases_its_listeners() {
        let mut page = Page::new();
        let body = page.tree.body();
        let trigger = page.add(
            body,
            Node::new("button").rect(Rect::new(10.0, 10.0, 80.0, 30.0)),
        );
        {
            let mut popup =
                Popup::new(&page.hub, &mut page.tree, trigger, PopupConfig::select()).unwrap();
            popup.open(&mut page.tree).unwrap();
            page.click(Some(body));
            assert!(page.hub.listener_count() > 0);
            assert_eq!(page.hub.pending_timers(), 1);
        }
        assert_eq!(page.hub.listener_count(), 0);
        assert_eq!(page.hub.pending_timers(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_from_json_fills_defaults() {
        let json = r#"{
            "direction": "top",
            "offset": { "vertical": 4.0, "horizontal": 0.0 },
            "exclude_selectors": [".tag-input"],
            "triggers": "POINTER_DOWN"
        }"#;
        let config: PopupConfig = serde_json::from_str(json).unwrap();
        let expected = PopupConfig::default()
            .direction(Direction::Top)
            .offset(Offset::new(4.0, 0.0))
            .exclude([".tag-input"])
            .triggers(DismissTriggers::POINTER_DOWN);
        assert_eq!(config, expected);
        assert!(config.auto_reposition);
    }
}
