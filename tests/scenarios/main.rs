use euclid::default::{Point2D, Rect, Size2D};
use tabtree::{
    DropTarget, HostError, ItemRect, JsonFileStore, MemoryStore, SelectMode, TabEvent, TabHost,
    TabId, TabManagerApp, TreeIntent, VERSION, ViewId,
};

struct ScriptedHost {
    order: Vec<TabId>,
    pinned_count: usize,
    moves: Vec<(TabId, usize)>,
}

impl ScriptedHost {
    fn new(order: &[u32], pinned_count: usize) -> Self {
        Self {
            order: order.iter().map(|t| TabId(*t)).collect(),
            pinned_count,
            moves: Vec::new(),
        }
    }
}

impl TabHost for ScriptedHost {
    fn order(&self) -> Vec<TabId> {
        self.order.clone()
    }

    fn index_of(&self, tab: TabId) -> Option<usize> {
        self.order.iter().position(|t| *t == tab)
    }

    fn pinned(&self) -> Vec<TabId> {
        self.order[..self.pinned_count.min(self.order.len())].to_vec()
    }

    fn move_to(&mut self, tab: TabId, index: usize) -> Result<(), HostError> {
        let Some(current) = self.index_of(tab) else {
            return Err(HostError::MissingTab(tab.to_string()));
        };
        self.order.remove(current);
        self.order.insert(index.min(self.order.len()), tab);
        self.moves.push((tab, index));
        Ok(())
    }
}

fn created(tab: u32, index: usize) -> TabEvent {
    TabEvent::Created {
        tab: TabId(tab),
        opener: None,
        index,
        pinned: false,
        title: format!("tab {tab}"),
    }
}

fn open_tabs(app: &mut TabManagerApp, tabs: &[u32]) {
    let events: Vec<TabEvent> = tabs
        .iter()
        .enumerate()
        .map(|(i, tab)| created(*tab, i))
        .collect();
    app.absorb_events(&events);
}

fn rows_for(app: &TabManagerApp) -> Vec<ItemRect> {
    app.tree()
        .flatten_view(app.active_view())
        .into_iter()
        .enumerate()
        .map(|(i, node)| ItemRect {
            node,
            rect: Rect::new(
                Point2D::new(0.0, i as f32 * 40.0),
                Size2D::new(200.0, 40.0),
            ),
            depth: app.tree().get_node(node).map(|n| n.depth).unwrap_or(0),
        })
        .collect()
}

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(!VERSION.is_empty());
}

#[test]
fn drag_reparent_persists_across_restart_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path().join("tabs.json"));
    let mut host = ScriptedHost::new(&[1, 2], 0);

    let mut app = TabManagerApp::new();
    open_tabs(&mut app, &[1, 2]);
    let a = app.tree().node_for_tab(TabId(1)).unwrap();
    let b = app.tree().node_for_tab(TabId(2)).unwrap();

    // Drag row b a short way up, into a's center band, and release.
    let items = rows_for(&app);
    app.pointer_down(b, Point2D::new(5.0, 45.0), Point2D::new(0.0, 40.0));
    app.pointer_move(Point2D::new(5.0, 20.0), &items);
    assert_eq!(app.current_drop_target(), Some(DropTarget::Tab(a)));
    app.pointer_up();
    app.commit(&mut store, &mut host);

    // A fresh session restores the nesting from disk.
    let mut restored = TabManagerApp::new();
    restored.load(&store);
    let b2 = restored.tree().node_for_tab(TabId(2)).unwrap();
    let a2 = restored.tree().node_for_tab(TabId(1)).unwrap();
    assert_eq!(restored.tree().parent_of(b2), Some(a2));
    assert_eq!(restored.tree().get_node(b2).unwrap().depth, 1);
}

#[test]
fn multi_select_drop_moves_both_in_order_scenario() {
    let mut store = MemoryStore::new();
    let mut host = ScriptedHost::new(&[1, 2, 3, 4], 0);

    let mut app = TabManagerApp::new();
    open_tabs(&mut app, &[1, 2, 3, 4]);
    let nodes: Vec<_> = [1, 2, 3, 4]
        .iter()
        .map(|t| app.tree().node_for_tab(TabId(*t)).unwrap())
        .collect();

    app.apply_intents([
        TreeIntent::Select {
            node: nodes[1],
            mode: SelectMode::Single,
        },
        TreeIntent::Select {
            node: nodes[2],
            mode: SelectMode::Toggle,
        },
        TreeIntent::DropResolved {
            dragged: nodes[1],
            target: DropTarget::Tab(nodes[3]),
        },
    ]);
    let report = app.commit(&mut store, &mut host);

    let target = app.tree().get_node(nodes[3]).unwrap();
    assert_eq!(target.children, vec![nodes[1], nodes[2]]);
    assert_eq!(
        host.order,
        vec![TabId(1), TabId(4), TabId(2), TabId(3)]
    );
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 0);
}

#[test]
fn host_move_absorption_reaches_quiescence_scenario() {
    let mut store = MemoryStore::new();
    // The host has already applied the user's strip drag of tab 1 to the end.
    let mut host = ScriptedHost::new(&[2, 3, 1], 0);

    let mut app = TabManagerApp::new();
    open_tabs(&mut app, &[1, 2, 3]);
    app.absorb_events(&[TabEvent::Moved {
        tab: TabId(1),
        to_index: 2,
    }]);

    let flat: Vec<_> = app
        .tree()
        .flatten_view(app.active_view())
        .iter()
        .map(|id| app.tree().get_node(*id).unwrap().external_ref.unwrap())
        .collect();
    assert_eq!(flat, vec![TabId(2), TabId(3), TabId(1)]);

    // Tree order now matches the strip, so the commit moves nothing.
    let report = app.commit(&mut store, &mut host);
    assert_eq!(report.applied, 0);
    assert!(host.moves.is_empty());
}

#[test]
fn cross_window_updates_coalesce_scenario() {
    let mut store = MemoryStore::new();
    let mut host = ScriptedHost::new(&[], 0);

    let mut writer = TabManagerApp::new();
    let mut reader = TabManagerApp::new();
    let updates = writer.subscribe();
    let endpoint = reader.state_endpoint();

    // The writer commits three times; each update is forwarded to the
    // reader's endpoint, as a window bridge would.
    for tab in 1..=3 {
        writer.absorb_events(&[created(tab, (tab - 1) as usize)]);
        host.order.push(TabId(tab));
        writer.commit(&mut store, &mut host);
    }
    while let Ok(update) = updates.try_recv() {
        let _ = endpoint.send(update.snapshot);
    }

    let absorbed = reader.pump_state_changes();
    assert_eq!(absorbed, 1);
    assert_eq!(reader.tree().node_count(), 3);
    assert_eq!(reader.pump_state_changes(), 0);
}

#[test]
fn pinned_reorder_bypasses_tree_scenario() {
    let mut store = MemoryStore::new();
    let mut host = ScriptedHost::new(&[1, 2], 2);

    let mut app = TabManagerApp::new();
    app.absorb_events(&[
        TabEvent::Created {
            tab: TabId(1),
            opener: None,
            index: 0,
            pinned: true,
            title: "p1".to_string(),
        },
        TabEvent::Created {
            tab: TabId(2),
            opener: None,
            index: 1,
            pinned: true,
            title: "p2".to_string(),
        },
    ]);
    app.commit(&mut store, &mut host);
    let roots_before = app.tree().root_order(ViewId::fallback()).to_vec();
    let saves_before = store.save_count();
    host.moves.clear();

    let n2 = app.tree().node_for_tab(TabId(2)).unwrap();
    app.apply_intents([TreeIntent::DropResolved {
        dragged: n2,
        target: DropTarget::HorizontalGap { insert_index: 0 },
    }]);
    app.commit(&mut store, &mut host);

    assert_eq!(host.order, vec![TabId(2), TabId(1)]);
    assert_eq!(host.moves, vec![(TabId(2), 0)]);
    // The tree holds no pinned order, so nothing was saved or restructured.
    assert_eq!(app.tree().root_order(ViewId::fallback()), roots_before);
    assert_eq!(store.save_count(), saves_before);
}

#[test]
fn grouping_leaves_strip_order_unchanged_scenario() {
    let mut store = MemoryStore::new();
    let mut host = ScriptedHost::new(&[1, 2, 3], 0);

    let mut app = TabManagerApp::new();
    open_tabs(&mut app, &[1, 2, 3]);
    let n1 = app.tree().node_for_tab(TabId(1)).unwrap();
    let n2 = app.tree().node_for_tab(TabId(2)).unwrap();
    app.commit(&mut store, &mut host);

    app.apply_intents([TreeIntent::GroupTabs {
        members: vec![n1, n2],
    }]);
    let report = app.commit(&mut store, &mut host);

    let roots = app.tree().root_order(ViewId::fallback());
    let header = roots[0];
    let header_node = app.tree().get_node(header).unwrap();
    assert_eq!(header_node.external_ref, None);
    assert_eq!(header_node.children, vec![n1, n2]);
    // The synthetic header owns no strip item; the host saw no moves.
    assert_eq!(report.applied, 0);
    assert!(host.moves.is_empty());
    assert_eq!(host.order, vec![TabId(1), TabId(2), TabId(3)]);
}
