/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Coordinator owning the tab tree.
//!
//! `TabManagerApp` is the single writer: every structural edit, whether a
//! user gesture or a host lifecycle event, becomes a `TreeIntent` applied by
//! the reducer. The UI surface and other observers only ever read.
//!
//! A commit persists the snapshot first, then broadcasts it, then issues
//! host moves, so observers and the host flat list trail the durable tree
//! rather than lead it. Inbound "state changed elsewhere" notifications are
//! coalesced by `pump_state_changes`.

use std::collections::HashSet;
use std::ops::{Deref, RangeInclusive};

use crossbeam_channel::{Receiver, Sender, unbounded};
use euclid::default::Point2D;
use log::{debug, warn};

use crate::drag::{DragConfig, DragEnd, DragSession, DragUpdate};
use crate::geometry::{self, ClassifierConfig, DropTarget, GapNeighbor, ItemRect};
use crate::host::{TabEvent, TabHost, TabId};
use crate::persistence::SnapshotStore;
use crate::persistence::types::TreeSnapshot;
use crate::reconcile;
use crate::sync::{self, SyncReport};
use crate::tree::{NodeId, Tree, ViewId};

/// How a selection intent combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Replace the selection with the one node.
    Single,
    /// Flip the one node's membership.
    Toggle,
    /// Replace with the anchor-to-node range over the node's view flatten.
    Range,
}

/// Canonical node-selection state.
///
/// Wraps the selected set with insertion order, a range anchor, and a
/// monotonic revision so consumers can reason about selection changes
/// deterministically. The drag move set reads the insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    nodes: HashSet<NodeId>,
    order: Vec<NodeId>,
    anchor: Option<NodeId>,
    revision: u64,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic revision incremented whenever the selection changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Range-extension anchor (most recent explicitly selected node).
    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    /// Selected nodes in the order they were selected.
    pub fn ordered(&self) -> &[NodeId] {
        &self.order
    }

    pub fn select_single(&mut self, node: NodeId) {
        if self.nodes.len() == 1 && self.nodes.contains(&node) && self.anchor == Some(node) {
            return;
        }
        self.nodes.clear();
        self.order.clear();
        self.nodes.insert(node);
        self.order.push(node);
        self.anchor = Some(node);
        self.revision = self.revision.saturating_add(1);
    }

    pub fn toggle(&mut self, node: NodeId) {
        if self.nodes.remove(&node) {
            self.order.retain(|existing| *existing != node);
        } else if self.nodes.insert(node) {
            self.order.push(node);
        }
        self.anchor = Some(node);
        self.revision = self.revision.saturating_add(1);
    }

    /// Replace the selection with an anchor-to-target range. The anchor
    /// stays put so a further range-select re-extends from it.
    pub fn replace_with_range(&mut self, keys: Vec<NodeId>) {
        self.nodes.clear();
        self.order.clear();
        for key in keys {
            if self.nodes.insert(key) {
                self.order.push(key);
            }
        }
        self.revision = self.revision.saturating_add(1);
    }

    pub fn clear(&mut self) {
        if self.nodes.is_empty() && self.anchor.is_none() {
            return;
        }
        self.nodes.clear();
        self.order.clear();
        self.anchor = None;
        self.revision = self.revision.saturating_add(1);
    }

    /// Drop members the tree no longer contains.
    pub fn prune(&mut self, tree: &Tree) {
        let before = self.order.len();
        self.order.retain(|id| tree.get_node(*id).is_some());
        self.nodes.retain(|id| tree.get_node(*id).is_some());
        if self.anchor.is_some_and(|a| tree.get_node(a).is_none()) {
            self.anchor = self.order.last().copied();
        }
        if self.order.len() != before {
            self.revision = self.revision.saturating_add(1);
        }
    }
}

impl Deref for SelectionState {
    type Target = HashSet<NodeId>;

    fn deref(&self) -> &Self::Target {
        &self.nodes
    }
}

/// A structural or selection request, applied by the reducer.
#[derive(Debug, Clone)]
pub enum TreeIntent {
    TabOpened {
        tab: TabId,
        opener: Option<TabId>,
        index: usize,
        pinned: bool,
        title: String,
    },
    TabClosed {
        tab: TabId,
    },
    TabMoved {
        tab: TabId,
        to_index: usize,
    },
    TabActivated {
        tab: TabId,
    },
    TabPinStateChanged {
        tab: TabId,
        pinned: bool,
    },
    DropResolved {
        dragged: NodeId,
        target: DropTarget,
    },
    ToggleExpanded {
        node: NodeId,
    },
    Select {
        node: NodeId,
        mode: SelectMode,
    },
    GroupTabs {
        members: Vec<NodeId>,
    },
    SendToView {
        node: NodeId,
        view: ViewId,
    },
    AddView {
        name: String,
    },
    RenameView {
        view: ViewId,
        name: String,
    },
    RemoveView {
        view: ViewId,
    },
}

/// Broadcast to subscribers after every commit.
#[derive(Debug, Clone)]
pub struct TreeUpdate {
    /// Commit counter, monotonic within one coordinator.
    pub revision: u64,
    pub snapshot: TreeSnapshot,
}

/// Translate host lifecycle events into reducer intents.
///
/// Pure with respect to the tree: events for tabs the tree has never seen
/// are dropped here (tracking creations within the batch itself), so the
/// reducer only receives intents it can apply.
pub fn events_to_intents(tree: &Tree, events: &[TabEvent]) -> Vec<TreeIntent> {
    let mut known: HashSet<TabId> = tree.nodes().filter_map(|node| node.external_ref).collect();
    let mut intents = Vec::with_capacity(events.len());
    for event in events {
        match event {
            TabEvent::Created {
                tab,
                opener,
                index,
                pinned,
                title,
            } => {
                if !known.insert(*tab) {
                    debug!("Skipping duplicate create for {tab}");
                    continue;
                }
                intents.push(TreeIntent::TabOpened {
                    tab: *tab,
                    opener: *opener,
                    index: *index,
                    pinned: *pinned,
                    title: title.clone(),
                });
            }
            TabEvent::Removed { tab } => {
                if known.remove(tab) {
                    intents.push(TreeIntent::TabClosed { tab: *tab });
                }
            }
            TabEvent::Moved { tab, to_index } => {
                if known.contains(tab) {
                    intents.push(TreeIntent::TabMoved {
                        tab: *tab,
                        to_index: *to_index,
                    });
                }
            }
            TabEvent::Activated { tab } => {
                if known.contains(tab) {
                    intents.push(TreeIntent::TabActivated { tab: *tab });
                }
            }
            TabEvent::PinnedChanged { tab, pinned } => {
                if known.contains(tab) {
                    intents.push(TreeIntent::TabPinStateChanged {
                        tab: *tab,
                        pinned: *pinned,
                    });
                }
            }
        }
    }
    intents
}

pub struct TabManagerApp {
    tree: Tree,
    selection: SelectionState,
    drag: DragSession,
    classifier: ClassifierConfig,
    active_view: ViewId,
    active_node: Option<NodeId>,
    /// Pinned-row reorder staged by a `HorizontalGap` drop; issued as one
    /// direct host move on the next commit, without touching the tree.
    pending_pinned_move: Option<(TabId, usize)>,
    dirty: bool,
    commit_revision: u64,
    subscribers: Vec<Sender<TreeUpdate>>,
    state_tx: Sender<TreeSnapshot>,
    state_rx: Receiver<TreeSnapshot>,
}

impl TabManagerApp {
    pub fn new() -> Self {
        Self::with_config(DragConfig::default(), ClassifierConfig::default())
    }

    pub fn with_config(drag: DragConfig, classifier: ClassifierConfig) -> Self {
        let (state_tx, state_rx) = unbounded();
        Self {
            tree: Tree::new(),
            selection: SelectionState::new(),
            drag: DragSession::new(drag),
            classifier,
            active_view: ViewId::fallback(),
            active_node: None,
            pending_pinned_move: None,
            dirty: false,
            commit_revision: 0,
            subscribers: Vec::new(),
            state_tx,
            state_rx,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn active_view(&self) -> ViewId {
        self.active_view
    }

    pub fn active_node(&self) -> Option<NodeId> {
        self.active_node
    }

    /// Whether the tree has uncommitted changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn current_drop_target(&self) -> Option<DropTarget> {
        self.drag.current_target()
    }

    pub fn set_active_view(&mut self, view: ViewId) -> bool {
        if !self.tree.has_view(view) {
            return false;
        }
        self.active_view = view;
        true
    }

    /// Create a view and hand back its id. Reducer intents cover the
    /// name-only form; callers that need the id use this.
    pub fn add_view(&mut self, name: impl Into<String>) -> ViewId {
        let id = self.tree.add_view(name);
        self.dirty = true;
        id
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Restore from a snapshot store. Missing or unreadable state is a cold
    /// start, never an error.
    pub fn load<S: SnapshotStore>(&mut self, store: &S) {
        match store.load() {
            Ok(Some(snapshot)) => self.absorb_snapshot(&snapshot),
            Ok(None) => debug!("No snapshot to restore, starting cold"),
            Err(err) => warn!("Snapshot restore failed, starting cold: {err}"),
        }
    }

    /// Translate host lifecycle events and apply them in one reducer batch.
    pub fn absorb_events(&mut self, events: &[TabEvent]) {
        let intents = events_to_intents(&self.tree, events);
        self.apply_intents(intents);
    }

    /// Apply a batch of intents deterministically in insertion order.
    pub fn apply_intents<I>(&mut self, intents: I)
    where
        I: IntoIterator<Item = TreeIntent>,
    {
        for intent in intents {
            self.apply_intent(intent);
        }
    }

    fn apply_intent(&mut self, intent: TreeIntent) {
        match intent {
            TreeIntent::TabOpened {
                tab,
                opener,
                index,
                pinned,
                title,
            } => self.absorb_tab_opened(tab, opener, index, pinned, title),
            TreeIntent::TabClosed { tab } => {
                if let Some(node) = self.tree.node_for_tab(tab) {
                    self.tree.remove_node(node);
                    self.selection.prune(&self.tree);
                    if self.active_node == Some(node) {
                        self.active_node = None;
                    }
                    // A session holding the removed node was concluded
                    // elsewhere; it must not resolve here.
                    if self.drag.dragged_node() == Some(node) {
                        self.drag.cancel();
                    }
                    self.dirty = true;
                }
            }
            TreeIntent::TabMoved { tab, to_index } => self.absorb_tab_moved(tab, to_index),
            TreeIntent::TabActivated { tab } => {
                if let Some(node) = self.tree.node_for_tab(tab) {
                    self.active_node = Some(node);
                    self.selection.select_single(node);
                }
            }
            TreeIntent::TabPinStateChanged { tab, pinned } => {
                if let Some(node) = self.tree.node_for_tab(tab)
                    && self.tree.set_pinned(node, pinned)
                {
                    self.dirty = true;
                }
            }
            TreeIntent::DropResolved { dragged, target } => {
                self.resolve_drop(dragged, &target);
            }
            TreeIntent::ToggleExpanded { node } => {
                if let Some(n) = self.tree.get_node(node) {
                    let next = !n.is_expanded;
                    self.tree.set_expanded(node, next);
                    self.dirty = true;
                }
            }
            TreeIntent::Select { node, mode } => self.apply_select(node, mode),
            TreeIntent::GroupTabs { members } => self.group_tabs(&members),
            TreeIntent::SendToView { node, view } => {
                if self.tree.get_node(node).is_some()
                    && self.tree.has_view(view)
                    && self.tree.attach_root(view, node, None)
                {
                    self.dirty = true;
                }
            }
            TreeIntent::AddView { name } => {
                self.tree.add_view(name);
                self.dirty = true;
            }
            TreeIntent::RenameView { view, name } => {
                if self.tree.rename_view(view, name) {
                    self.dirty = true;
                }
            }
            TreeIntent::RemoveView { view } => {
                if self.tree.remove_view(view) {
                    if self.active_view == view {
                        self.active_view = ViewId::fallback();
                    }
                    self.dirty = true;
                }
            }
        }
    }

    fn absorb_tab_opened(
        &mut self,
        tab: TabId,
        opener: Option<TabId>,
        index: usize,
        pinned: bool,
        title: String,
    ) {
        if self.tree.node_for_tab(tab).is_some() {
            warn!("Duplicate create for {tab}, ignoring");
            return;
        }
        let view = self.active_view;
        if pinned {
            self.tree.add_tab_node(tab, view, title, true);
            self.dirty = true;
            return;
        }
        let opener_node = opener.and_then(|o| self.tree.node_for_tab(o));
        let root_slot = match opener_node {
            Some(_) => None,
            None => self.root_slot_for_host_index(view, index),
        };
        let node = self.tree.add_tab_node(tab, view, title, false);
        match opener_node {
            Some(parent) => {
                // Children open below their opener's existing children.
                self.tree.attach_child(parent, node, None);
            }
            None => {
                if let Some(slot) = root_slot {
                    self.tree.attach_root(view, node, Some(slot));
                }
            }
        }
        self.dirty = true;
    }

    /// Root slot in `view` whose subtree begins at or after flat position
    /// `index` in the host list. A position inside a subtree resolves past
    /// it; a root cannot be spliced into another root's span.
    fn root_slot_for_host_index(&self, view: ViewId, index: usize) -> Option<usize> {
        let target = index.saturating_sub(self.pinned_count(view));
        let mut flat_pos = 0usize;
        for (slot, root) in self.tree.root_order(view).iter().enumerate() {
            let Some(node) = self.tree.get_node(*root) else {
                continue;
            };
            if node.pinned {
                continue;
            }
            if flat_pos >= target {
                return Some(slot);
            }
            flat_pos += self
                .tree
                .subtree_ids(*root)
                .iter()
                .filter(|id| {
                    self.tree
                        .get_node(**id)
                        .is_some_and(|n| n.external_ref.is_some())
                })
                .count();
        }
        None
    }

    /// Number of pinned roots in a view, the tree-side image of the host's
    /// pinned prefix.
    fn pinned_count(&self, view: ViewId) -> usize {
        self.tree
            .root_order(view)
            .iter()
            .filter(|id| self.tree.get_node(**id).is_some_and(|n| n.pinned))
            .count()
    }

    /// A move observed in the host strip, re-absorbed as a gap drop at the
    /// tab's new flattened position so tree order follows the host. A moved
    /// pinned tab is skipped: its order lives in the host prefix alone, and
    /// the tree holds nothing to update for it.
    fn absorb_tab_moved(&mut self, tab: TabId, to_index: usize) {
        let Some(node) = self.tree.node_for_tab(tab) else {
            return;
        };
        let Some((view, pinned)) = self
            .tree
            .get_node(node)
            .map(|n| (n.view_id, n.pinned))
        else {
            return;
        };
        if pinned {
            return;
        }
        let target = self.gap_for_flat_index(view, node, to_index);
        if let Some(next) = reconcile::apply_drop(&self.tree, node, &[], &target) {
            self.tree = next;
            self.dirty = true;
        }
    }

    /// Engine-side image of a host flat position as a gap target. The moved
    /// node's subtree is excluded, as are pinned roots and synthetic headers
    /// the host list does not contain.
    fn gap_for_flat_index(&self, view: ViewId, moved: NodeId, to_index: usize) -> DropTarget {
        let excluded: HashSet<NodeId> = self.tree.subtree_ids(moved).into_iter().collect();
        let effective: Vec<NodeId> = self
            .tree
            .flatten_view(view)
            .into_iter()
            .filter(|id| !excluded.contains(id))
            .filter(|id| {
                self.tree
                    .get_node(*id)
                    .is_some_and(|n| !n.pinned && n.external_ref.is_some())
            })
            .collect();
        let index = to_index
            .saturating_sub(self.pinned_count(view))
            .min(effective.len());
        let neighbor = |id: &NodeId| GapNeighbor {
            node: *id,
            depth: self.tree.get_node(*id).map(|n| n.depth).unwrap_or(0),
        };
        DropTarget::Gap {
            index,
            above: index.checked_sub(1).and_then(|j| effective.get(j)).map(neighbor),
            below: effective.get(index).map(neighbor),
        }
    }

    fn apply_select(&mut self, node: NodeId, mode: SelectMode) {
        // Ignore stale keys.
        if self.tree.get_node(node).is_none() {
            return;
        }
        match mode {
            SelectMode::Single => self.selection.select_single(node),
            SelectMode::Toggle => self.selection.toggle(node),
            SelectMode::Range => self.extend_selection_to(node),
        }
    }

    fn extend_selection_to(&mut self, node: NodeId) {
        let Some(view) = self.tree.get_node(node).map(|n| n.view_id) else {
            return;
        };
        let flat = self.tree.flatten_view(view);
        let anchor_index = self
            .selection
            .anchor()
            .and_then(|anchor| flat.iter().position(|id| *id == anchor));
        let Some(anchor_index) = anchor_index else {
            self.selection.select_single(node);
            return;
        };
        let Some(target_index) = flat.iter().position(|id| *id == node) else {
            return;
        };
        let Some(range) = inclusive_index_range(anchor_index, target_index, flat.len()) else {
            return;
        };
        self.selection.replace_with_range(flat[range].to_vec());
    }

    /// Reparent members under a fresh synthetic header placed in the first
    /// member's slot.
    fn group_tabs(&mut self, members: &[NodeId]) {
        let live: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|id| self.tree.get_node(*id).is_some())
            .collect();
        let Some(first) = live.first().copied() else {
            return;
        };
        let Some(view) = self.tree.get_node(first).map(|n| n.view_id) else {
            return;
        };
        let parent = self.tree.parent_of(first);
        let at = self.tree.position_among_siblings(first);
        let header = self.tree.add_group_node(view, "Group".to_string());
        let placed = match parent {
            Some(p) => self.tree.attach_child(p, header, at),
            None => self.tree.attach_root(view, header, at),
        };
        if !placed {
            self.tree.remove_node(header);
            return;
        }
        for member in &live {
            if self.tree.attach_child(header, *member, None) {
                self.tree.set_group(*member, Some(header));
            }
        }
        self.dirty = true;
    }

    /// Apply a resolved drop. A `HorizontalGap` stages a pinned-row host
    /// move for the next commit; everything else reconciles the tree.
    /// Returns false when the drop was rejected as a no-op.
    fn resolve_drop(&mut self, dragged: NodeId, target: &DropTarget) -> bool {
        if let DropTarget::HorizontalGap { insert_index } = *target {
            // Only a pinned tab may take a slot in the pinned prefix.
            let Some(tab) = self
                .tree
                .get_node(dragged)
                .filter(|n| n.pinned)
                .and_then(|n| n.external_ref)
            else {
                return false;
            };
            self.pending_pinned_move = Some((tab, insert_index));
            return true;
        }
        let selection: Vec<NodeId> = self.selection.ordered().to_vec();
        match reconcile::apply_drop(&self.tree, dragged, &selection, target) {
            Some(next) => {
                self.tree = next;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Begin a potential drag over a node.
    pub fn pointer_down(&mut self, node: NodeId, pointer: Point2D<f32>, item_origin: Point2D<f32>) {
        let tab = self.tree.get_node(node).and_then(|n| n.external_ref);
        self.drag.pointer_down(node, tab, pointer, item_origin);
    }

    /// Feed a pointer move with freshly measured rows.
    pub fn pointer_move(&mut self, pointer: Point2D<f32>, items: &[ItemRect]) -> Vec<DragUpdate> {
        let excluded = self
            .drag
            .dragged_node()
            .map(|id| self.drag_exclusion(id))
            .unwrap_or_default();
        self.drag.pointer_move(pointer, items, &excluded, &self.classifier)
    }

    /// Release the pointer. A click selects the pressed node; a drop inside
    /// the boundary reconciles the tree (or stages a pinned-row move); an
    /// external drop is returned untouched for the caller's tear-out path.
    pub fn pointer_up(&mut self) -> Option<DragEnd> {
        let end = self.drag.pointer_up()?;
        match end {
            DragEnd::Click { node } => {
                self.apply_select(node, SelectMode::Single);
            }
            DragEnd::Drop {
                node,
                target,
                external,
            } => {
                if !external {
                    self.resolve_drop(node, &target);
                }
            }
            DragEnd::Cancelled => {}
        }
        Some(end)
    }

    /// Discard the active drag session, if any.
    pub fn cancel_drag(&mut self) -> bool {
        self.drag.cancel().is_some()
    }

    /// Classify a pointer against the pinned row. Feed the result back as a
    /// `DropResolved` intent to stage the reorder.
    pub fn classify_pinned(&self, pointer: Point2D<f32>, items: &[ItemRect]) -> DropTarget {
        let excluded = self
            .drag
            .dragged_node()
            .map(|id| HashSet::from([id]))
            .unwrap_or_default();
        geometry::classify_row(pointer, items, &excluded, &self.classifier)
    }

    /// Observer channel for committed tree states. A subscriber that goes
    /// away is pruned on the next send.
    pub fn subscribe(&mut self) -> Receiver<TreeUpdate> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Endpoint other contexts use to announce "state changed elsewhere".
    pub fn state_endpoint(&self) -> Sender<TreeSnapshot> {
        self.state_tx.clone()
    }

    /// Drain queued state-changed notifications and re-absorb.
    ///
    /// A burst is coalesced: the queue is drained to its newest payload,
    /// absorbed once, then drained once more for anything that raced in
    /// mid-absorption. Absorption runs at most twice per pump regardless of
    /// how many notifications were queued. Returns the number of
    /// absorptions performed.
    pub fn pump_state_changes(&mut self) -> usize {
        let mut absorbed = 0;
        for _ in 0..2 {
            let mut newest = None;
            while let Ok(snapshot) = self.state_rx.try_recv() {
                newest = Some(snapshot);
            }
            let Some(snapshot) = newest else {
                break;
            };
            self.absorb_snapshot(&snapshot);
            absorbed += 1;
        }
        absorbed
    }

    /// Replace the tree with another context's serialized state and bring
    /// every piece of session state back in bounds.
    fn absorb_snapshot(&mut self, snapshot: &TreeSnapshot) {
        self.tree = Tree::from_snapshot(snapshot);
        if !self.tree.has_view(self.active_view) {
            self.active_view = ViewId::fallback();
        }
        self.selection.prune(&self.tree);
        if self
            .active_node
            .is_some_and(|id| self.tree.get_node(id).is_none())
        {
            self.active_node = None;
        }
        if self
            .drag
            .dragged_node()
            .is_some_and(|id| self.tree.get_node(id).is_none())
        {
            self.drag.cancel();
        }
    }

    /// Commit pending changes: persist the snapshot, broadcast it, then
    /// align the host's flat list for the active view. Any staged
    /// pinned-row move is issued first; it never dirties the tree.
    pub fn commit<S, H>(&mut self, store: &mut S, host: &mut H) -> SyncReport
    where
        S: SnapshotStore,
        H: TabHost,
    {
        if let Some((tab, index)) = self.pending_pinned_move.take()
            && let Err(err) = host.move_to(tab, index)
        {
            warn!("Pinned reorder of {tab} failed: {err}");
        }
        if !self.dirty {
            return SyncReport::default();
        }
        self.dirty = false;
        self.commit_revision = self.commit_revision.saturating_add(1);
        let snapshot = self.tree.to_snapshot();
        if let Err(err) = store.save(&snapshot) {
            warn!("Persisting snapshot failed: {err}");
        }
        self.broadcast(snapshot);
        sync::sync_view_order(&self.tree, self.active_view, host)
    }

    fn broadcast(&mut self, snapshot: TreeSnapshot) {
        let update = TreeUpdate {
            revision: self.commit_revision,
            snapshot,
        };
        self.subscribers
            .retain(|tx| tx.send(update.clone()).is_ok());
    }

    fn drag_exclusion(&self, dragged: NodeId) -> HashSet<NodeId> {
        let members: Vec<NodeId> = if self.selection.contains(&dragged) {
            self.selection.ordered().to_vec()
        } else {
            vec![dragged]
        };
        let mut excluded = HashSet::new();
        for member in members {
            excluded.extend(self.tree.subtree_ids(member));
        }
        excluded
    }
}

impl Default for TabManagerApp {
    fn default() -> Self {
        Self::new()
    }
}

fn inclusive_index_range(
    anchor_index: usize,
    target_index: usize,
    len: usize,
) -> Option<RangeInclusive<usize>> {
    if len == 0 || anchor_index >= len || target_index >= len {
        return None;
    }
    let (start, end) = if anchor_index <= target_index {
        (anchor_index, target_index)
    } else {
        (target_index, anchor_index)
    };
    Some(start..=end)
}
