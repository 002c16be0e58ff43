/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Tab tree data structures.
//!
//! Core structures:
//! - `Tree`: forest of tab nodes partitioned into views, with an external-ref
//!   reverse index and explicit per-view root ordering
//! - `Node`: one tree-managed item (a live tab or a synthetic group header)
//! - `View`: named workspace partition
//!
//! The tree is the single source of truth for hierarchy and sibling order;
//! the host's flat tab list is derived from it, never the other way around.

use std::collections::{HashMap, HashSet};

use log::warn;
use uuid::Uuid;

use crate::host::TabId;
use crate::persistence::types::{PersistedNode, PersistedView, TreeSnapshot};

/// Stable node identity. Survives serialization, unlike the host's tab ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Stable view identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct ViewId(Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The built-in view every process derives without coordination.
    /// Orphaned roots are re-homed here.
    pub fn fallback() -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, b"tabtree.view.fallback"))
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "view:{}", self.0)
    }
}

/// A named workspace partition.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub id: ViewId,
    pub name: String,
}

/// One tree-managed item.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable node identity.
    pub id: NodeId,

    /// The host's identifier for the underlying tab. `None` for synthetic
    /// group headers. The tab's flat-list position is queried live, never
    /// stored here.
    pub external_ref: Option<TabId>,

    /// `None` means this node is a root of its view.
    pub parent_id: Option<NodeId>,

    /// Ordered children; authoritative display order among siblings.
    pub children: Vec<NodeId>,

    /// Owning view.
    pub view_id: ViewId,

    /// Cached distance from the root, recomputed after structural edits.
    pub depth: u32,

    /// Whether descendants are rendered. Collapsed subtrees still move as a
    /// unit; this only affects visibility.
    pub is_expanded: bool,

    /// Membership in a synthetic grouping node.
    pub group_id: Option<NodeId>,

    /// Display label.
    pub title: String,

    /// Mirror of the host's pinned flag. Pinned nodes are roots with no
    /// children and sit outside the view flattening.
    pub pinned: bool,
}

/// Forest of tab nodes partitioned into views.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// All nodes by stable id.
    nodes: HashMap<NodeId, Node>,

    /// Reverse index from host tab id to node, restricted to nodes whose
    /// external item currently exists.
    external_to_node: HashMap<TabId, NodeId>,

    /// Ordered workspace descriptors. The fallback view is always present.
    views: Vec<View>,

    /// Explicit root-level ordering per view. Root order is not recoverable
    /// from parent/child links alone.
    view_order: HashMap<ViewId, Vec<NodeId>>,
}

impl Tree {
    /// Create an empty tree with the built-in fallback view.
    pub fn new() -> Self {
        let fallback = ViewId::fallback();
        Self {
            nodes: HashMap::new(),
            external_to_node: HashMap::new(),
            views: vec![View {
                id: fallback,
                name: "Main".to_string(),
            }],
            view_order: HashMap::from([(fallback, Vec::new())]),
        }
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Node wrapping the given host tab, if any.
    pub fn node_for_tab(&self, tab: TabId) -> Option<NodeId> {
        self.external_to_node.get(&tab).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn has_view(&self, view: ViewId) -> bool {
        self.views.iter().any(|v| v.id == view)
    }

    /// Explicit root-level order for a view.
    pub fn root_order(&self, view: ViewId) -> &[NodeId] {
        self.view_order
            .get(&view)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get_node(id)?.parent_id
    }

    /// Index of a node among its siblings (parent's children, or the view's
    /// root order for roots).
    pub fn position_among_siblings(&self, id: NodeId) -> Option<usize> {
        let node = self.get_node(id)?;
        match node.parent_id {
            Some(parent) => self
                .get_node(parent)?
                .children
                .iter()
                .position(|c| *c == id),
            None => self
                .view_order
                .get(&node.view_id)?
                .iter()
                .position(|c| *c == id),
        }
    }

    /// Whether `id` is a strict descendant of `ancestor`.
    ///
    /// Parent-chain walk bounded by a visited set so corrupted data cannot
    /// loop it.
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.parent_of(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            if !visited.insert(p) {
                return false;
            }
            current = self.parent_of(p);
        }
        false
    }

    /// Preorder ids of the subtree rooted at `id`, including `id` itself.
    pub fn subtree_ids(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(node) = self.get_node(current) else {
                continue;
            };
            out.push(current);
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Depth-first order of a whole view: explicit root order on top,
    /// each node's own children order below. Includes collapsed subtrees
    /// and pinned roots; callers filter what they do not want.
    pub fn flatten_view(&self, view: ViewId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        for root in self.root_order(view).iter() {
            let mut stack = vec![*root];
            while let Some(current) = stack.pop() {
                if !visited.insert(current) {
                    continue;
                }
                let Some(node) = self.get_node(current) else {
                    continue;
                };
                out.push(current);
                for child in node.children.iter().rev() {
                    stack.push(*child);
                }
            }
        }
        out
    }

    // Single-write-path boundary: tree topology mutators are crate-internal.
    // Callers outside the reducer path are invariant violations.

    /// Add a node for a live host tab, appended as a root of `view`.
    pub(crate) fn add_tab_node(
        &mut self,
        tab: TabId,
        view: ViewId,
        title: String,
        pinned: bool,
    ) -> NodeId {
        let id = NodeId::new();
        self.register_node(Node {
            id,
            external_ref: Some(tab),
            parent_id: None,
            children: Vec::new(),
            view_id: view,
            depth: 0,
            is_expanded: true,
            group_id: None,
            title,
            pinned,
        });
        id
    }

    /// Add a synthetic group-header node, appended as a root of `view`.
    pub(crate) fn add_group_node(&mut self, view: ViewId, title: String) -> NodeId {
        let id = NodeId::new();
        self.register_node(Node {
            id,
            external_ref: None,
            parent_id: None,
            children: Vec::new(),
            view_id: view,
            depth: 0,
            is_expanded: true,
            group_id: None,
            title,
            pinned: false,
        });
        id
    }

    fn register_node(&mut self, mut node: Node) {
        if !self.has_view(node.view_id) {
            node.view_id = ViewId::fallback();
        }
        let id = node.id;
        let view = node.view_id;
        if let Some(tab) = node.external_ref
            && let Some(prev) = self.external_to_node.insert(tab, id)
        {
            warn!("Duplicate external ref {tab}; keeping the newest node");
            if let Some(prev_node) = self.nodes.get_mut(&prev) {
                prev_node.external_ref = None;
            }
        }
        self.nodes.insert(id, node);
        self.view_order.entry(view).or_default().push(id);
    }

    /// Reattach `child` under `parent` at `at` (clamped; `None` appends).
    /// Rejects self-parenting and any attachment that would create a cycle.
    /// The moved subtree takes the parent's view.
    pub(crate) fn attach_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        at: Option<usize>,
    ) -> bool {
        if parent == child || !self.nodes.contains_key(&child) {
            return false;
        }
        if self.is_descendant(parent, child) {
            return false;
        }
        let Some(view) = self.get_node(parent).map(|n| n.view_id) else {
            return false;
        };
        self.detach(child);
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let index = at
                .unwrap_or(parent_node.children.len())
                .min(parent_node.children.len());
            parent_node.children.insert(index, child);
        }
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent_id = Some(parent);
        }
        self.set_view_recursive(child, view);
        self.recompute_depths();
        true
    }

    /// Reattach `id` as a root of `view` at `at` (clamped; `None` appends).
    pub(crate) fn attach_root(&mut self, view: ViewId, id: NodeId, at: Option<usize>) -> bool {
        if !self.nodes.contains_key(&id) || !self.has_view(view) {
            return false;
        }
        self.detach(id);
        let order = self.view_order.entry(view).or_default();
        let index = at.unwrap_or(order.len()).min(order.len());
        order.insert(index, id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent_id = None;
        }
        self.set_view_recursive(id, view);
        self.recompute_depths();
        true
    }

    /// Unlink `id` from its parent's children or its view's root order.
    /// Leaves the node floating; callers reattach before returning.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some((parent, view)) = self.get_node(id).map(|n| (n.parent_id, n.view_id)) else {
            return;
        };
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    parent_node.children.retain(|c| *c != id);
                }
            }
            None => {
                if let Some(order) = self.view_order.get_mut(&view) {
                    order.retain(|c| *c != id);
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent_id = None;
        }
    }

    /// Remove a node. Its children are promoted in place into the removed
    /// node's slot, order preserved; they are never dropped with it.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(node) = self.get_node(id) else {
            return false;
        };
        let parent = node.parent_id;
        let view = node.view_id;
        let children = node.children.clone();
        let external = node.external_ref;

        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    if let Some(pos) = parent_node.children.iter().position(|c| *c == id) {
                        parent_node
                            .children
                            .splice(pos..=pos, children.iter().copied());
                    } else {
                        parent_node.children.extend(children.iter().copied());
                    }
                }
                for child in &children {
                    if let Some(child_node) = self.nodes.get_mut(child) {
                        child_node.parent_id = Some(p);
                    }
                }
            }
            None => {
                if let Some(order) = self.view_order.get_mut(&view) {
                    if let Some(pos) = order.iter().position(|c| *c == id) {
                        order.splice(pos..=pos, children.iter().copied());
                    } else {
                        order.extend(children.iter().copied());
                    }
                }
                for child in &children {
                    if let Some(child_node) = self.nodes.get_mut(child) {
                        child_node.parent_id = None;
                    }
                }
            }
        }

        let members: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.group_id == Some(id))
            .map(|n| n.id)
            .collect();
        for member in members {
            if let Some(n) = self.nodes.get_mut(&member) {
                n.group_id = None;
            }
        }

        if let Some(tab) = external
            && self.external_to_node.get(&tab) == Some(&id)
        {
            self.external_to_node.remove(&tab);
        }
        self.nodes.remove(&id);
        self.recompute_depths();
        true
    }

    /// Splice `id`'s children out from under it, directly after `id` among
    /// its siblings. `id` keeps its own slot.
    fn promote_children(&mut self, id: NodeId) {
        let Some(node) = self.get_node(id) else {
            return;
        };
        if node.children.is_empty() {
            return;
        }
        let parent = node.parent_id;
        let view = node.view_id;
        let children = self
            .nodes
            .get_mut(&id)
            .map(|n| std::mem::take(&mut n.children))
            .unwrap_or_default();
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(&p) {
                    let pos = parent_node
                        .children
                        .iter()
                        .position(|c| *c == id)
                        .map(|i| i + 1)
                        .unwrap_or(parent_node.children.len());
                    parent_node.children.splice(pos..pos, children.iter().copied());
                }
                for child in &children {
                    if let Some(child_node) = self.nodes.get_mut(child) {
                        child_node.parent_id = Some(p);
                    }
                }
            }
            None => {
                if let Some(order) = self.view_order.get_mut(&view) {
                    let pos = order
                        .iter()
                        .position(|c| *c == id)
                        .map(|i| i + 1)
                        .unwrap_or(order.len());
                    order.splice(pos..pos, children.iter().copied());
                }
                for child in &children {
                    if let Some(child_node) = self.nodes.get_mut(child) {
                        child_node.parent_id = None;
                    }
                }
            }
        }
    }

    /// Mirror a host pin-state change. Pinning forces the node to root level
    /// with no children (its children are promoted in place); unpinning only
    /// clears the flag, the node re-enters flattening where it stands.
    pub(crate) fn set_pinned(&mut self, id: NodeId, pinned: bool) -> bool {
        if !self.nodes.contains_key(&id) {
            return false;
        }
        if pinned {
            self.promote_children(id);
            let view = self
                .get_node(id)
                .map(|n| n.view_id)
                .unwrap_or_else(ViewId::fallback);
            if self.parent_of(id).is_some() {
                self.attach_root(view, id, None);
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.pinned = pinned;
        }
        self.recompute_depths();
        true
    }

    pub(crate) fn set_expanded(&mut self, id: NodeId, expanded: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.is_expanded = expanded;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_group(&mut self, id: NodeId, group: Option<NodeId>) -> bool {
        if let Some(g) = group
            && !self.nodes.contains_key(&g)
        {
            return false;
        }
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.group_id = group;
                true
            }
            None => false,
        }
    }

    pub(crate) fn add_view(&mut self, name: impl Into<String>) -> ViewId {
        let id = ViewId::new();
        self.views.push(View {
            id,
            name: name.into(),
        });
        self.view_order.insert(id, Vec::new());
        id
    }

    pub(crate) fn rename_view(&mut self, view: ViewId, name: impl Into<String>) -> bool {
        match self.views.iter_mut().find(|v| v.id == view) {
            Some(v) => {
                v.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Delete a view. Its roots are re-homed to the fallback view's root
    /// level, appended in their current order. The fallback view itself
    /// cannot be deleted.
    pub(crate) fn remove_view(&mut self, view: ViewId) -> bool {
        let fallback = ViewId::fallback();
        if view == fallback || !self.has_view(view) {
            return false;
        }
        let roots = self.view_order.remove(&view).unwrap_or_default();
        self.views.retain(|v| v.id != view);
        for root in roots {
            if let Some(order) = self.view_order.get_mut(&fallback) {
                order.push(root);
            }
            if let Some(node) = self.nodes.get_mut(&root) {
                node.parent_id = None;
            }
            self.set_view_recursive(root, fallback);
        }
        true
    }

    /// Rewrite the view id of a whole subtree.
    fn set_view_recursive(&mut self, id: NodeId, view: ViewId) {
        for member in self.subtree_ids(id) {
            if let Some(node) = self.nodes.get_mut(&member) {
                node.view_id = view;
            }
        }
    }

    /// Recompute every reachable node's cached depth, top-down from all
    /// roots. The visited set keeps an accidental cycle in corrupted data
    /// from looping; re-entered nodes contribute nothing.
    pub(crate) fn recompute_depths(&mut self) {
        let mut visited = HashSet::new();
        let mut stack: Vec<(NodeId, u32)> = Vec::new();
        for view in &self.views {
            if let Some(roots) = self.view_order.get(&view.id) {
                for root in roots.iter().rev() {
                    stack.push((*root, 0));
                }
            }
        }
        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let children = match self.nodes.get_mut(&id) {
                Some(node) => {
                    node.depth = depth;
                    node.children.clone()
                }
                None => continue,
            };
            for child in children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
    }

    /// Serialize the tree to a persistable snapshot. Nodes are emitted in
    /// view flatten order so reconstruction is deterministic.
    pub fn to_snapshot(&self) -> TreeSnapshot {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut emitted = HashSet::new();
        for view in &self.views {
            for id in self.flatten_view(view.id) {
                if emitted.insert(id)
                    && let Some(node) = self.get_node(id)
                {
                    nodes.push(persist_node(node));
                }
            }
        }
        // Nothing should escape the traversal; if something does, emit it in
        // stable id order rather than losing it.
        let mut leftovers: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| !emitted.contains(&n.id))
            .collect();
        leftovers.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        for node in leftovers {
            nodes.push(persist_node(node));
        }

        let views = self
            .views
            .iter()
            .map(|v| PersistedView {
                view_id: v.id.0.to_string(),
                name: v.name.clone(),
                root_order: self
                    .root_order(v.id)
                    .iter()
                    .map(|id| id.0.to_string())
                    .collect(),
            })
            .collect();

        let timestamp_secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        TreeSnapshot {
            nodes,
            views,
            timestamp_secs,
        }
    }

    /// Rebuild a tree from a persisted snapshot.
    ///
    /// Serialized `children` arrays are not authoritative: pass 1 accepts an
    /// entry only if the child's own `parent_id` points back at that parent,
    /// pass 2 sweeps for nodes whose parent is live but that no accepted
    /// children entry captured, and appends them. A single pass would
    /// silently drop orphaned-but-still-parented children on malformed
    /// snapshots. Unparseable entries are skipped, nodes with a missing
    /// parent become roots, and nodes unreachable from any root (parent
    /// cycles in corrupted data) are dropped.
    pub fn from_snapshot(snapshot: &TreeSnapshot) -> Self {
        let fallback = ViewId::fallback();
        let mut tree = Tree::new();

        let mut persisted_views: HashMap<ViewId, &PersistedView> = HashMap::new();
        for pview in &snapshot.views {
            let Ok(raw) = Uuid::parse_str(&pview.view_id) else {
                continue;
            };
            let view_id = ViewId(raw);
            persisted_views.entry(view_id).or_insert(pview);
            if let Some(existing) = tree.views.iter_mut().find(|v| v.id == view_id) {
                existing.name = pview.name.clone();
            } else {
                tree.views.push(View {
                    id: view_id,
                    name: pview.name.clone(),
                });
                tree.view_order.insert(view_id, Vec::new());
            }
        }

        // Materialize node records, unlinked. Serialized order is kept as the
        // deterministic tiebreaker for everything below.
        let mut records: Vec<NodeId> = Vec::new();
        let mut by_id: HashMap<NodeId, &PersistedNode> = HashMap::new();
        for pnode in &snapshot.nodes {
            let Ok(raw) = Uuid::parse_str(&pnode.node_id) else {
                continue;
            };
            let id = NodeId(raw);
            if by_id.contains_key(&id) {
                continue;
            }
            let view_id = Uuid::parse_str(&pnode.view_id)
                .ok()
                .map(ViewId)
                .filter(|v| tree.has_view(*v))
                .unwrap_or(fallback);
            let group_id = pnode
                .group_id
                .as_deref()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(NodeId);
            let external_ref = pnode.external_ref.map(TabId);
            if let Some(tab) = external_ref
                && let Some(prev) = tree.external_to_node.insert(tab, id)
            {
                warn!("Duplicate external ref {tab} in snapshot; keeping the newest node");
                if let Some(prev_node) = tree.nodes.get_mut(&prev) {
                    prev_node.external_ref = None;
                }
            }
            tree.nodes.insert(
                id,
                Node {
                    id,
                    external_ref,
                    parent_id: None,
                    children: Vec::new(),
                    view_id,
                    depth: 0,
                    is_expanded: pnode.is_expanded,
                    group_id,
                    title: pnode.title.clone(),
                    pinned: pnode.pinned,
                },
            );
            records.push(id);
            by_id.insert(id, pnode);
        }

        // Where each node wants to hang, honoring only live parents.
        let mut desired_parent: HashMap<NodeId, NodeId> = HashMap::new();
        for &id in &records {
            let Some(record) = by_id.get(&id) else {
                continue;
            };
            if let Some(parent_str) = &record.parent_id
                && let Ok(raw) = Uuid::parse_str(parent_str)
            {
                let parent = NodeId(raw);
                if parent != id && tree.nodes.contains_key(&parent) {
                    desired_parent.insert(id, parent);
                }
            }
        }

        // Pass 1: serialized children order, entries accepted only when the
        // child points back.
        let mut linked: HashSet<NodeId> = HashSet::new();
        for &id in &records {
            let Some(record) = by_id.get(&id) else {
                continue;
            };
            for child_str in &record.children {
                let Ok(raw) = Uuid::parse_str(child_str) else {
                    continue;
                };
                let child = NodeId(raw);
                if linked.contains(&child) || desired_parent.get(&child) != Some(&id) {
                    continue;
                }
                tree.link_child(id, child);
                linked.insert(child);
            }
        }

        // Pass 2: sweep for parented nodes the children arrays missed.
        for &id in &records {
            if linked.contains(&id) {
                continue;
            }
            if let Some(&parent) = desired_parent.get(&id) {
                tree.link_child(parent, id);
                linked.insert(id);
            }
        }

        // Drop whatever no root can reach (parent cycles).
        let roots: Vec<NodeId> = records
            .iter()
            .copied()
            .filter(|id| !linked.contains(id))
            .collect();
        let mut reachable = HashSet::new();
        let mut stack = roots.clone();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some(node) = tree.nodes.get(&id) {
                stack.extend(node.children.iter().copied());
            }
        }
        let dropped: Vec<NodeId> = records
            .iter()
            .copied()
            .filter(|id| !reachable.contains(id))
            .collect();
        if !dropped.is_empty() {
            warn!(
                "Dropping {} snapshot node(s) unreachable from any root",
                dropped.len()
            );
            for id in &dropped {
                if let Some(node) = tree.nodes.remove(id)
                    && let Some(tab) = node.external_ref
                    && tree.external_to_node.get(&tab) == Some(id)
                {
                    tree.external_to_node.remove(&tab);
                }
            }
        }

        // Group pointers at nodes that did not survive are cleared.
        let stale_groups: Vec<NodeId> = tree
            .nodes
            .values()
            .filter(|n| n.group_id.is_some_and(|g| !tree.nodes.contains_key(&g)))
            .map(|n| n.id)
            .collect();
        for id in stale_groups {
            if let Some(node) = tree.nodes.get_mut(&id) {
                node.group_id = None;
            }
        }

        // A node's view is its root's view.
        let live_roots: Vec<NodeId> = records
            .iter()
            .copied()
            .filter(|id| tree.nodes.get(id).is_some_and(|n| n.parent_id.is_none()))
            .collect();
        for &root in &live_roots {
            let view = tree
                .get_node(root)
                .map(|n| n.view_id)
                .unwrap_or(fallback);
            tree.set_view_recursive(root, view);
        }

        // Root order per view: persisted order entries that are still live
        // roots of that view, then any remaining roots in serialized order.
        let view_ids: Vec<ViewId> = tree.views.iter().map(|v| v.id).collect();
        for view in view_ids {
            let mut ordered = Vec::new();
            let mut seen = HashSet::new();
            if let Some(pview) = persisted_views.get(&view) {
                for root_str in &pview.root_order {
                    let Ok(raw) = Uuid::parse_str(root_str) else {
                        continue;
                    };
                    let root = NodeId(raw);
                    let is_live_root = tree
                        .nodes
                        .get(&root)
                        .is_some_and(|n| n.parent_id.is_none() && n.view_id == view);
                    if is_live_root && seen.insert(root) {
                        ordered.push(root);
                    }
                }
            }
            for &root in &live_roots {
                let belongs = tree
                    .nodes
                    .get(&root)
                    .is_some_and(|n| n.view_id == view);
                if belongs && seen.insert(root) {
                    ordered.push(root);
                }
            }
            tree.view_order.insert(view, ordered);
        }

        // Pinned nodes are childless roots; normalize anything a stale
        // snapshot claims otherwise.
        for &id in &records {
            if tree.get_node(id).is_some_and(|n| n.pinned) {
                tree.set_pinned(id, true);
            }
        }

        tree.recompute_depths();
        tree
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            parent_node.children.push(child);
        }
        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent_id = Some(parent);
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

fn persist_node(node: &Node) -> PersistedNode {
    PersistedNode {
        node_id: node.id.0.to_string(),
        external_ref: node.external_ref.map(|t| t.0),
        parent_id: node.parent_id.map(|p| p.0.to_string()),
        children: node.children.iter().map(|c| c.0.to_string()).collect(),
        view_id: node.view_id.0.to_string(),
        is_expanded: node.is_expanded,
        group_id: node.group_id.map(|g| g.0.to_string()),
        title: node.title.clone(),
        pinned: node.pinned,
    }
}
