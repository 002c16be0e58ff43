/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Drop application.
//!
//! Takes the classifier's verdict and a dragged node, produces the next tree.
//! Pure with respect to the tree argument: the input is never mutated, a
//! rejected drop returns `None` and leaves nothing half-applied. The host's
//! flat list is not touched here; order synchronization runs afterwards
//! against the committed tree.

use std::collections::{HashMap, HashSet};

use crate::geometry::DropTarget;
use crate::tree::{NodeId, Tree, ViewId};

/// Apply a resolved drop. Returns the next tree, or `None` when the drop is
/// structurally invalid (unknown or pinned nodes, or a placement that would
/// make a moved node its own ancestor) and must be treated as a no-op.
///
/// When `dragged` is part of `selection`, the whole selection moves as one
/// run, ordered by current flattened position so relative visual order
/// survives regardless of the order items were selected in.
pub fn apply_drop(
    tree: &Tree,
    dragged: NodeId,
    selection: &[NodeId],
    target: &DropTarget,
) -> Option<Tree> {
    let move_set = resolve_move_set(tree, dragged, selection);
    if move_set.is_empty() {
        return None;
    }

    match *target {
        DropTarget::Tab(onto) => {
            tree.get_node(onto)?;
            if parent_is_rejected(tree, onto, &move_set) {
                return None;
            }
            let mut next = tree.clone();
            for member in &move_set {
                if !next.attach_child(onto, *member, None) {
                    return None;
                }
            }
            // The drop is pointless if the moved rows stay hidden.
            next.set_expanded(onto, true);
            Some(next)
        }
        DropTarget::Gap { above, below, .. } => {
            let above = above.and_then(|n| live_anchor(tree, n.node, &move_set));
            let below = below.and_then(|n| live_anchor(tree, n.node, &move_set));
            match (below, above) {
                (Some(anchor), _) => insert_before(tree, &move_set, anchor),
                (None, Some(anchor)) => insert_after(tree, &move_set, anchor),
                (None, None) => append_to_root(tree, &move_set),
            }
        }
        // Pinned-row reordering and out-of-bounds drops carry no structural
        // intent for the tree.
        DropTarget::HorizontalGap { .. } | DropTarget::None => None,
    }
}

/// The selection if the dragged node belongs to it, otherwise the dragged
/// node alone. Deduplicated, restricted to live unpinned nodes, ordered by
/// flattened position across views. Pinned tabs reorder only inside the
/// host prefix and never structurally.
fn resolve_move_set(tree: &Tree, dragged: NodeId, selection: &[NodeId]) -> Vec<NodeId> {
    let mut members: Vec<NodeId> = if selection.contains(&dragged) {
        selection.to_vec()
    } else {
        vec![dragged]
    };
    let mut seen = HashSet::new();
    members.retain(|id| tree.get_node(*id).is_some_and(|node| !node.pinned) && seen.insert(*id));

    let position = flatten_positions(tree);
    members.sort_by_key(|id| position.get(id).copied().unwrap_or(usize::MAX));
    members
}

fn flatten_positions(tree: &Tree) -> HashMap<NodeId, usize> {
    let mut positions = HashMap::new();
    let mut next = 0usize;
    for view in tree.views() {
        for id in tree.flatten_view(view.id) {
            positions.insert(id, next);
            next += 1;
        }
    }
    positions
}

/// Whether attaching under `parent` would fold the tree into itself.
fn parent_is_rejected(tree: &Tree, parent: NodeId, move_set: &[NodeId]) -> bool {
    move_set.contains(&parent)
        || move_set
            .iter()
            .any(|member| tree.is_descendant(parent, *member))
}

/// A gap neighbor is only usable as an insertion anchor while it still
/// exists and is not itself being moved.
fn live_anchor(tree: &Tree, node: NodeId, move_set: &[NodeId]) -> Option<NodeId> {
    if move_set.contains(&node) {
        return None;
    }
    tree.get_node(node).map(|n| n.id)
}

/// Splice the move set directly before `anchor`, as its siblings.
///
/// The whole run is detached first so the anchor's index is not skewed by a
/// member still occupying a slot above it in the same sibling list.
fn insert_before(tree: &Tree, move_set: &[NodeId], anchor: NodeId) -> Option<Tree> {
    let parent = tree.parent_of(anchor);
    if let Some(p) = parent
        && parent_is_rejected(tree, p, move_set)
    {
        return None;
    }
    let mut next = tree.clone();
    for member in move_set {
        next.detach(*member);
    }
    for member in move_set {
        // Re-resolved per member: each attach shifts the anchor's index.
        let at = next.position_among_siblings(anchor);
        let attached = match parent {
            Some(p) => next.attach_child(p, *member, at),
            None => {
                let Some(view) = next.get_node(anchor).map(|n| n.view_id) else {
                    return None;
                };
                next.attach_root(view, *member, at)
            }
        };
        if !attached {
            return None;
        }
    }
    Some(next)
}

/// Splice the move set directly after `anchor`, as its siblings.
fn insert_after(tree: &Tree, move_set: &[NodeId], anchor: NodeId) -> Option<Tree> {
    let parent = tree.parent_of(anchor);
    if let Some(p) = parent
        && parent_is_rejected(tree, p, move_set)
    {
        return None;
    }
    let mut next = tree.clone();
    for member in move_set {
        next.detach(*member);
    }
    let mut previous = anchor;
    for member in move_set {
        let at = next.position_among_siblings(previous).map(|i| i + 1);
        let attached = match parent {
            Some(p) => next.attach_child(p, *member, at),
            None => {
                let Some(view) = next.get_node(anchor).map(|n| n.view_id) else {
                    return None;
                };
                next.attach_root(view, *member, at)
            }
        };
        if !attached {
            return None;
        }
        previous = *member;
    }
    Some(next)
}

/// Neither gap side resolved to a live anchor: append the move set to the
/// root level of the view it is being dragged in. Kept as the legacy
/// fallback; the classifier never produces such a gap itself, but
/// synthesized intents and stale snapshots can.
fn append_to_root(tree: &Tree, move_set: &[NodeId]) -> Option<Tree> {
    let view = move_set
        .first()
        .and_then(|id| tree.get_node(*id))
        .map(|n| n.view_id)
        .unwrap_or_else(ViewId::fallback);
    let mut next = tree.clone();
    for member in move_set {
        if !next.attach_root(view, *member, None) {
            return None;
        }
    }
    Some(next)
}
