/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Flat-order synchronization.
//!
//! The tree is authoritative; the host's flat tab list is derived from it.
//! `plan_moves` computes the move sequence against a supplied order snapshot
//! and is pure. `sync_view_order` executes against a live host and requeries
//! the host's indices before every single move, because each applied move
//! shifts the position of every tab after it. Planning a whole batch against
//! one stale snapshot is how orders roll back.

use log::{debug, warn};

use crate::host::{TabHost, TabId};
use crate::tree::{Tree, ViewId};

/// One host move operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub tab: TabId,
    pub target_index: usize,
}

/// Outcome of one synchronization pass. Failures are counted, never
/// propagated; the tree state they would have realized is already committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub applied: usize,
    pub skipped: usize,
}

/// Host tabs in the order the flat list should show them for `view`.
///
/// Depth-first flattening of the view, minus pinned nodes (they occupy a
/// fixed prefix the host manages) and minus synthetic nodes with no host
/// item behind them.
pub fn ordered_refs(tree: &Tree, view: ViewId) -> Vec<TabId> {
    tree.flatten_view(view)
        .into_iter()
        .filter_map(|id| tree.get_node(id))
        .filter(|node| !node.pinned)
        .filter_map(|node| node.external_ref)
        .collect()
}

/// Compute the moves that would align `current` with the tree's order for
/// `view`, simulating each move's index shift on a working copy. Emits no
/// move for a tab already at its target index.
pub fn plan_moves(tree: &Tree, view: ViewId, current: &[TabId], pinned_count: usize) -> Vec<Move> {
    let ordered = ordered_refs(tree, view);
    let mut working: Vec<TabId> = current.to_vec();
    let mut moves = Vec::new();
    for (i, tab) in ordered.iter().enumerate() {
        let target_index = pinned_count + i;
        let Some(current_index) = working.iter().position(|t| t == tab) else {
            continue;
        };
        if current_index == target_index {
            continue;
        }
        working.remove(current_index);
        working.insert(target_index.min(working.len()), *tab);
        moves.push(Move {
            tab: *tab,
            target_index,
        });
    }
    moves
}

/// Align the host's flat list with the tree's order for `view`, one move at
/// a time. A failed move is logged and skipped; the rest of the pass
/// continues against freshly requeried positions.
pub fn sync_view_order<H: TabHost>(tree: &Tree, view: ViewId, host: &mut H) -> SyncReport {
    let ordered = ordered_refs(tree, view);
    let pinned_count = host.pinned().len();
    let mut report = SyncReport::default();
    for (i, tab) in ordered.iter().enumerate() {
        let target_index = pinned_count + i;
        // Queried fresh before every move, never cached across them.
        let Some(current_index) = host.index_of(*tab) else {
            warn!("Tab {tab} vanished during order sync, skipping");
            report.skipped += 1;
            continue;
        };
        if current_index == target_index {
            continue;
        }
        match host.move_to(*tab, target_index) {
            Ok(()) => report.applied += 1,
            Err(err) => {
                warn!("Moving {tab} to index {target_index} failed: {err}");
                report.skipped += 1;
            }
        }
    }
    debug!(
        "Order sync for {view}: {} applied, {} skipped",
        report.applied, report.skipped
    );
    report
}
