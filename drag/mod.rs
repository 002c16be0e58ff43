/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Pointer-driven drag session.
//!
//! State machine: Idle, then Potential on pointer-down, then Dragging once
//! movement crosses the activation threshold in the primary axis, then back
//! to Idle through a drop, a click, or a cancel. The session owns no tree
//! state and never caches row geometry; callers feed it freshly measured
//! rectangles on every pointer move and it re-runs the classifier against
//! them.
//!
//! Cancellation can arrive from outside the pointer stream (escape key, or
//! another surface concluding the same gesture); it discards the session
//! with no structural side effects.

use std::collections::HashSet;

use euclid::default::{Point2D, Rect, Vector2D};
use log::debug;

use crate::geometry::{self, ClassifierConfig, DropTarget, ItemRect};
use crate::host::TabId;
use crate::tree::NodeId;

/// Which pointer-movement component counts toward activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Session tuning.
#[derive(Debug, Clone, Copy)]
pub struct DragConfig {
    /// Minimum primary-axis movement before a press becomes a drag.
    pub activation_threshold_px: f32,
    pub primary_axis: Axis,
    /// Leaving this area marks the session as an external drop; re-entering
    /// clears the mark.
    pub outer_boundary: Option<Rect<f32>>,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            activation_threshold_px: 8.0,
            primary_axis: Axis::Vertical,
            outer_boundary: None,
        }
    }
}

/// Observer notifications emitted by pointer moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    /// Fired exactly once per session, on the move that crosses the
    /// activation threshold.
    Started { node: NodeId },
    TargetChanged { target: DropTarget },
    BoundaryCrossed { outside: bool },
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEnd {
    /// Pointer released before the threshold was reached.
    Click { node: NodeId },
    /// Pointer released mid-drag. `target` is the last classification;
    /// `external` is set when the pointer was outside the outer boundary,
    /// in which case the target is not a structural intent.
    Drop {
        node: NodeId,
        target: DropTarget,
        external: bool,
    },
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
struct PendingDrag {
    node: NodeId,
    tab: Option<TabId>,
    start: Point2D<f32>,
    grab_offset: Vector2D<f32>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    node: NodeId,
    tab: Option<TabId>,
    grab_offset: Vector2D<f32>,
    last_pointer: Point2D<f32>,
    last_target: DropTarget,
    outside: bool,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Potential(PendingDrag),
    Dragging(ActiveDrag),
}

#[derive(Debug)]
pub struct DragSession {
    config: DragConfig,
    phase: Phase,
}

impl DragSession {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging(_))
    }

    /// Node captured by the current session, pending or active.
    pub fn dragged_node(&self) -> Option<NodeId> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Potential(pending) => Some(pending.node),
            Phase::Dragging(active) => Some(active.node),
        }
    }

    pub fn dragged_tab(&self) -> Option<TabId> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Potential(pending) => pending.tab,
            Phase::Dragging(active) => active.tab,
        }
    }

    /// Last classified target, while actively dragging.
    pub fn current_target(&self) -> Option<DropTarget> {
        match &self.phase {
            Phase::Dragging(active) => Some(active.last_target),
            _ => None,
        }
    }

    /// Pointer-to-item offset recorded at pointer-down, for ghost placement.
    pub fn grab_offset(&self) -> Option<Vector2D<f32>> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Potential(pending) => Some(pending.grab_offset),
            Phase::Dragging(active) => Some(active.grab_offset),
        }
    }

    pub fn is_outside_boundary(&self) -> bool {
        matches!(self.phase, Phase::Dragging(active) if active.outside)
    }

    /// Begin a potential drag over an item. A press while another session is
    /// live tears the old one down first.
    pub fn pointer_down(
        &mut self,
        node: NodeId,
        tab: Option<TabId>,
        pointer: Point2D<f32>,
        item_origin: Point2D<f32>,
    ) {
        self.phase = Phase::Potential(PendingDrag {
            node,
            tab,
            start: pointer,
            grab_offset: pointer - item_origin,
        });
    }

    /// Feed a pointer move. `items` are this frame's measured rows and
    /// `excluded` is the dragged subtree.
    pub fn pointer_move(
        &mut self,
        pointer: Point2D<f32>,
        items: &[ItemRect],
        excluded: &HashSet<NodeId>,
        classifier: &ClassifierConfig,
    ) -> Vec<DragUpdate> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => Vec::new(),
            Phase::Potential(pending) => {
                let delta = pointer - pending.start;
                let travelled = match self.config.primary_axis {
                    Axis::Horizontal => delta.x.abs(),
                    Axis::Vertical => delta.y.abs(),
                };
                if travelled < self.config.activation_threshold_px {
                    self.phase = Phase::Potential(pending);
                    return Vec::new();
                }
                debug!("Drag session started for {}", pending.node);
                let target = geometry::classify(pointer, items, excluded, classifier);
                let outside = self.is_outside(pointer);
                self.phase = Phase::Dragging(ActiveDrag {
                    node: pending.node,
                    tab: pending.tab,
                    grab_offset: pending.grab_offset,
                    last_pointer: pointer,
                    last_target: target,
                    outside,
                });
                let mut updates = vec![
                    DragUpdate::Started { node: pending.node },
                    DragUpdate::TargetChanged { target },
                ];
                if outside {
                    updates.push(DragUpdate::BoundaryCrossed { outside: true });
                }
                updates
            }
            Phase::Dragging(mut active) => {
                let mut updates = Vec::new();
                active.last_pointer = pointer;
                let outside = self.is_outside(pointer);
                if outside != active.outside {
                    active.outside = outside;
                    updates.push(DragUpdate::BoundaryCrossed { outside });
                }
                let target = geometry::classify(pointer, items, excluded, classifier);
                if target != active.last_target {
                    active.last_target = target;
                    updates.push(DragUpdate::TargetChanged { target });
                }
                self.phase = Phase::Dragging(active);
                updates
            }
        }
    }

    /// Release the pointer. Before the threshold this is a click; mid-drag
    /// it resolves to a drop carrying the last known classification.
    pub fn pointer_up(&mut self) -> Option<DragEnd> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => None,
            Phase::Potential(pending) => Some(DragEnd::Click { node: pending.node }),
            Phase::Dragging(active) => Some(DragEnd::Drop {
                node: active.node,
                target: active.last_target,
                external: active.outside,
            }),
        }
    }

    /// Discard the session from any state, with no structural side effects.
    pub fn cancel(&mut self) -> Option<DragEnd> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => None,
            Phase::Potential(_) | Phase::Dragging(_) => {
                debug!("Drag session cancelled");
                Some(DragEnd::Cancelled)
            }
        }
    }

    /// Return to idle from any state without reporting an end event. For
    /// surface teardown, where nothing is left to observe a cancellation.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    fn is_outside(&self, pointer: Point2D<f32>) -> bool {
        self.config
            .outer_boundary
            .is_some_and(|boundary| !boundary.contains(pointer))
    }
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new(DragConfig::default())
    }
}
