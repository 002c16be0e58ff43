/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Pointer-to-drop-target classification.
//!
//! Pure geometry: callers pass the pointer position and the visible row
//! rectangles, freshly measured for every pointer move. Nothing here reads
//! the tree or caches layout.
//!
//! Each row is split into three horizontal bands. The top and bottom edge
//! bands map to insertion between rows, the center band maps to nesting onto
//! the row. Rows belonging to the dragged subtree are excluded before any
//! band math, so the pointer can sit inside the hole the drag opened without
//! ever targeting the dragged items themselves.

use std::collections::HashSet;

use euclid::default::{Point2D, Rect};

use crate::tree::NodeId;

/// One visible row, as measured by the UI this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemRect {
    pub node: NodeId,
    pub rect: Rect<f32>,
    /// Tree depth of the row, carried so gap targets can report the depths
    /// flanking the insertion point.
    pub depth: u32,
}

/// A row adjacent to a gap insertion point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapNeighbor {
    pub node: NodeId,
    pub depth: u32,
}

impl GapNeighbor {
    fn of(item: &ItemRect) -> Self {
        Self {
            node: item.node,
            depth: item.depth,
        }
    }
}

/// Where a drop at the current pointer position would land.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropTarget {
    /// Onto a row: the dragged items become its children.
    Tab(NodeId),
    /// Between rows: insertion before effective item `index`. Neighbors are
    /// the rows flanking the gap after subtree exclusion.
    Gap {
        index: usize,
        above: Option<GapNeighbor>,
        below: Option<GapNeighbor>,
    },
    /// Between pinned items in the horizontal row.
    HorizontalGap { insert_index: usize },
    /// Outside the droppable area.
    None,
}

/// Band tuning.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierConfig {
    /// Fraction of a row's height given to each edge band. The center band
    /// gets the rest, boundaries included.
    pub threshold_ratio: f32,
    /// Droppable area. A pointer outside it classifies as `None`.
    pub bounds: Option<Rect<f32>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.25,
            bounds: None,
        }
    }
}

/// Classify a pointer position against a vertical list of rows.
///
/// `excluded` is the dragged subtree; those rows are invisible to the
/// classifier. A pointer above the first effective row is the gap before it,
/// at or past the bottom of the last effective row the gap after it, and a
/// pointer inside a hole opened by exclusion is the gap before the next
/// effective row.
pub fn classify(
    pointer: Point2D<f32>,
    items: &[ItemRect],
    excluded: &HashSet<NodeId>,
    config: &ClassifierConfig,
) -> DropTarget {
    if let Some(bounds) = config.bounds
        && !bounds.contains(pointer)
    {
        return DropTarget::None;
    }

    let effective: Vec<&ItemRect> = items
        .iter()
        .filter(|item| !excluded.contains(&item.node))
        .collect();

    let Some(first) = effective.first() else {
        return DropTarget::None;
    };
    if pointer.y < first.rect.min_y() {
        return DropTarget::Gap {
            index: 0,
            above: None,
            below: Some(GapNeighbor::of(first)),
        };
    }
    if let Some(last) = effective.last()
        && pointer.y >= last.rect.max_y()
    {
        return DropTarget::Gap {
            index: effective.len(),
            above: Some(GapNeighbor::of(last)),
            below: None,
        };
    }

    for (i, item) in effective.iter().enumerate() {
        // A hole left by the excluded subtree reads as the gap before the
        // next row below it.
        if pointer.y < item.rect.min_y() {
            return DropTarget::Gap {
                index: i,
                above: i
                    .checked_sub(1)
                    .and_then(|j| effective.get(j))
                    .map(|above| GapNeighbor::of(above)),
                below: Some(GapNeighbor::of(item)),
            };
        }
        if pointer.y < item.rect.max_y() {
            let height = item.rect.height();
            let threshold = config.threshold_ratio * height;
            let local = pointer.y - item.rect.min_y();
            if local < threshold {
                return DropTarget::Gap {
                    index: i,
                    above: i
                        .checked_sub(1)
                        .and_then(|j| effective.get(j))
                        .map(|above| GapNeighbor::of(above)),
                    below: Some(GapNeighbor::of(item)),
                };
            }
            if local >= height - threshold {
                return DropTarget::Gap {
                    index: i + 1,
                    above: Some(GapNeighbor::of(item)),
                    below: effective.get(i + 1).map(|below| GapNeighbor::of(below)),
                };
            }
            return DropTarget::Tab(item.node);
        }
    }

    DropTarget::Gap {
        index: effective.len(),
        above: effective.last().map(|last| GapNeighbor::of(last)),
        below: None,
    }
}

/// Classify a pointer position against the horizontal pinned row.
///
/// Pinned items only reorder, so the whole row is gap territory: the
/// insertion index is decided by which item midpoints the pointer has
/// passed. An empty effective row yields `None`.
pub fn classify_row(
    pointer: Point2D<f32>,
    items: &[ItemRect],
    excluded: &HashSet<NodeId>,
    config: &ClassifierConfig,
) -> DropTarget {
    if let Some(bounds) = config.bounds
        && !bounds.contains(pointer)
    {
        return DropTarget::None;
    }

    let effective: Vec<&ItemRect> = items
        .iter()
        .filter(|item| !excluded.contains(&item.node))
        .collect();
    if effective.is_empty() {
        return DropTarget::None;
    }

    let mut insert_index = effective.len();
    for (i, item) in effective.iter().enumerate() {
        let midpoint = item.rect.min_x() + item.rect.width() / 2.0;
        if pointer.x < midpoint {
            insert_index = i;
            break;
        }
    }
    DropTarget::HorizontalGap { insert_index }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::default::Size2D;
    use proptest::prelude::*;
    use rstest::rstest;

    fn row(node: NodeId, y: f32, height: f32, depth: u32) -> ItemRect {
        ItemRect {
            node,
            rect: Rect::new(Point2D::new(0.0, y), Size2D::new(200.0, height)),
            depth,
        }
    }

    fn three_rows() -> Vec<ItemRect> {
        vec![
            row(NodeId::new(), 0.0, 40.0, 0),
            row(NodeId::new(), 40.0, 40.0, 0),
            row(NodeId::new(), 80.0, 40.0, 1),
        ]
    }

    /// Renders a target as "tab <row>" / "gap <index>" for table cases.
    fn summarize(target: DropTarget, items: &[ItemRect]) -> String {
        match target {
            DropTarget::Tab(node) => {
                let index = items
                    .iter()
                    .position(|item| item.node == node)
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| "?".to_string());
                format!("tab {index}")
            }
            DropTarget::Gap { index, .. } => format!("gap {index}"),
            DropTarget::HorizontalGap { insert_index } => format!("hgap {insert_index}"),
            DropTarget::None => "none".to_string(),
        }
    }

    #[rstest]
    #[case(-5.0, "gap 0")]
    #[case(9.0, "gap 0")]
    #[case(10.0, "tab 0")]
    #[case(29.0, "tab 0")]
    #[case(30.0, "gap 1")]
    #[case(41.0, "gap 1")]
    #[case(60.0, "tab 1")]
    #[case(111.0, "gap 3")]
    #[case(119.0, "gap 3")]
    #[case(120.0, "gap 3")]
    #[case(500.0, "gap 3")]
    fn bands_split_each_row_into_edges_and_center(#[case] y: f32, #[case] expected: &str) {
        let items = three_rows();
        let target = classify(
            Point2D::new(50.0, y),
            &items,
            &HashSet::new(),
            &ClassifierConfig::default(),
        );
        assert_eq!(summarize(target, &items), expected);
    }

    #[test]
    fn center_band_boundaries_are_inclusive() {
        let items = three_rows();
        let config = ClassifierConfig::default();
        // Row 0 spans 0..40 with a 10px threshold: 10 and 29.999 both nest.
        let at_lower = classify(Point2D::new(0.0, 10.0), &items, &HashSet::new(), &config);
        let below_upper = classify(Point2D::new(0.0, 29.9), &items, &HashSet::new(), &config);
        assert_eq!(at_lower, DropTarget::Tab(items[0].node));
        assert_eq!(below_upper, DropTarget::Tab(items[0].node));
    }

    #[test]
    fn excluded_subtree_rows_are_invisible() {
        // Dragging A (with child A1) over its own former slot: the rows at
        // 30..60 and 60..90 belong to the dragged subtree, so the pointer at
        // 115 lands in B's bottom band with C below.
        let p = NodeId::new();
        let a = NodeId::new();
        let a1 = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        let items = vec![
            row(p, 0.0, 30.0, 0),
            row(a, 30.0, 30.0, 0),
            row(a1, 60.0, 30.0, 1),
            row(b, 90.0, 30.0, 0),
            row(c, 120.0, 30.0, 0),
        ];
        let excluded: HashSet<NodeId> = [a, a1].into_iter().collect();
        let target = classify(
            Point2D::new(10.0, 115.0),
            &items,
            &excluded,
            &ClassifierConfig::default(),
        );
        match target {
            DropTarget::Gap {
                index,
                above,
                below,
            } => {
                assert_eq!(index, 2);
                assert_eq!(above.map(|n| n.node), Some(b));
                assert_eq!(below.map(|n| n.node), Some(c));
            }
            other => panic!("expected a gap, got {other:?}"),
        }
    }

    #[test]
    fn hole_between_effective_rows_is_the_gap_before_the_next() {
        let a = NodeId::new();
        let b = NodeId::new();
        let c = NodeId::new();
        let items = vec![
            row(a, 0.0, 30.0, 0),
            row(b, 30.0, 30.0, 0),
            row(c, 60.0, 30.0, 0),
        ];
        let excluded: HashSet<NodeId> = [b].into_iter().collect();
        let target = classify(
            Point2D::new(10.0, 45.0),
            &items,
            &excluded,
            &ClassifierConfig::default(),
        );
        match target {
            DropTarget::Gap {
                index,
                above,
                below,
            } => {
                assert_eq!(index, 1);
                assert_eq!(above.map(|n| n.node), Some(a));
                assert_eq!(below.map(|n| n.node), Some(c));
            }
            other => panic!("expected a gap, got {other:?}"),
        }
    }

    #[test]
    fn empty_effective_list_classifies_as_none() {
        let a = NodeId::new();
        let items = vec![row(a, 0.0, 30.0, 0)];
        let excluded: HashSet<NodeId> = [a].into_iter().collect();
        let target = classify(
            Point2D::new(10.0, 15.0),
            &items,
            &excluded,
            &ClassifierConfig::default(),
        );
        assert_eq!(target, DropTarget::None);
        assert_eq!(
            classify(
                Point2D::new(10.0, 15.0),
                &[],
                &HashSet::new(),
                &ClassifierConfig::default(),
            ),
            DropTarget::None
        );
    }

    #[test]
    fn pointer_outside_bounds_classifies_as_none() {
        let items = three_rows();
        let config = ClassifierConfig {
            bounds: Some(Rect::new(Point2D::new(0.0, 0.0), Size2D::new(200.0, 300.0))),
            ..ClassifierConfig::default()
        };
        let inside = classify(Point2D::new(50.0, 60.0), &items, &HashSet::new(), &config);
        let outside = classify(Point2D::new(250.0, 60.0), &items, &HashSet::new(), &config);
        assert_eq!(inside, DropTarget::Tab(items[1].node));
        assert_eq!(outside, DropTarget::None);
    }

    #[rstest]
    #[case(15.0, 0)]
    #[case(25.0, 1)]
    #[case(55.0, 1)]
    #[case(70.0, 2)]
    fn pinned_row_inserts_by_midpoint(#[case] x: f32, #[case] expected: usize) {
        let items = vec![
            ItemRect {
                node: NodeId::new(),
                rect: Rect::new(Point2D::new(0.0, 0.0), Size2D::new(40.0, 30.0)),
                depth: 0,
            },
            ItemRect {
                node: NodeId::new(),
                rect: Rect::new(Point2D::new(40.0, 0.0), Size2D::new(40.0, 30.0)),
                depth: 0,
            },
        ];
        let target = classify_row(
            Point2D::new(x, 10.0),
            &items,
            &HashSet::new(),
            &ClassifierConfig::default(),
        );
        assert_eq!(target, DropTarget::HorizontalGap { insert_index: expected });
    }

    #[test]
    fn empty_pinned_row_classifies_as_none() {
        let pointer = Point2D::new(50.0, 10.0);
        assert_eq!(
            classify_row(pointer, &[], &HashSet::new(), &ClassifierConfig::default()),
            DropTarget::None
        );

        // A row whose only item is the dragged one is empty too.
        let a = NodeId::new();
        let items = vec![ItemRect {
            node: a,
            rect: Rect::new(Point2D::new(0.0, 0.0), Size2D::new(40.0, 30.0)),
            depth: 0,
        }];
        let excluded: HashSet<NodeId> = [a].into_iter().collect();
        assert_eq!(
            classify_row(pointer, &items, &excluded, &ClassifierConfig::default()),
            DropTarget::None
        );
    }

    proptest! {
        /// Every pointer position maps to a target, and gap neighbors always
        /// agree with the gap index.
        #[test]
        fn gap_neighbors_agree_with_gap_index(
            heights in proptest::collection::vec(10.0f32..60.0, 0..8),
            y in -100.0f32..600.0,
        ) {
            let mut items = Vec::new();
            let mut top = 0.0;
            for height in &heights {
                items.push(row(NodeId::new(), top, *height, 0));
                top += height;
            }
            let target = classify(
                Point2D::new(10.0, y),
                &items,
                &HashSet::new(),
                &ClassifierConfig::default(),
            );
            match target {
                DropTarget::Tab(node) => {
                    prop_assert!(items.iter().any(|item| item.node == node));
                }
                DropTarget::Gap { index, above, below } => {
                    prop_assert!(index <= items.len());
                    let expected_above =
                        index.checked_sub(1).and_then(|j| items.get(j)).map(|i| i.node);
                    let expected_below = items.get(index).map(|i| i.node);
                    prop_assert_eq!(above.map(|n| n.node), expected_above);
                    prop_assert_eq!(below.map(|n| n.node), expected_below);
                }
                DropTarget::None => prop_assert!(items.is_empty()),
                other => prop_assert!(false, "unexpected target {:?}", other),
            }
        }

        /// Every pixel inside the occupied span is a tab or a gap, and the
        /// pixels mapping to any one gap index form a single unbroken run.
        #[test]
        fn gap_pixel_runs_are_contiguous(
            heights in proptest::collection::vec(10.0f32..60.0, 1..8),
        ) {
            let mut items = Vec::new();
            let mut top = 0.0;
            for height in &heights {
                items.push(row(NodeId::new(), top, *height, 0));
                top += height;
            }
            let mut closed_runs: HashSet<usize> = HashSet::new();
            let mut current: Option<usize> = None;
            for y in 0..top as i32 {
                let target = classify(
                    Point2D::new(10.0, y as f32),
                    &items,
                    &HashSet::new(),
                    &ClassifierConfig::default(),
                );
                match target {
                    DropTarget::Tab(_) => {
                        if let Some(finished) = current.take() {
                            closed_runs.insert(finished);
                        }
                    }
                    DropTarget::Gap { index, .. } => {
                        if current != Some(index) {
                            if let Some(finished) = current.take() {
                                closed_runs.insert(finished);
                            }
                            prop_assert!(
                                !closed_runs.contains(&index),
                                "gap {} split into two runs",
                                index
                            );
                            current = Some(index);
                        }
                    }
                    other => prop_assert!(false, "pixel {} classified as {:?}", y, other),
                }
            }
        }
    }
}
