/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Host tab system seam.
//!
//! The engine never talks to a real browser directly; it consumes this trait
//! surface. The host supplies the flat ordered tab list and the primitive
//! move operation, and emits lifecycle events the coordinator absorbs into
//! the tree before the engine is re-invoked.

/// The host system's own identifier for a tab.
///
/// Distinct from `tree::NodeId` (stable tree identity): a tab id is minted by
/// the host and dies with the tab, while a node id survives serialization.
/// The tab's position in the host list is never stored, only queried live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct TabId(pub u32);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tab:{}", self.0)
    }
}

/// Flat-list view of the host tab system.
///
/// Position queries must reflect the live list at call time. Every move
/// issued through `move_to` shifts the indices of all tabs after the source
/// and target positions, so callers requery between moves rather than
/// caching an order.
pub trait TabHost {
    /// Current flat order of all tabs, pinned prefix included.
    fn order(&self) -> Vec<TabId>;

    /// Live index of a tab in the flat order, if the tab still exists.
    fn index_of(&self, tab: TabId) -> Option<usize>;

    /// Tabs currently pinned. Hosts keep these as a fixed list prefix.
    fn pinned(&self) -> Vec<TabId>;

    /// Move a tab to the given flat index.
    fn move_to(&mut self, tab: TabId, index: usize) -> Result<(), HostError>;
}

/// Lifecycle events emitted by the host, absorbed by the coordinator.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TabEvent {
    Created {
        tab: TabId,
        opener: Option<TabId>,
        index: usize,
        pinned: bool,
        title: String,
    },
    Removed {
        tab: TabId,
    },
    Moved {
        tab: TabId,
        to_index: usize,
    },
    Activated {
        tab: TabId,
    },
    PinnedChanged {
        tab: TabId,
        pinned: bool,
    },
}

/// Errors from host primitives.
#[derive(Debug)]
pub enum HostError {
    /// The tab no longer exists in the host list.
    MissingTab(String),
    /// The host refused the operation (busy, detached window, etc.).
    Rejected(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::MissingTab(e) => write!(f, "Missing tab: {e}"),
            HostError::Rejected(e) => write!(f, "Host rejected move: {e}"),
        }
    }
}
