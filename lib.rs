/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Hierarchical tab management engine.
//!
//! The tree is the source of truth; the host's flat tab strip is a
//! projection kept aligned by one-way order sync. [`app::TabManagerApp`]
//! coordinates the parts: [`tree`] owns structure, [`geometry`] classifies
//! pointer positions into drop targets, [`drag`] runs the gesture state
//! machine, [`reconcile`] turns resolved drops into new trees, [`sync`]
//! aligns the host strip, and [`persistence`] stores snapshots.

pub mod app;
pub mod drag;
pub mod geometry;
pub mod host;
pub mod persistence;
pub mod reconcile;
pub mod sync;
pub mod tree;

pub use app::{SelectMode, SelectionState, TabManagerApp, TreeIntent, TreeUpdate};
pub use drag::{Axis, DragConfig, DragEnd, DragSession, DragUpdate};
pub use geometry::{ClassifierConfig, DropTarget, GapNeighbor, ItemRect};
pub use host::{HostError, TabEvent, TabHost, TabId};
pub use persistence::types::TreeSnapshot;
pub use persistence::{JsonFileStore, MemoryStore, SnapshotStore, StoreError};
pub use tree::{Node, NodeId, Tree, View, ViewId};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
