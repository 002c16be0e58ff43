/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Serializable types for tree persistence.
//!
//! Ids are persisted as strings and parsed leniently on load. Fields added
//! after the first shipped snapshot format carry `#[serde(default)]` so
//! older snapshots keep deserializing.

fn default_expanded() -> bool {
    true
}

/// Persisted node.
///
/// `children` is stored by value and is NOT authoritative: reconstruction
/// rebuilds adjacency from `parent_id` back-references, using the serialized
/// order only as a hint (see `Tree::from_snapshot`).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PersistedNode {
    /// Stable node identity.
    pub node_id: String,
    /// Host tab id, if the node wraps a live tab. Group headers have none.
    #[serde(default)]
    pub external_ref: Option<u32>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    /// Owning view; empty string resolves to the fallback view on load.
    #[serde(default)]
    pub view_id: String,
    #[serde(default = "default_expanded")]
    pub is_expanded: bool,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub pinned: bool,
}

/// Persisted workspace descriptor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PersistedView {
    pub view_id: String,
    pub name: String,
    /// Explicit root-level ordering for this view.
    #[serde(default)]
    pub root_order: Vec<String>,
}

/// Full tree snapshot for periodic saves.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TreeSnapshot {
    #[serde(default)]
    pub nodes: Vec<PersistedNode>,
    #[serde(default)]
    pub views: Vec<PersistedView>,
    #[serde(default)]
    pub timestamp_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_persisted_node_roundtrip() {
        let node = PersistedNode {
            node_id: Uuid::new_v4().to_string(),
            external_ref: Some(12),
            parent_id: Some(Uuid::new_v4().to_string()),
            children: vec![Uuid::new_v4().to_string()],
            view_id: Uuid::new_v4().to_string(),
            is_expanded: false,
            group_id: None,
            title: "Example".to_string(),
            pinned: true,
        };

        let json = serde_json::to_string(&node).unwrap();
        let back: PersistedNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_persisted_node_deserializes_minimal_legacy_shape() {
        // Early snapshots carried only identity and parentage.
        let json = r#"{"node_id":"7f3ad26f-22c0-4bb0-9966-0f3b1f1f2a10","external_ref":3}"#;
        let node: PersistedNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.external_ref, Some(3));
        assert_eq!(node.parent_id, None);
        assert!(node.children.is_empty());
        assert_eq!(node.view_id, "");
        assert!(node.is_expanded);
        assert!(!node.pinned);
    }

    #[test]
    fn test_persisted_view_roundtrip() {
        let view = PersistedView {
            view_id: Uuid::new_v4().to_string(),
            name: "Research".to_string(),
            root_order: vec![Uuid::new_v4().to_string(), Uuid::new_v4().to_string()],
        };

        let json = serde_json::to_string(&view).unwrap();
        let back: PersistedView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, view);
    }

    #[test]
    fn test_tree_snapshot_roundtrip() {
        let snapshot = TreeSnapshot {
            nodes: vec![PersistedNode {
                node_id: Uuid::new_v4().to_string(),
                external_ref: Some(1),
                parent_id: None,
                children: vec![],
                view_id: String::new(),
                is_expanded: true,
                group_id: None,
                title: "A".to_string(),
                pinned: false,
            }],
            views: vec![],
            timestamp_secs: 1234567890,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: TreeSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes.len(), 1);
        assert_eq!(back.timestamp_secs, 1234567890);
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_tree_snapshot_deserializes_empty_object() {
        let snapshot: TreeSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.nodes.is_empty());
        assert!(snapshot.views.is_empty());
        assert_eq!(snapshot.timestamp_secs, 0);
    }
}
