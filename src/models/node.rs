use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tree::path::NodePath;

/// The fields shared by every node of an area or iteration tree.
///
/// Nodes form a strict tree per space. The tree is stored as a materialized
/// path: `path` lists the ancestor ids from the root down to the direct
/// parent and never contains the node's own id. A node with an empty path
/// is a root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: Uuid,
    pub space_id: Uuid,
    pub name: String,
    pub path: NodePath,
    /// Bumped on every successful save. Callers echo it back to detect
    /// concurrent modification.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// A node that has not been persisted yet. The id is assigned on create.
    pub fn new(space_id: Uuid, name: impl Into<String>, path: NodePath) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            space_id,
            name: name.into(),
            path,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    /// Path a direct child of this node would have.
    pub fn child_path(&self) -> NodePath {
        self.path.child(self.id)
    }
}

/// Work item totals across a node's subtree.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkItemCounts {
    pub total: u64,
    pub closed: u64,
}

impl std::ops::AddAssign for WorkItemCounts {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.closed += other.closed;
    }
}

/// A node with its nested descendants, used for tree responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry<V> {
    #[serde(flatten)]
    pub view: V,
    pub children: Vec<TreeEntry<V>>,
}
