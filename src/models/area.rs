use serde::{Deserialize, Serialize};

use super::node::{Node, WorkItemCounts};

/// A functional area of a space ("Backend", "Backend/Storage", ...).
///
/// Areas carry no fields beyond the common [`Node`] ones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Area {
    #[serde(flatten)]
    pub node: Node,
}

/// Input for creating a child area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAreaInput {
    pub name: String,
}

/// An area enriched for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaView {
    #[serde(flatten)]
    pub area: Area,
    /// Ancestor ids in wire form, e.g. `/<root-id>/<parent-id>`.
    pub parent_path: String,
    /// Ancestor names in wire form, e.g. `/My Space/Backend`.
    pub resolved_parent_path: String,
    pub counts: WorkItemCounts,
}
