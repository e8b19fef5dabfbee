//! Work item counts rolled up over subtrees.
//!
//! Counts are always derived at read time from the work item rows; nothing
//! is denormalized onto the nodes, so there is no counter to drift.

use std::collections::HashMap;

use uuid::Uuid;

use crate::db::{TreeRecord, TreeRepository, WorkItemRepository};
use crate::error::Result;
use crate::models::{Node, WorkItemCounts};

pub struct CountAggregator<'r, 'c, T> {
    tree: &'r TreeRepository<'c, T>,
    items: &'r WorkItemRepository<'c>,
}

impl<'r, 'c, T: TreeRecord> CountAggregator<'r, 'c, T> {
    pub fn new(tree: &'r TreeRepository<'c, T>, items: &'r WorkItemRepository<'c>) -> Self {
        Self { tree, items }
    }

    /// Total and closed items in the subtree rooted at `node_id`.
    pub fn counts(&self, node_id: Uuid) -> Result<WorkItemCounts> {
        let mut subtree: Vec<Uuid> = self
            .tree
            .load_children(node_id)?
            .iter()
            .map(|child| child.node().id)
            .collect();
        subtree.push(node_id);
        self.items.counts_for_container::<T>(&subtree)
    }

    /// Subtree counts for every node of a space.
    pub fn batch_counts(&self, space_id: Uuid) -> Result<HashMap<Uuid, WorkItemCounts>> {
        let nodes = self.tree.list(space_id)?;
        let nodes: Vec<&Node> = nodes.iter().map(T::node).collect();
        self.counts_for(space_id, &nodes)
    }

    /// Subtree counts for the given nodes, which must all belong to
    /// `space_id` and include every descendant of each of them.
    pub fn counts_for(
        &self,
        space_id: Uuid,
        nodes: &[&Node],
    ) -> Result<HashMap<Uuid, WorkItemCounts>> {
        let direct = self.items.counts_by_container::<T>(space_id)?;
        Ok(roll_up(nodes, &direct))
    }
}

/// Sum direct counts over each node's subtree. A node's subtree is the node
/// itself plus every node whose path contains its id.
pub fn roll_up(
    nodes: &[&Node],
    direct: &HashMap<Uuid, WorkItemCounts>,
) -> HashMap<Uuid, WorkItemCounts> {
    nodes
        .iter()
        .map(|node| {
            let mut counts = direct.get(&node.id).copied().unwrap_or_default();
            for descendant in nodes.iter().filter(|n| n.path.contains(node.id)) {
                if let Some(c) = direct.get(&descendant.id) {
                    counts += *c;
                }
            }
            (node.id, counts)
        })
        .collect()
}
