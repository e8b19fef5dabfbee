use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{SpaceRepository, TreeRecord, TreeRepository, WorkItemRepository};
use crate::error::{Error, Result};

/// Outcome of a cascading delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// The deleted node followed by all of its descendants.
    pub removed: Vec<Uuid>,
    /// Number of work items moved to `reassigned_to`.
    pub reassigned: usize,
    /// The space root that received the orphaned work items.
    pub reassigned_to: Uuid,
}

/// Deletes a node with its whole subtree and moves the work items of the
/// subtree to the space's root node of the same kind.
///
/// Every step uses the connection the repositories were built on; run it
/// inside one transaction so a failure leaves nothing half-done.
pub struct CascadeDeleter<'r, 'c, T> {
    tree: &'r TreeRepository<'c, T>,
    spaces: &'r SpaceRepository<'c>,
    items: &'r WorkItemRepository<'c>,
}

impl<'r, 'c, T: TreeRecord> CascadeDeleter<'r, 'c, T> {
    pub fn new(
        tree: &'r TreeRepository<'c, T>,
        spaces: &'r SpaceRepository<'c>,
        items: &'r WorkItemRepository<'c>,
    ) -> Self {
        Self { tree, spaces, items }
    }

    pub fn delete(&self, node_id: Uuid) -> Result<CascadeReport> {
        let target = self.tree.load(node_id)?;
        let node = target.node();
        if node.is_root() {
            return Err(Error::forbidden(format!(
                "{} {} is the root of its space and cannot be deleted",
                T::ENTITY,
                node_id
            )));
        }

        let mut removed = vec![node_id];
        removed.extend(
            self.tree
                .load_children(node_id)?
                .iter()
                .map(|child| child.node().id),
        );

        let root: T = self.spaces.root(node.space_id)?;
        let root_id = root.node().id;

        // Items move before their containers disappear so the work item
        // foreign keys never dangle inside the transaction.
        let orphans = self.items.load_by_container::<T>(&removed)?;
        let reassigned = orphans.len();
        for mut item in orphans {
            T::set_container(&mut item, root_id);
            self.items.save(item)?;
        }

        let deleted = self.tree.delete_many(&removed)?;
        if deleted != removed.len() {
            return Err(Error::conflict(format!(
                "Expected to delete {} {} nodes under {}, deleted {}",
                removed.len(),
                T::ENTITY,
                node_id,
                deleted
            )));
        }

        tracing::info!(
            "Deleted {} {} with {} descendants, moved {} work items to {}",
            T::ENTITY,
            node_id,
            removed.len() - 1,
            reassigned,
            root_id
        );

        Ok(CascadeReport {
            removed,
            reassigned,
            reassigned_to: root_id,
        })
    }
}
