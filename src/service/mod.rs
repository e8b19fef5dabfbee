//! Node-centric operations exposed to callers.
//!
//! Each operation opens one transaction, builds the repositories on top of
//! it, and returns plain models or enriched views. Authorization is the
//! caller's job.

mod areas;
mod iterations;

use std::collections::HashMap;

use rusqlite::Connection;
use uuid::Uuid;

pub use areas::AreaService;
pub use iterations::IterationService;

use crate::db::{TreeRecord, TreeRepository, WorkItemRepository};
use crate::error::Result;
use crate::models::{AreaView, IterationView, Node, TreeEntry, WorkItemCounts};
use crate::tree::{AncestorResolution, CountAggregator, PathResolver, ResolvedPath};

/// A record plus everything a view needs.
pub(crate) struct Enriched<T> {
    pub record: T,
    pub resolved: ResolvedPath,
    pub counts: WorkItemCounts,
}

/// Enrich a single record, counting its subtree directly.
pub(crate) fn enrich_one<T: TreeRecord>(
    conn: &Connection,
    mode: AncestorResolution,
    record: T,
) -> Result<Enriched<T>> {
    let tree = TreeRepository::<T>::new(conn);
    let items = WorkItemRepository::new(conn);
    let resolved = PathResolver::new(&tree, mode).resolve(&record.node().path)?;
    let counts = CountAggregator::new(&tree, &items).counts(record.node().id)?;
    Ok(Enriched {
        record,
        resolved,
        counts,
    })
}

/// Enrich every record of a space in one counting pass.
pub(crate) fn enrich_space<T: TreeRecord>(
    conn: &Connection,
    mode: AncestorResolution,
    space_id: Uuid,
) -> Result<Vec<Enriched<T>>> {
    let tree = TreeRepository::<T>::new(conn);
    let items = WorkItemRepository::new(conn);
    let records = tree.list(space_id)?;

    let nodes: Vec<&Node> = records.iter().map(T::node).collect();
    let counts = CountAggregator::new(&tree, &items).counts_for(space_id, &nodes)?;

    let resolver = PathResolver::new(&tree, mode);
    records
        .into_iter()
        .map(|record| {
            let resolved = resolver.resolve(&record.node().path)?;
            let counts = counts
                .get(&record.node().id)
                .copied()
                .unwrap_or_default();
            Ok(Enriched {
                record,
                resolved,
                counts,
            })
        })
        .collect()
}

/// Access to the node behind a view, for tree building.
pub trait NodeView {
    fn node(&self) -> &Node;
}

impl NodeView for IterationView {
    fn node(&self) -> &Node {
        &self.iteration.node
    }
}

impl NodeView for AreaView {
    fn node(&self) -> &Node {
        &self.area.node
    }
}

/// Nest flat views under their parents. Views whose parent is not among
/// `views` become top-level entries.
pub fn build_tree<V: NodeView>(views: Vec<V>) -> Vec<TreeEntry<V>> {
    let present: std::collections::HashSet<Uuid> = views.iter().map(|v| v.node().id).collect();

    let mut children_map: HashMap<Option<Uuid>, Vec<V>> = HashMap::new();
    for view in views {
        let parent = view.node().path.parent().filter(|p| present.contains(p));
        children_map.entry(parent).or_default().push(view);
    }

    fn build_subtree<V: NodeView>(
        parent_id: Option<Uuid>,
        children_map: &mut HashMap<Option<Uuid>, Vec<V>>,
    ) -> Vec<TreeEntry<V>> {
        let Some(mut views) = children_map.remove(&parent_id) else {
            return Vec::new();
        };
        views.sort_by(|a, b| a.node().name.cmp(&b.node().name));
        views
            .into_iter()
            .map(|view| {
                let id = view.node().id;
                TreeEntry {
                    view,
                    children: build_subtree(Some(id), children_map),
                }
            })
            .collect()
    }

    build_subtree(None, &mut children_map)
}
