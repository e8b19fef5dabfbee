use uuid::Uuid;

use super::{build_tree, enrich_one, enrich_space, Enriched};
use crate::db::{Database, SpaceRepository, TreeRepository};
use crate::error::Result;
use crate::models::{Area, AreaView, CreateAreaInput, Node, TreeEntry};
use crate::tree::AncestorResolution;

/// Operations on the area tree of a space. Areas are never deleted.
#[derive(Clone)]
pub struct AreaService {
    db: Database,
    resolution: AncestorResolution,
}

fn to_view(enriched: Enriched<Area>) -> AreaView {
    AreaView {
        area: enriched.record,
        parent_path: enriched.resolved.parent_path,
        resolved_parent_path: enriched.resolved.resolved_parent_path,
        counts: enriched.counts,
    }
}

impl AreaService {
    pub fn new(db: Database, resolution: AncestorResolution) -> Self {
        Self { db, resolution }
    }

    /// Create an area directly under `parent_id`.
    pub fn create_child(&self, parent_id: Uuid, input: CreateAreaInput) -> Result<Area> {
        self.db.transaction(|tx| {
            let repo = TreeRepository::<Area>::new(tx);
            let parent = repo.load(parent_id)?;
            repo.create(Area {
                node: Node::new(parent.node.space_id, input.name, parent.node.child_path()),
            })
        })
    }

    pub fn show(&self, id: Uuid) -> Result<AreaView> {
        self.db.transaction(|tx| {
            let area = TreeRepository::<Area>::new(tx).load(id)?;
            enrich_one(tx, self.resolution, area).map(to_view)
        })
    }

    pub fn list(&self, space_id: Uuid) -> Result<Vec<AreaView>> {
        self.db.transaction(|tx| {
            SpaceRepository::new(tx).load(space_id)?;
            let enriched = enrich_space::<Area>(tx, self.resolution, space_id)?;
            Ok(enriched.into_iter().map(to_view).collect())
        })
    }

    /// All descendants of an area, at any depth.
    pub fn children(&self, id: Uuid) -> Result<Vec<AreaView>> {
        self.db.transaction(|tx| {
            let repo = TreeRepository::<Area>::new(tx);
            repo.load(id)?;
            repo.load_children(id)?
                .into_iter()
                .map(|child| enrich_one(tx, self.resolution, child).map(to_view))
                .collect()
        })
    }

    pub fn tree(&self, space_id: Uuid) -> Result<Vec<TreeEntry<AreaView>>> {
        Ok(build_tree(self.list(space_id)?))
    }
}
