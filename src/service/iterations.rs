use chrono::Utc;
use uuid::Uuid;

use super::{build_tree, enrich_one, enrich_space, Enriched};
use crate::db::{Database, SpaceRepository, TreeRepository, WorkItemRepository};
use crate::error::Result;
use crate::models::{
    CreateIterationInput, Iteration, IterationState, IterationView, Node, TreeEntry,
    UpdateIterationInput,
};
use crate::tree::lifecycle::{apply_update, check_transition, starts};
use crate::tree::{AncestorResolution, CascadeDeleter, CascadeReport};

/// Operations on the iteration tree of a space.
#[derive(Clone)]
pub struct IterationService {
    db: Database,
    resolution: AncestorResolution,
}

fn to_view(enriched: Enriched<Iteration>) -> IterationView {
    let active = enriched.record.is_active_at(Utc::now());
    IterationView {
        iteration: enriched.record,
        parent_path: enriched.resolved.parent_path,
        resolved_parent_path: enriched.resolved.resolved_parent_path,
        counts: enriched.counts,
        active,
    }
}

impl IterationService {
    pub fn new(db: Database, resolution: AncestorResolution) -> Self {
        Self { db, resolution }
    }

    /// Create an iteration directly under `parent_id`.
    pub fn create_child(&self, parent_id: Uuid, input: CreateIterationInput) -> Result<Iteration> {
        self.db.transaction(|tx| {
            let repo = TreeRepository::<Iteration>::new(tx);
            let parent = repo.load(parent_id)?;

            repo.create(Iteration {
                node: Node::new(parent.node.space_id, input.name, parent.node.child_path()),
                description: input.description,
                start_at: input.start_at,
                end_at: input.end_at,
                state: IterationState::New,
                user_active: input.user_active.unwrap_or(false),
            })
        })
    }

    pub fn show(&self, id: Uuid) -> Result<IterationView> {
        self.db.transaction(|tx| {
            let iteration = TreeRepository::<Iteration>::new(tx).load(id)?;
            enrich_one(tx, self.resolution, iteration).map(to_view)
        })
    }

    /// Apply a partial update. Entering `start` is guarded; see
    /// [`crate::tree::lifecycle`]. An update that changes nothing is not
    /// written and keeps the version.
    pub fn update(&self, id: Uuid, input: UpdateIterationInput) -> Result<Iteration> {
        self.db.transaction(|tx| {
            let repo = TreeRepository::<Iteration>::new(tx);
            let current = repo.load(id)?;

            if let Some(target) = input.state {
                let started_elsewhere = if starts(&current, &input) {
                    repo.find_started(current.node.space_id, id)?
                } else {
                    None
                };
                if let Err(e) = check_transition(&current, target, started_elsewhere) {
                    tracing::warn!(
                        "Rejected transition of iteration {} from {} to {}: {}",
                        id,
                        current.state.as_str(),
                        target.as_str(),
                        e
                    );
                    return Err(e);
                }
            }

            let merged = apply_update(current.clone(), input)?;
            if merged == current {
                tracing::debug!("Update of iteration {} changes nothing", id);
                return Ok(current);
            }

            let updated = repo.save(merged)?;
            tracing::info!(
                "Updated iteration {} (state {}, version {})",
                id,
                updated.state.as_str(),
                updated.node.version
            );
            Ok(updated)
        })
    }

    /// Delete an iteration with its subtree. Work items of the subtree move
    /// to the space's root iteration.
    pub fn delete(&self, id: Uuid) -> Result<CascadeReport> {
        self.db.transaction(|tx| {
            let tree = TreeRepository::<Iteration>::new(tx);
            let spaces = SpaceRepository::new(tx);
            let items = WorkItemRepository::new(tx);
            CascadeDeleter::new(&tree, &spaces, &items).delete(id)
        })
    }

    /// Every iteration of a space with breadcrumbs and counts.
    pub fn list(&self, space_id: Uuid) -> Result<Vec<IterationView>> {
        self.db.transaction(|tx| {
            SpaceRepository::new(tx).load(space_id)?;
            let enriched = enrich_space::<Iteration>(tx, self.resolution, space_id)?;
            Ok(enriched.into_iter().map(to_view).collect())
        })
    }

    /// All descendants of an iteration, at any depth.
    pub fn children(&self, id: Uuid) -> Result<Vec<IterationView>> {
        self.db.transaction(|tx| {
            let repo = TreeRepository::<Iteration>::new(tx);
            repo.load(id)?;
            repo.load_children(id)?
                .into_iter()
                .map(|child| enrich_one(tx, self.resolution, child).map(to_view))
                .collect()
        })
    }

    /// The iteration tree of a space, nested.
    pub fn tree(&self, space_id: Uuid) -> Result<Vec<TreeEntry<IterationView>>> {
        Ok(build_tree(self.list(space_id)?))
    }
}
