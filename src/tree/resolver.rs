use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::db::{TreeRecord, TreeRepository};
use crate::error::{Error, Result};
use crate::tree::path::{self, NodePath};

/// What to do with an ancestor id that no longer resolves to a node.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AncestorResolution {
    /// Skip the ancestor and log a warning.
    #[default]
    BestEffort,
    /// Fail with `NotFound`.
    Strict,
}

/// Both presentation forms of a node's parent path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPath {
    /// `/<id>/<id>`
    pub parent_path: String,
    /// `/<name>/<name>`
    pub resolved_parent_path: String,
}

/// Turns ancestor id paths into ancestor names.
pub struct PathResolver<'r, 'c, T> {
    repo: &'r TreeRepository<'c, T>,
    mode: AncestorResolution,
}

impl<'r, 'c, T: TreeRecord> PathResolver<'r, 'c, T> {
    pub fn new(repo: &'r TreeRepository<'c, T>, mode: AncestorResolution) -> Self {
        Self { repo, mode }
    }

    /// Names of the ancestors in `path`, root first.
    pub fn resolve_names(&self, path: &NodePath) -> Result<Vec<String>> {
        let ancestors = self.repo.load_multiple(path.ids())?;
        let names: HashMap<_, _> = ancestors
            .into_iter()
            .map(|a| (a.node().id, a.node().name.clone()))
            .collect();

        let mut resolved = Vec::with_capacity(path.len());
        for id in path.ids() {
            match names.get(id) {
                Some(name) => resolved.push(name.clone()),
                None if self.mode == AncestorResolution::Strict => {
                    return Err(Error::not_found(T::ENTITY, id));
                }
                None => {
                    tracing::warn!(
                        "Skipping unresolvable {} ancestor {} in path {}",
                        T::ENTITY,
                        id,
                        path
                    );
                }
            }
        }
        Ok(resolved)
    }

    pub fn resolve(&self, path: &NodePath) -> Result<ResolvedPath> {
        let names = self.resolve_names(path)?;
        Ok(ResolvedPath {
            parent_path: path::to_wire(path),
            resolved_parent_path: path::join_names(&names),
        })
    }
}
