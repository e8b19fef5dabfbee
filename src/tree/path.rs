//! Materialized ancestor paths.
//!
//! A [`NodePath`] is the ordered list of ancestor ids of a node, root first,
//! never including the node itself. An empty path marks a root.
//!
//! Two textual forms exist:
//!
//! - **storage**: each UUID becomes a label (`-` replaced by `_`, the only
//!   characters allowed in hierarchical path labels are alphanumerics and
//!   `_`) and labels are joined with `.`. The root path is the empty string.
//! - **wire**: `/` followed by the ids joined with `/`. The root path is `/`.
//!
//! Subtree queries rely on the storage form: a node is a descendant of `X`
//! iff `X`'s label occurs as a whole label in its stored path.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Separator between labels in the storage form.
pub const LABEL_SEPARATOR: char = '.';
/// Replacement for `-` inside a UUID label.
pub const LABEL_UUID_SEPARATOR: char = '_';
/// Separator between ids in the wire form.
pub const WIRE_SEPARATOR: char = '/';

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<Uuid>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.0.contains(&id)
    }

    /// Direct parent, if any.
    pub fn parent(&self) -> Option<Uuid> {
        self.0.last().copied()
    }

    /// Path of a child of the node `parent_id` whose own path is `self`.
    pub fn child(&self, parent_id: Uuid) -> Self {
        let mut ids = Vec::with_capacity(self.0.len() + 1);
        ids.extend_from_slice(&self.0);
        ids.push(parent_id);
        Self(ids)
    }
}

impl From<Vec<Uuid>> for NodePath {
    fn from(ids: Vec<Uuid>) -> Self {
        Self(ids)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_wire(self))
    }
}

/// Convert a UUID into a storage label.
pub fn to_label(id: Uuid) -> String {
    id.hyphenated()
        .to_string()
        .replace('-', LABEL_UUID_SEPARATOR.to_string().as_str())
}

/// Convert a storage label back into a UUID.
pub fn from_label(label: &str) -> Result<Uuid> {
    let restored = label.replace(LABEL_UUID_SEPARATOR, "-");
    Uuid::parse_str(&restored)
        .map_err(|e| Error::bad_parameter(format!("Invalid path label '{}': {}", label, e)))
}

/// Storage form of a path.
pub fn encode(path: &NodePath) -> String {
    path.ids()
        .iter()
        .map(|id| to_label(*id))
        .collect::<Vec<_>>()
        .join(LABEL_SEPARATOR.to_string().as_str())
}

/// Inverse of [`encode`]. The wire root sentinel `/` also decodes to the
/// root path.
pub fn decode(stored: &str) -> Result<NodePath> {
    if stored.is_empty() || stored == WIRE_SEPARATOR.to_string() {
        return Ok(NodePath::root());
    }
    stored
        .split(LABEL_SEPARATOR)
        .map(from_label)
        .collect::<Result<Vec<_>>>()
        .map(NodePath)
}

/// Wire form of a path: `/id1/id2`, or `/` for the root path.
pub fn to_wire(path: &NodePath) -> String {
    let mut out = String::from(WIRE_SEPARATOR);
    let joined = path
        .ids()
        .iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(WIRE_SEPARATOR.to_string().as_str());
    out.push_str(&joined);
    out
}

/// Parse the wire form. Both `/` and the empty string denote the root path.
pub fn from_wire(wire: &str) -> Result<NodePath> {
    let trimmed = wire.trim_matches(WIRE_SEPARATOR);
    if trimmed.is_empty() {
        return Ok(NodePath::root());
    }
    trimmed
        .split(WIRE_SEPARATOR)
        .map(|segment| {
            Uuid::parse_str(segment).map_err(|e| {
                Error::bad_parameter(format!("Invalid path segment '{}': {}", segment, e))
            })
        })
        .collect::<Result<Vec<_>>>()
        .map(NodePath)
}

/// Render resolved ancestor names as `/name1/name2`, or `/` when empty.
pub fn join_names(names: &[String]) -> String {
    format!(
        "{}{}",
        WIRE_SEPARATOR,
        names.join(WIRE_SEPARATOR.to_string().as_str())
    )
}
