//! The path-tree core shared by areas and iterations.
//!
//! - [`path`]: the materialized path type and its storage/wire forms.
//! - [`resolver`]: ancestor ids to ancestor names (breadcrumbs).
//! - [`counts`]: work item totals rolled up over whole subtrees.
//! - [`lifecycle`]: iteration state transitions and their guards.
//! - [`cascade`]: subtree deletion with work item reassignment.

pub mod cascade;
pub mod counts;
pub mod lifecycle;
pub mod path;
pub mod resolver;

pub use cascade::{CascadeDeleter, CascadeReport};
pub use counts::CountAggregator;
pub use path::NodePath;
pub use resolver::{AncestorResolution, PathResolver, ResolvedPath};
