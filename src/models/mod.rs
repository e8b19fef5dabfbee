//! Domain models for Canopy.
//!
//! # Core Concepts
//!
//! - [`Space`]: a project. Owns one area tree and one iteration tree.
//! - [`Node`]: the common part of every tree node (id, name, ancestor path,
//!   version). Roots are the nodes with an empty path.
//! - [`Area`]: a functional slice of a space.
//! - [`Iteration`]: a time box with a lifecycle (`new`, `start`, `close`).
//! - [`WorkItem`]: the leaf entity counted by the trees. It references one
//!   area and one iteration, its containers.
//!
//! Views ([`AreaView`], [`IterationView`]) add the breadcrumb strings and the
//! subtree work item counts computed at read time.

mod area;
mod iteration;
mod node;
mod space;
mod work_item;

pub use area::*;
pub use iteration::*;
pub use node::*;
pub use space::*;
pub use work_item::*;
