//! Canopy: area and iteration trees for a work-item tracker.
//!
//! Areas and iterations organise the work items of a space into two
//! independent trees stored as materialized paths. See [`tree`] for the core
//! algorithms and [`service`] for the operations callers use.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod render;
pub mod service;
pub mod tree;

pub use error::{Error, Result};
