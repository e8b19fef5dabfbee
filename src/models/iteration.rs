use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::node::{Node, WorkItemCounts};
use crate::error::Error;

/// A time box of a space ("Sprint 12").
///
/// Iterations nest like areas and additionally carry a lifecycle state.
/// At most one iteration per space may be started at a time, and the root
/// iteration of a space can never be started.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Iteration {
    #[serde(flatten)]
    pub node: Node,
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub state: IterationState,
    /// Lets a user mark an iteration as the current focus regardless of state.
    pub user_active: bool,
}

impl Iteration {
    /// Whether the iteration is currently active: either flagged by a user
    /// or `now` falls inside its `[start_at, end_at]` window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if self.user_active {
            return true;
        }
        match (self.start_at, self.end_at) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }
}

/// The lifecycle state of an iteration.
///
/// - `New`: planned, not yet running
/// - `Start`: running; only one per space
/// - `Close`: finished; may be restarted
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IterationState {
    #[default]
    New,
    Start,
    Close,
}

impl IterationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Start => "start",
            Self::Close => "close",
        }
    }
}

impl FromStr for IterationState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "start" => Ok(Self::Start),
            "close" => Ok(Self::Close),
            other => Err(Error::bad_parameter(format!(
                "Invalid iteration state '{}' (expected new, start or close)",
                other
            ))),
        }
    }
}

/// Input for creating a child iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIterationInput {
    pub name: String,
    pub description: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_active: Option<bool>,
}

/// Accepts either `T` or `null` for a present field; a missing field falls
/// back to `#[serde(default)]`.
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Input for updating an iteration. All fields are optional for partial updates.
///
/// Nullable fields use a double option: `None` keeps the current value,
/// `Some(None)` clears it and `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIterationInput {
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub start_at: Option<Option<DateTime<Utc>>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub end_at: Option<Option<DateTime<Utc>>>,
    pub state: Option<IterationState>,
    pub user_active: Option<bool>,
    /// Version the caller last saw. A mismatch fails with `Conflict`.
    pub version: Option<i64>,
}

/// An iteration enriched for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationView {
    #[serde(flatten)]
    pub iteration: Iteration,
    /// Ancestor ids in wire form, e.g. `/<root-id>/<parent-id>`.
    pub parent_path: String,
    /// Ancestor names in wire form, e.g. `/My Space/Release 1`.
    pub resolved_parent_path: String,
    pub counts: WorkItemCounts,
    pub active: bool,
}
