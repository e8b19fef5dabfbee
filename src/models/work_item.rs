use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// A tracked unit of work. It always sits in exactly one iteration and one
/// area of its space; those are its containers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkItem {
    pub id: Uuid,
    pub space_id: Uuid,
    pub title: String,
    pub state: WorkItemState,
    pub iteration_id: Uuid,
    pub area_id: Uuid,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The workflow state of a work item. Only `Closed` counts as closed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemState {
    #[default]
    New,
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl WorkItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl FromStr for WorkItemState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(Error::bad_parameter(format!(
                "Invalid work item state '{}'",
                other
            ))),
        }
    }
}

/// Input for creating a work item. Missing containers default to the
/// space's root iteration and root area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateWorkItemInput {
    pub title: String,
    pub state: Option<WorkItemState>,
    pub iteration_id: Option<Uuid>,
    pub area_id: Option<Uuid>,
}

/// Input for updating a work item. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWorkItemInput {
    pub title: Option<String>,
    pub state: Option<WorkItemState>,
    pub iteration_id: Option<Uuid>,
    pub area_id: Option<Uuid>,
}
