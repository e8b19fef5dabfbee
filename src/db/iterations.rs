use std::str::FromStr;

use rusqlite::{Row, ToSql};
use uuid::Uuid;

use super::tree::{TreeRecord, TreeRepository};
use super::{parse_optional_datetime, parse_uuid};
use crate::error::Result;
use crate::models::{Iteration, IterationState, Node, WorkItem};

impl TreeRecord for Iteration {
    const ENTITY: &'static str = "Iteration";
    const TABLE: &'static str = "iterations";
    const CONTAINER_COLUMN: &'static str = "iteration_id";
    const EXTRA_COLUMNS: &'static [&'static str] =
        &["description", "start_at", "end_at", "state", "user_active"];

    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    fn extra_values(&self) -> Vec<Box<dyn ToSql>> {
        vec![
            Box::new(self.description.clone()),
            Box::new(self.start_at.map(|t| t.to_rfc3339())),
            Box::new(self.end_at.map(|t| t.to_rfc3339())),
            Box::new(self.state.as_str()),
            Box::new(self.user_active),
        ]
    }

    fn from_row(node: Node, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        let state: String = row.get(offset + 3)?;
        Ok(Iteration {
            node,
            description: row.get(offset)?,
            start_at: parse_optional_datetime(offset + 1, row.get(offset + 1)?)?,
            end_at: parse_optional_datetime(offset + 2, row.get(offset + 2)?)?,
            state: IterationState::from_str(&state).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    offset + 3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            user_active: row.get(offset + 4)?,
        })
    }

    fn set_container(item: &mut WorkItem, id: Uuid) {
        item.iteration_id = id;
    }
}

impl TreeRepository<'_, Iteration> {
    /// The started iteration of a space other than `except`, if any.
    pub fn find_started(&self, space_id: Uuid, except: Uuid) -> Result<Option<Uuid>> {
        let mut stmt = self.conn().prepare(
            "SELECT id FROM iterations WHERE space_id = ? AND state = 'start' AND id != ? LIMIT 1",
        )?;
        let mut rows = stmt.query([space_id.to_string(), except.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_uuid(0, row.get(0)?)?)),
            None => Ok(None),
        }
    }
}
