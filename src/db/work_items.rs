use std::collections::HashMap;
use std::str::FromStr;

use chrono::Utc;
use rusqlite::{Connection, Row, ToSql};
use uuid::Uuid;

use super::tree::{TreeRecord, TreeRepository};
use super::{parse_datetime, parse_uuid, placeholders};
use crate::error::{Error, Result};
use crate::models::{
    Area, CreateWorkItemInput, Iteration, UpdateWorkItemInput, WorkItem, WorkItemCounts,
    WorkItemState,
};

const COLUMNS: &str =
    "id, space_id, title, state, iteration_id, area_id, version, created_at, updated_at";

pub struct WorkItemRepository<'c> {
    conn: &'c Connection,
}

fn map_work_item(row: &Row<'_>) -> rusqlite::Result<WorkItem> {
    let state: String = row.get(3)?;
    Ok(WorkItem {
        id: parse_uuid(0, row.get(0)?)?,
        space_id: parse_uuid(1, row.get(1)?)?,
        title: row.get(2)?,
        state: WorkItemState::from_str(&state).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        iteration_id: parse_uuid(4, row.get(4)?)?,
        area_id: parse_uuid(5, row.get(5)?)?,
        version: row.get(6)?,
        created_at: parse_datetime(7, row.get(7)?)?,
        updated_at: parse_datetime(8, row.get(8)?)?,
    })
}

impl<'c> WorkItemRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Create a work item. Containers that are not given default to the
    /// space's roots; containers that are given must belong to the space.
    pub fn create(&self, space_id: Uuid, input: CreateWorkItemInput) -> Result<WorkItem> {
        if input.title.trim().is_empty() {
            return Err(Error::bad_parameter("Work item title must not be empty"));
        }

        let iteration_id = self.container_in_space::<Iteration>(space_id, input.iteration_id)?;
        let area_id = self.container_in_space::<Area>(space_id, input.area_id)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let state = input.state.unwrap_or_default();

        self.conn.execute(
            &format!("INSERT INTO work_items ({}) VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)", COLUMNS),
            (
                id.to_string(),
                space_id.to_string(),
                &input.title,
                state.as_str(),
                iteration_id.to_string(),
                area_id.to_string(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(WorkItem {
            id,
            space_id,
            title: input.title,
            state,
            iteration_id,
            area_id,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn container_in_space<T: TreeRecord>(&self, space_id: Uuid, id: Option<Uuid>) -> Result<Uuid> {
        let repo = TreeRepository::<T>::new(self.conn);
        let container = match id {
            Some(id) => repo.load(id)?,
            None => repo.root(space_id)?,
        };
        let node = container.node();
        if node.space_id != space_id {
            return Err(Error::bad_parameter(format!(
                "{} {} does not belong to space {}",
                T::ENTITY,
                node.id,
                space_id
            )));
        }
        Ok(node.id)
    }

    pub fn load(&self, id: Uuid) -> Result<WorkItem> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM work_items WHERE id = ?", COLUMNS))?;
        let item = stmt
            .query_map([id.to_string()], map_work_item)?
            .next()
            .transpose()?;
        item.ok_or_else(|| Error::not_found("Work item", id))
    }

    /// Every work item whose container of kind `T` is one of `node_ids`.
    pub fn load_by_container<T: TreeRecord>(&self, node_ids: &[Uuid]) -> Result<Vec<WorkItem>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = node_ids.iter().map(Uuid::to_string).collect();
        let params: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();
        let sql = format!(
            "SELECT {} FROM work_items WHERE {} IN ({}) ORDER BY created_at",
            COLUMNS,
            T::CONTAINER_COLUMN,
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params.as_slice(), map_work_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Total and closed counts of the items directly inside `node_ids`.
    pub fn counts_for_container<T: TreeRecord>(&self, node_ids: &[Uuid]) -> Result<WorkItemCounts> {
        if node_ids.is_empty() {
            return Ok(WorkItemCounts::default());
        }
        let ids: Vec<String> = node_ids.iter().map(Uuid::to_string).collect();
        let closed_state = WorkItemState::Closed.as_str();
        let mut params: Vec<&dyn ToSql> = vec![&closed_state];
        params.extend(ids.iter().map(|id| id as &dyn ToSql));
        let sql = format!(
            "SELECT COUNT(*), COALESCE(SUM(state = ?), 0) FROM work_items WHERE {} IN ({})",
            T::CONTAINER_COLUMN,
            placeholders(ids.len())
        );
        let (total, closed): (i64, i64) = self
            .conn
            .query_row(&sql, params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(WorkItemCounts {
            total: total as u64,
            closed: closed as u64,
        })
    }

    /// Direct counts for every container of kind `T` in a space that holds
    /// at least one item.
    pub fn counts_by_container<T: TreeRecord>(
        &self,
        space_id: Uuid,
    ) -> Result<HashMap<Uuid, WorkItemCounts>> {
        let sql = format!(
            "SELECT {col}, COUNT(*), COALESCE(SUM(state = ?), 0)
             FROM work_items WHERE space_id = ? GROUP BY {col}",
            col = T::CONTAINER_COLUMN
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                (WorkItemState::Closed.as_str(), space_id.to_string()),
                |row| {
                    let total: i64 = row.get(1)?;
                    let closed: i64 = row.get(2)?;
                    Ok((
                        parse_uuid(0, row.get(0)?)?,
                        WorkItemCounts {
                            total: total as u64,
                            closed: closed as u64,
                        },
                    ))
                },
            )?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(rows)
    }

    /// Apply a partial update. New containers must belong to the item's space.
    pub fn update(&self, id: Uuid, input: UpdateWorkItemInput) -> Result<WorkItem> {
        let mut item = self.load(id)?;
        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(Error::bad_parameter("Work item title must not be empty"));
            }
            item.title = title;
        }
        if let Some(state) = input.state {
            item.state = state;
        }
        if input.iteration_id.is_some() {
            item.iteration_id =
                self.container_in_space::<Iteration>(item.space_id, input.iteration_id)?;
        }
        if input.area_id.is_some() {
            item.area_id = self.container_in_space::<Area>(item.space_id, input.area_id)?;
        }
        self.save(item)
    }

    /// Persist a work item's mutable fields with an optimistic version check.
    pub fn save(&self, mut item: WorkItem) -> Result<WorkItem> {
        let now = Utc::now();
        let rows = self.conn.execute(
            "UPDATE work_items
             SET title = ?, state = ?, iteration_id = ?, area_id = ?, updated_at = ?, version = version + 1
             WHERE id = ? AND version = ?",
            (
                &item.title,
                item.state.as_str(),
                item.iteration_id.to_string(),
                item.area_id.to_string(),
                now.to_rfc3339(),
                item.id.to_string(),
                item.version,
            ),
        )?;

        if rows == 0 {
            let current = self.load(item.id)?;
            return Err(Error::conflict(format!(
                "Work item {} was modified concurrently (expected version {}, found {})",
                item.id, item.version, current.version
            )));
        }

        item.version += 1;
        item.updated_at = now;
        Ok(item)
    }
}
