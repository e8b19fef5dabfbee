//! Generic storage for materialized-path trees.
//!
//! Areas and iterations share one table layout (`id, space_id, name, path,
//! version, created_at, updated_at`, followed by kind-specific columns), so a
//! single repository serves both. Subtree queries never recurse: a node's
//! descendants are exactly the rows whose stored path contains the node's
//! label.

use std::marker::PhantomData;

use chrono::Utc;
use rusqlite::{Connection, Row, ToSql};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, placeholders};
use crate::error::{on_unique_violation, Error, Result};
use crate::models::{Node, WorkItem};
use crate::tree::path::{self, LABEL_SEPARATOR};

const NODE_COLUMNS: &[&str] = &[
    "id",
    "space_id",
    "name",
    "path",
    "version",
    "created_at",
    "updated_at",
];

/// A row type stored in a tree table.
pub trait TreeRecord: Sized {
    /// Human-readable entity name used in error messages.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    /// Column of `work_items` that references this kind of node.
    const CONTAINER_COLUMN: &'static str;
    /// Columns stored after the common node columns, in `extra_values` order.
    const EXTRA_COLUMNS: &'static [&'static str];

    fn node(&self) -> &Node;
    fn node_mut(&mut self) -> &mut Node;
    fn extra_values(&self) -> Vec<Box<dyn ToSql>>;
    /// Build the record from the common node and the row's extra columns,
    /// which start at index `offset`.
    fn from_row(node: Node, row: &Row<'_>, offset: usize) -> rusqlite::Result<Self>;

    /// Point the work item at a container of this kind.
    fn set_container(item: &mut WorkItem, id: Uuid);
}

pub struct TreeRepository<'c, T> {
    conn: &'c Connection,
    _record: PhantomData<T>,
}

impl<'c, T: TreeRecord> TreeRepository<'c, T> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    pub(crate) fn conn(&self) -> &'c Connection {
        self.conn
    }

    fn columns() -> String {
        NODE_COLUMNS
            .iter()
            .chain(T::EXTRA_COLUMNS.iter())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn select(filter: &str) -> String {
        format!("SELECT {} FROM {} WHERE {}", Self::columns(), T::TABLE, filter)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<T> {
        let stored_path: String = row.get(3)?;
        let node_path = path::decode(&stored_path).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
        let node = Node {
            id: parse_uuid(0, row.get(0)?)?,
            space_id: parse_uuid(1, row.get(1)?)?,
            name: row.get(2)?,
            path: node_path,
            version: row.get(4)?,
            created_at: parse_datetime(5, row.get(5)?)?,
            updated_at: parse_datetime(6, row.get(6)?)?,
        };
        T::from_row(node, row, NODE_COLUMNS.len())
    }

    fn query(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map(params, Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Persist a new node with the path supplied by the caller.
    ///
    /// Every ancestor in the path must exist in the node's own space.
    /// A nil id is replaced by a fresh one; the version starts at 0.
    pub fn create(&self, mut record: T) -> Result<T> {
        let node = record.node_mut();
        if node.name.trim().is_empty() {
            return Err(Error::bad_parameter(format!(
                "{} name must not be empty",
                T::ENTITY
            )));
        }
        if node.id.is_nil() {
            node.id = Uuid::new_v4();
        }
        if node.path.contains(node.id) {
            return Err(Error::bad_parameter(format!(
                "{} {} cannot be its own ancestor",
                T::ENTITY,
                node.id
            )));
        }

        self.check_ancestors(node)?;

        let space_exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM spaces WHERE id = ?)",
            [node.space_id.to_string()],
            |row| row.get(0),
        )?;
        if !space_exists {
            return Err(Error::bad_parameter(format!(
                "Space {} does not exist",
                node.space_id
            )));
        }

        let now = Utc::now();
        node.version = 0;
        node.created_at = now;
        node.updated_at = now;

        let node = record.node();
        let mut params: Vec<Box<dyn ToSql>> = vec![
            Box::new(node.id.to_string()),
            Box::new(node.space_id.to_string()),
            Box::new(node.name.clone()),
            Box::new(path::encode(&node.path)),
            Box::new(node.version),
            Box::new(node.created_at.to_rfc3339()),
            Box::new(node.updated_at.to_rfc3339()),
        ];
        params.extend(record.extra_values());

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            Self::columns(),
            placeholders(params.len())
        );
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        self.conn
            .execute(&sql, params_ref.as_slice())
            .map_err(|e| {
                on_unique_violation(e, |_| {
                    format!(
                        "{} named '{}' already exists at {}",
                        T::ENTITY,
                        node.name,
                        node.path
                    )
                })
            })?;

        tracing::info!(
            "Created {} {} ('{}') at {}",
            T::ENTITY,
            node.id,
            node.name,
            node.path
        );
        Ok(record)
    }

    /// Every ancestor in `node.path` must exist and belong to `node`'s space.
    fn check_ancestors(&self, node: &Node) -> Result<()> {
        let ancestors = self.load_multiple(node.path.ids())?;
        for id in node.path.ids() {
            match ancestors.iter().find(|a| a.node().id == *id) {
                None => {
                    return Err(Error::bad_parameter(format!(
                        "{} ancestor {} of '{}' does not exist",
                        T::ENTITY,
                        id,
                        node.name
                    )));
                }
                Some(ancestor) if ancestor.node().space_id != node.space_id => {
                    return Err(Error::bad_parameter(format!(
                        "{} ancestor {} belongs to space {}, not {}",
                        T::ENTITY,
                        id,
                        ancestor.node().space_id,
                        node.space_id
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn find(&self, id: Uuid) -> Result<Option<T>> {
        let id = id.to_string();
        Ok(self.query(&Self::select("id = ?"), &[&id])?.into_iter().next())
    }

    pub fn load(&self, id: Uuid) -> Result<T> {
        self.find(id)?
            .ok_or_else(|| Error::not_found(T::ENTITY, id))
    }

    /// Best-effort batch load. Ids with no row are simply absent from the
    /// result; the order of the result is unspecified.
    pub fn load_multiple(&self, ids: &[Uuid]) -> Result<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let params: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();
        let filter = format!("id IN ({})", placeholders(ids.len()));
        self.query(&Self::select(&filter), &params)
    }

    /// Every node, at any depth, whose path contains `id`.
    pub fn load_children(&self, id: Uuid) -> Result<Vec<T>> {
        let needle = format!(
            "{sep}{}{sep}",
            path::to_label(id),
            sep = LABEL_SEPARATOR
        );
        let filter = format!(
            "instr('{sep}' || path || '{sep}', ?) > 0",
            sep = LABEL_SEPARATOR
        );
        tracing::debug!("Loading {} subtree of {}", T::ENTITY, id);
        self.query(&Self::select(&filter), &[&needle])
    }

    /// All nodes of a space.
    pub fn list(&self, space_id: Uuid) -> Result<Vec<T>> {
        let space_id = space_id.to_string();
        self.query(
            &Self::select("space_id = ? ORDER BY created_at, name"),
            &[&space_id],
        )
    }

    /// The root of the space's tree (the node with an empty path).
    pub fn root(&self, space_id: Uuid) -> Result<T> {
        let key = space_id.to_string();
        self.query(
            &Self::select("space_id = ? AND path = '' ORDER BY created_at LIMIT 1"),
            &[&key],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| Error::not_found(T::ENTITY, format!("root of space {}", space_id)))
    }

    /// Persist the mutable fields of an existing node.
    ///
    /// The write only succeeds if the stored version still equals the
    /// record's version; it then bumps the version by one.
    pub fn save(&self, mut record: T) -> Result<T> {
        let now = Utc::now();
        let node = record.node();
        if node.name.trim().is_empty() {
            return Err(Error::bad_parameter(format!(
                "{} name must not be empty",
                T::ENTITY
            )));
        }

        let mut assignments = vec!["name = ?".to_string()];
        assignments.extend(T::EXTRA_COLUMNS.iter().map(|c| format!("{} = ?", c)));
        assignments.push("updated_at = ?".to_string());
        assignments.push("version = version + 1".to_string());

        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(node.name.clone())];
        params.extend(record.extra_values());
        params.push(Box::new(now.to_rfc3339()));
        params.push(Box::new(node.id.to_string()));
        params.push(Box::new(node.version));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? AND version = ?",
            T::TABLE,
            assignments.join(", ")
        );
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = self
            .conn
            .execute(&sql, params_ref.as_slice())
            .map_err(|e| {
                on_unique_violation(e, |detail| {
                    format!("{} {} could not be saved: {}", T::ENTITY, node.id, detail)
                })
            })?;

        if rows == 0 {
            return match self.find(node.id)? {
                None => Err(Error::not_found(T::ENTITY, node.id)),
                Some(current) => Err(Error::conflict(format!(
                    "{} {} was modified concurrently (expected version {}, found {})",
                    T::ENTITY,
                    node.id,
                    node.version,
                    current.node().version
                ))),
            };
        }

        let node = record.node_mut();
        node.version += 1;
        node.updated_at = now;
        Ok(record)
    }

    /// Remove a single node row. Descendants are left alone; use
    /// [`crate::tree::CascadeDeleter`] to remove a subtree.
    pub fn delete(&self, id: Uuid) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
        let rows = self.conn.execute(&sql, [id.to_string()])?;
        if rows == 0 {
            return Err(Error::not_found(T::ENTITY, id));
        }
        tracing::info!("Deleted {} {}", T::ENTITY, id);
        Ok(())
    }

    /// Remove the given nodes. Returns how many rows were deleted.
    pub fn delete_many(&self, ids: &[Uuid]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let params: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();
        let sql = format!(
            "DELETE FROM {} WHERE id IN ({})",
            T::TABLE,
            placeholders(ids.len())
        );
        Ok(self.conn.execute(&sql, params.as_slice())?)
    }
}
