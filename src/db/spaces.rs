use chrono::Utc;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::tree::{TreeRecord, TreeRepository};
use super::{parse_datetime, parse_uuid};
use crate::error::{on_unique_violation, Error, Result};
use crate::models::{Area, CreateSpaceInput, Iteration, Node, Space};
use crate::tree::path::NodePath;

pub struct SpaceRepository<'c> {
    conn: &'c Connection,
}

fn map_space(row: &Row<'_>) -> rusqlite::Result<Space> {
    Ok(Space {
        id: parse_uuid(0, row.get(0)?)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: parse_datetime(3, row.get(3)?)?,
        updated_at: parse_datetime(4, row.get(4)?)?,
    })
}

impl<'c> SpaceRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Create a space together with its root iteration and root area.
    pub fn create(&self, input: CreateSpaceInput) -> Result<Space> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::bad_parameter("Space name must not be empty"));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO spaces (id, name, description, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
                (
                    id.to_string(),
                    &name,
                    &input.description,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                ),
            )
            .map_err(|e| on_unique_violation(e, |_| format!("Space '{}' already exists", name)))?;

        TreeRepository::<Iteration>::new(self.conn).create(Iteration {
            node: Node::new(id, name.clone(), NodePath::root()),
            description: None,
            start_at: None,
            end_at: None,
            state: Default::default(),
            user_active: false,
        })?;
        TreeRepository::<Area>::new(self.conn).create(Area {
            node: Node::new(id, name.clone(), NodePath::root()),
        })?;

        tracing::info!("Created space {} ('{}')", id, name);
        Ok(Space {
            id,
            name,
            description: input.description,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn load(&self, id: Uuid) -> Result<Space> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at, updated_at FROM spaces WHERE id = ?",
        )?;
        let space = stmt.query_map([id.to_string()], map_space)?.next().transpose()?;
        space.ok_or_else(|| Error::not_found("Space", id))
    }

    pub fn list(&self) -> Result<Vec<Space>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at, updated_at FROM spaces ORDER BY name",
        )?;
        let spaces = stmt
            .query_map([], map_space)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(spaces)
    }

    /// The designated root container of the given kind, used as the
    /// fallback for orphaned work items.
    pub fn root<T: TreeRecord>(&self, space_id: Uuid) -> Result<T> {
        self.load(space_id)?;
        TreeRepository::<T>::new(self.conn).root(space_id)
    }
}
