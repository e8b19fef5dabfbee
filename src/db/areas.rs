use rusqlite::{Row, ToSql};
use uuid::Uuid;

use super::tree::TreeRecord;
use crate::models::{Area, Node, WorkItem};

impl TreeRecord for Area {
    const ENTITY: &'static str = "Area";
    const TABLE: &'static str = "areas";
    const CONTAINER_COLUMN: &'static str = "area_id";
    const EXTRA_COLUMNS: &'static [&'static str] = &[];

    fn node(&self) -> &Node {
        &self.node
    }

    fn node_mut(&mut self) -> &mut Node {
        &mut self.node
    }

    fn extra_values(&self) -> Vec<Box<dyn ToSql>> {
        Vec::new()
    }

    fn from_row(node: Node, _row: &Row<'_>, _offset: usize) -> rusqlite::Result<Self> {
        Ok(Area { node })
    }

    fn set_container(item: &mut WorkItem, id: Uuid) {
        item.area_id = id;
    }
}
