//! Test helpers: a read-only view of a table that can hide entries.

use std::cell::Cell;

use crate::error::ShapeTableError;
use crate::model::{Aid, MemoryShapeTable, Shape, ShapeKind, ShapeTable, Sid};

/// Simulates a reader whose table lags behind the writer's.
pub(crate) struct StaleTable<'a> {
    pub inner: &'a MemoryShapeTable,
    pub hidden_sids: Vec<Sid>,
    pub hidden_aids: Vec<Aid>,
    pub shape_lookups: Cell<usize>,
}

impl<'a> StaleTable<'a> {
    pub fn new(inner: &'a MemoryShapeTable) -> Self {
        Self {
            inner,
            hidden_sids: Vec::new(),
            hidden_aids: Vec::new(),
            shape_lookups: Cell::new(0),
        }
    }

    pub fn hide_shape(mut self, sid: Sid) -> Self {
        self.hidden_sids.push(sid);
        self
    }

    pub fn hide_attribute(mut self, name: &str) -> Self {
        if let Some(aid) = self.inner.find_attribute(name) {
            self.hidden_aids.push(aid);
        }
        self
    }
}

impl ShapeTable for StaleTable<'_> {
    fn lookup_shape_by_id(&self, sid: Sid) -> Option<&Shape> {
        self.shape_lookups.set(self.shape_lookups.get() + 1);
        if self.hidden_sids.contains(&sid) {
            return None;
        }
        self.inner.lookup_shape_by_id(sid)
    }

    fn lookup_attribute_name(&self, aid: Aid) -> Option<&str> {
        if self.hidden_aids.contains(&aid) {
            return None;
        }
        self.inner.lookup_attribute_name(aid)
    }

    fn find_shape(&self, candidate: &ShapeKind) -> Option<&Shape> {
        self.inner
            .find_shape(candidate)
            .filter(|shape| !self.hidden_sids.contains(&shape.sid))
    }

    fn find_or_create_shape(&mut self, _: ShapeKind) -> Result<&Shape, ShapeTableError> {
        Err(ShapeTableError::InvalidShape { reason: "read-only table" })
    }

    fn find_attribute(&self, name: &str) -> Option<Aid> {
        self.inner
            .find_attribute(name)
            .filter(|aid| !self.hidden_aids.contains(aid))
    }

    fn find_or_create_attribute(&mut self, _: &str) -> Result<Aid, ShapeTableError> {
        Err(ShapeTableError::InvalidShape { reason: "read-only table" })
    }
}
