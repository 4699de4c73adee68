//! One-slot shape cache used while walking the members of one container.

use crate::model::{Shape, ShapeTable, Sid};

/// Remembers the last resolved shape.
///
/// Sibling members frequently share a shape, so a hit saves one table lookup.
/// The cache lives for one container walk and never outlives the table borrow.
#[derive(Debug, Default)]
pub struct ShapeCache<'t> {
    last: Option<&'t Shape>,
    hits: usize,
}

impl<'t> ShapeCache<'t> {
    pub fn new() -> Self {
        Self { last: None, hits: 0 }
    }

    /// Resolves `sid`, consulting the cached shape first.
    pub fn lookup<T: ShapeTable + ?Sized>(&mut self, table: &'t T, sid: Sid) -> Option<&'t Shape> {
        if let Some(shape) = self.last {
            if shape.sid == sid {
                self.hits += 1;
                return Some(shape);
            }
        }
        let shape = table.lookup_shape_by_id(sid)?;
        self.last = Some(shape);
        Some(shape)
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemoryShapeTable, SID_NUMBER, SID_SHORT_STRING};

    #[test]
    fn test_cache_hits() {
        let table = MemoryShapeTable::new();
        let mut cache = ShapeCache::new();
        assert_eq!(cache.lookup(&table, SID_NUMBER).unwrap().sid, SID_NUMBER);
        assert_eq!(cache.lookup(&table, SID_NUMBER).unwrap().sid, SID_NUMBER);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.lookup(&table, SID_SHORT_STRING).unwrap().sid, SID_SHORT_STRING);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn test_miss_keeps_slot() {
        let table = MemoryShapeTable::new();
        let mut cache = ShapeCache::new();
        cache.lookup(&table, SID_NUMBER);
        assert!(cache.lookup(&table, 1234).is_none());
        cache.lookup(&table, SID_NUMBER);
        assert_eq!(cache.hits(), 1);
    }
}
