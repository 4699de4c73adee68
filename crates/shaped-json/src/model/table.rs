//! The shape table: interning of shapes and attribute names.

use rustc_hash::FxHashMap;

use crate::error::ShapeTableError;
use crate::model::{basic_shape, Aid, Shape, ShapeKind, Sid, FIRST_DYNAMIC_SID};

/// Interns shapes and attribute names.
///
/// Shaping calls the `find_or_create_*` methods and therefore needs exclusive
/// access. Unshaping only calls the lookup methods, which must keep returning
/// the same shape for an id once it has been handed out.
pub trait ShapeTable {
    /// Resolves a shape id. Basic shape ids always resolve.
    fn lookup_shape_by_id(&self, sid: Sid) -> Option<&Shape>;

    /// Resolves an attribute id to its name.
    fn lookup_attribute_name(&self, aid: Aid) -> Option<&str>;

    /// Returns the interned shape with the same layout as `candidate`, if any.
    fn find_shape(&self, candidate: &ShapeKind) -> Option<&Shape>;

    /// Returns the interned shape with the same layout as `candidate`,
    /// interning it under a fresh id if there is none.
    fn find_or_create_shape(&mut self, candidate: ShapeKind) -> Result<&Shape, ShapeTableError>;

    /// Returns the id of an attribute name, if it has been interned.
    fn find_attribute(&self, name: &str) -> Option<Aid>;

    /// Returns the id of an attribute name, interning it if necessary.
    fn find_or_create_attribute(&mut self, name: &str) -> Result<Aid, ShapeTableError>;
}

/// Append-only in-memory shape table.
///
/// Shapes are deduplicated by their [`ShapeKind::fingerprint`]. Attribute ids
/// start at 1. Attribute names have no length limit unless one is set with
/// [`MemoryShapeTable::with_max_attribute_len`].
#[derive(Debug, Clone)]
pub struct MemoryShapeTable {
    shapes: FxHashMap<Sid, Shape>,
    fingerprints: FxHashMap<[u8; 32], Sid>,
    attribute_ids: FxHashMap<String, Aid>,
    attribute_names: Vec<String>,
    next_sid: Sid,
    max_attribute_len: Option<usize>,
}

impl Default for MemoryShapeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryShapeTable {
    /// Creates a table holding only the basic shapes.
    pub fn new() -> Self {
        Self {
            shapes: FxHashMap::default(),
            fingerprints: FxHashMap::default(),
            attribute_ids: FxHashMap::default(),
            attribute_names: Vec::new(),
            next_sid: FIRST_DYNAMIC_SID,
            max_attribute_len: None,
        }
    }

    /// Rejects attribute names longer than `max` bytes.
    pub fn with_max_attribute_len(mut self, max: usize) -> Self {
        self.max_attribute_len = Some(max);
        self
    }

    /// Number of composite shapes interned (basic shapes excluded).
    pub fn len_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Number of attribute names interned.
    pub fn len_attributes(&self) -> usize {
        self.attribute_names.len()
    }

    /// Iterates over the composite shapes in id order.
    pub fn shapes(&self) -> impl Iterator<Item = &Shape> {
        (FIRST_DYNAMIC_SID..self.next_sid).filter_map(|sid| self.shapes.get(&sid))
    }

    fn validate(&self, candidate: &ShapeKind) -> Result<(), ShapeTableError> {
        match candidate {
            ShapeKind::HomogeneousList { entry_sid }
            | ShapeKind::HomogeneousSizedList { entry_sid, .. } => {
                if self.lookup_shape_by_id(*entry_sid).is_none() {
                    return Err(ShapeTableError::InvalidShape {
                        reason: "unknown entry shape",
                    });
                }
            }
            ShapeKind::Array(array) => {
                if array.sids().iter().any(|sid| self.lookup_shape_by_id(*sid).is_none()) {
                    return Err(ShapeTableError::InvalidShape {
                        reason: "unknown member shape",
                    });
                }
                if array
                    .aids()
                    .iter()
                    .any(|aid| self.lookup_attribute_name(*aid).is_none())
                {
                    return Err(ShapeTableError::InvalidShape {
                        reason: "unknown member attribute",
                    });
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl ShapeTable for MemoryShapeTable {
    fn lookup_shape_by_id(&self, sid: Sid) -> Option<&Shape> {
        basic_shape(sid).or_else(|| self.shapes.get(&sid))
    }

    fn lookup_attribute_name(&self, aid: Aid) -> Option<&str> {
        let index = usize::try_from(aid.checked_sub(1)?).ok()?;
        self.attribute_names.get(index).map(String::as_str)
    }

    fn find_shape(&self, candidate: &ShapeKind) -> Option<&Shape> {
        if let Some(sid) = candidate.basic_sid() {
            return basic_shape(sid);
        }
        let sid = self.fingerprints.get(&candidate.fingerprint())?;
        self.shapes.get(sid)
    }

    fn find_or_create_shape(&mut self, candidate: ShapeKind) -> Result<&Shape, ShapeTableError> {
        if let Some(sid) = candidate.basic_sid() {
            return basic_shape(sid).ok_or(ShapeTableError::InvalidShape {
                reason: "unknown basic shape",
            });
        }

        let fingerprint = candidate.fingerprint();
        let sid = match self.fingerprints.get(&fingerprint) {
            Some(&sid) => sid,
            None => {
                self.validate(&candidate)?;
                let sid = self.next_sid;
                self.next_sid = sid
                    .checked_add(1)
                    .ok_or(ShapeTableError::IdSpaceExhausted { kind: "shape" })?;
                let shape = Shape::new(sid, candidate);
                log::debug!("interned shape {shape}");
                self.fingerprints.insert(fingerprint, sid);
                self.shapes.insert(sid, shape);
                sid
            }
        };
        self.shapes.get(&sid).ok_or(ShapeTableError::InvalidShape {
            reason: "interned shape missing",
        })
    }

    fn find_attribute(&self, name: &str) -> Option<Aid> {
        self.attribute_ids.get(name).copied()
    }

    fn find_or_create_attribute(&mut self, name: &str) -> Result<Aid, ShapeTableError> {
        if name.is_empty() {
            return Err(ShapeTableError::EmptyAttributeName);
        }
        if let Some(max) = self.max_attribute_len.filter(|max| name.len() > *max) {
            return Err(ShapeTableError::AttributeNameTooLong {
                len: name.len(),
                max,
            });
        }
        if let Some(&aid) = self.attribute_ids.get(name) {
            return Ok(aid);
        }

        let aid = Aid::try_from(self.attribute_names.len() + 1)
            .map_err(|_| ShapeTableError::IdSpaceExhausted { kind: "attribute" })?;
        log::debug!("interned attribute {name:?} as @{aid}");
        self.attribute_names.push(name.to_string());
        self.attribute_ids.insert(name.to_string(), aid);
        Ok(aid)
    }
}
