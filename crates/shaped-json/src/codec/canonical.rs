//! Canonical member order for object shapes.
//!
//! Fixed-size members come first, then members are ordered by type weight,
//! then by attribute id. Two objects with the same keys and member shapes
//! therefore always produce the same shape, whatever their key order.

use std::cmp::Ordering;

use crate::model::{Aid, ShapeType};

/// Sort key of one object member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalKey {
    pub fixed: bool,
    pub weight: u16,
    pub aid: Aid,
}

impl CanonicalKey {
    pub fn new(fixed: bool, shape_type: ShapeType, aid: Aid) -> Self {
        Self {
            fixed,
            weight: shape_type.weight(),
            aid,
        }
    }
}

impl Ord for CanonicalKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // fixed sorts first
        other
            .fixed
            .cmp(&self.fixed)
            .then(self.weight.cmp(&other.weight))
            .then(self.aid.cmp(&other.aid))
    }
}

impl PartialOrd for CanonicalKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two members in canonical order.
#[inline]
pub fn compare(a: &CanonicalKey, b: &CanonicalKey) -> Ordering {
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_before_variable() {
        let fixed = CanonicalKey::new(true, ShapeType::Array, 9);
        let variable = CanonicalKey::new(false, ShapeType::Null, 1);
        assert_eq!(compare(&fixed, &variable), Ordering::Less);
    }

    #[test]
    fn test_weight_then_aid() {
        let mut keys = vec![
            CanonicalKey::new(true, ShapeType::Number, 1),
            CanonicalKey::new(true, ShapeType::Boolean, 5),
            CanonicalKey::new(true, ShapeType::Number, 0),
            CanonicalKey::new(false, ShapeType::LongString, 2),
            CanonicalKey::new(false, ShapeType::HomogeneousSizedList, 3),
        ];
        keys.sort();
        let order: Vec<(ShapeType, Aid)> = keys
            .iter()
            .map(|k| {
                let ty = [
                    ShapeType::Boolean,
                    ShapeType::Number,
                    ShapeType::LongString,
                    ShapeType::HomogeneousSizedList,
                ]
                .into_iter()
                .find(|t| t.weight() == k.weight)
                .unwrap();
                (ty, k.aid)
            })
            .collect();
        assert_eq!(
            order,
            vec![
                (ShapeType::Boolean, 5),
                (ShapeType::Number, 0),
                (ShapeType::Number, 1),
                (ShapeType::LongString, 2),
                (ShapeType::HomogeneousSizedList, 3),
            ]
        );
    }

    #[test]
    fn test_total_order_on_distinct_aids() {
        let a = CanonicalKey::new(true, ShapeType::Number, 1);
        let b = CanonicalKey::new(true, ShapeType::Number, 2);
        assert_ne!(compare(&a, &b), Ordering::Equal);
        assert_eq!(compare(&a, &a), Ordering::Equal);
    }
}
