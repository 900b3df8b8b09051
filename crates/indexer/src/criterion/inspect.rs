//! Read-only queries over a criterion tree.

use super::Criterion;

impl Criterion {
    /// True if any node of the tree satisfies `predicate`.
    pub fn any(&self, predicate: &impl Fn(&Criterion) -> bool) -> bool {
        if predicate(self) {
            return true;
        }
        match self {
            Criterion::And(children) | Criterion::Or(children) => {
                children.iter().any(|child| child.any(predicate))
            }
            Criterion::Not(child) => child.any(predicate),
            _ => false,
        }
    }

    /// True if the tree holds at least one circle leaf.
    pub fn contains_circle(&self) -> bool {
        self.any(&|node| matches!(node, Criterion::Circle { .. }))
    }

    /// True if the tree holds a polygon or bounding box leaf.
    pub fn contains_polygon_or_bbox(&self) -> bool {
        self.any(&|node| {
            matches!(
                node,
                Criterion::Polygon { .. } | Criterion::BoundingBox { .. }
            )
        })
    }

    /// The first circle leaf, depth first.
    pub fn find_circle(&self) -> Option<&Criterion> {
        self.circles().into_iter().next()
    }

    /// Every circle leaf, depth first.
    pub fn circles(&self) -> Vec<&Criterion> {
        self.signed_circles()
            .into_iter()
            .map(|(circle, _)| circle)
            .collect()
    }

    /// Every circle leaf, depth first, paired with `true` when it sits under
    /// an odd number of `Not` nodes.
    pub fn signed_circles(&self) -> Vec<(&Criterion, bool)> {
        let mut found = Vec::new();
        self.collect_circles(false, &mut found);
        found
    }

    fn collect_circles<'a>(&'a self, negated: bool, found: &mut Vec<(&'a Criterion, bool)>) {
        match self {
            Criterion::And(children) | Criterion::Or(children) => {
                for child in children {
                    child.collect_circles(negated, found);
                }
            }
            Criterion::Not(child) => child.collect_circles(!negated, found),
            Criterion::Circle { .. } => found.push((self, negated)),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::builders::{and, eq, intersects_circle, not, or};

    #[test]
    fn test_signed_circles() {
        let tree = and([
            intersects_circle([0.0, 10.0], "1km"),
            not(or([
                eq("properties.mission", "MEX"),
                intersects_circle([0.0, 20.0], "1km"),
                not(intersects_circle([0.0, 30.0], "1km")),
            ])),
        ]);
        let signs: Vec<bool> = tree
            .signed_circles()
            .into_iter()
            .map(|(_, negated)| negated)
            .collect();
        assert_eq!(signs, vec![false, true, false]);
        assert_eq!(tree.find_circle(), Some(&intersects_circle([0.0, 10.0], "1km")));
        assert!(!eq("properties.mission", "MEX").contains_circle());
    }
}
