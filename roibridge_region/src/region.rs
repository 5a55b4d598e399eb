// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composable region predicates.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Point, Rect};
use smallvec::SmallVec;

use roibridge_shape::{BoundaryType, PlaneCoordinate};

use crate::composite::PlaneComposite;
use crate::geometry::Geometry;
use crate::shape_region::ShapeRegion;

/// Boolean operator of a [`Region::Composite`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Union.
    Or,
    /// Intersection.
    And,
    /// First operand minus the union of the rest.
    Minus,
    /// Points inside an odd number of operands.
    Xor,
    /// Complement of the single operand.
    Not,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Or => "union",
            Self::And => "intersection",
            Self::Minus => "difference",
            Self::Xor => "exclusive or",
            Self::Not => "negation",
        };
        f.write_str(name)
    }
}

/// A plain geometric predicate with a boundary type.
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleRegion {
    /// Geometry.
    pub geometry: Geometry,
    /// Boundary inclusion.
    pub boundary: BoundaryType,
}

impl SimpleRegion {
    /// Creates a simple region.
    #[must_use]
    pub fn new(geometry: Geometry, boundary: BoundaryType) -> Self {
        Self { geometry, boundary }
    }

    /// Tests a 2D point.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.geometry.contains(p, self.boundary)
    }
}

/// A region-of-interest predicate over real coordinates.
///
/// Positions are passed as slices: `[x, y]` for 2D regions and `[x, y, ...]`
/// with one trailing coordinate per discrete axis otherwise. Positions with
/// fewer coordinates than [`dimensions`](Self::dimensions) are never contained.
///
/// | Variant | Dimensions | Position layout |
/// |---------|------------|-----------------|
/// | `Simple`, `Shape` | 2 | `x, y` |
/// | `Transformed` | same as source | source layout |
/// | `Composite` | max over operands | operand layout |
/// | `OnPlane` | 5 | `x, y, z, t, c` |
/// | `Planes` | 2 + active axes | `x, y`, then active axes in Z, T, C order |
#[derive(Clone, Debug, PartialEq)]
pub enum Region {
    /// Local geometry.
    Simple(SimpleRegion),
    /// A wrapped remote shape.
    Shape(ShapeRegion),
    /// `source` seen through an affine: `p` is inside when `to_source * p` is
    /// inside `source`.
    Transformed {
        /// The untransformed region.
        source: Box<Region>,
        /// Maps this region's space into `source`'s space.
        to_source: Affine,
    },
    /// Boolean combination of operands.
    Composite {
        /// Combining operator.
        operator: Operator,
        /// Operands; [`Operator::Not`] uses exactly one.
        operands: Vec<Region>,
    },
    /// A 2D region placed on a plane of a 5D `(x, y, z, t, c)` space.
    ///
    /// Wildcard plane components accept any value on that axis.
    OnPlane {
        /// The 2D region.
        source: Box<Region>,
        /// Plane position.
        plane: PlaneCoordinate,
    },
    /// Shapes indexed by plane.
    Planes(PlaneComposite),
}

impl From<SimpleRegion> for Region {
    fn from(value: SimpleRegion) -> Self {
        Self::Simple(value)
    }
}

impl From<ShapeRegion> for Region {
    fn from(value: ShapeRegion) -> Self {
        Self::Shape(value)
    }
}

impl From<PlaneComposite> for Region {
    fn from(value: PlaneComposite) -> Self {
        Self::Planes(value)
    }
}

impl Region {
    /// Simple region from geometry and boundary.
    #[must_use]
    pub fn simple(geometry: Geometry, boundary: BoundaryType) -> Self {
        Self::Simple(SimpleRegion::new(geometry, boundary))
    }

    /// Box region.
    #[must_use]
    pub fn rect(x: f64, y: f64, width: f64, height: f64, boundary: BoundaryType) -> Self {
        Self::simple(Geometry::new_box(x, y, width, height), boundary)
    }

    /// Ellipse region.
    #[must_use]
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64, boundary: BoundaryType) -> Self {
        Self::simple(Geometry::new_ellipse(cx, cy, rx, ry), boundary)
    }

    /// Polygon region.
    #[must_use]
    pub fn polygon(points: impl Into<Vec<Point>>, boundary: BoundaryType) -> Self {
        Self::simple(Geometry::Polygon(points.into()), boundary)
    }

    /// Union of `operands`.
    #[must_use]
    pub fn union(operands: impl IntoIterator<Item = Self>) -> Self {
        Self::Composite {
            operator: Operator::Or,
            operands: operands.into_iter().collect(),
        }
    }

    /// Union with `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::union([self, other])
    }

    /// Intersection with `other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.combine(Operator::And, other)
    }

    /// Difference with `other`.
    #[must_use]
    pub fn minus(self, other: Self) -> Self {
        self.combine(Operator::Minus, other)
    }

    /// Symmetric difference with `other`.
    #[must_use]
    pub fn xor(self, other: Self) -> Self {
        self.combine(Operator::Xor, other)
    }

    /// Complement.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Composite {
            operator: Operator::Not,
            operands: vec![self],
        }
    }

    fn combine(self, operator: Operator, other: Self) -> Self {
        Self::Composite {
            operator,
            operands: vec![self, other],
        }
    }

    /// This region seen through `to_source`.
    #[must_use]
    pub fn transform(self, to_source: Affine) -> Self {
        Self::Transformed {
            source: Box::new(self),
            to_source,
        }
    }

    /// This region placed on `plane`.
    #[must_use]
    pub fn on_plane(self, plane: PlaneCoordinate) -> Self {
        Self::OnPlane {
            source: Box::new(self),
            plane,
        }
    }

    /// Number of coordinates a position needs.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        match self {
            Self::Simple(_) | Self::Shape(_) => 2,
            Self::Transformed { source, .. } => source.dimensions(),
            Self::Composite { operands, .. } => {
                operands.iter().map(Self::dimensions).max().unwrap_or(2)
            }
            Self::OnPlane { .. } => 5,
            Self::Planes(c) => c.dimensions(),
        }
    }

    /// Tests a 2D point, with every discrete coordinate at zero.
    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        let mut pos = [0.0; 5];
        pos[0] = p.x;
        pos[1] = p.y;
        self.contains(&pos[..self.dimensions().min(5)])
    }

    /// Tests a position (see the type docs for the layout).
    #[must_use]
    pub fn contains(&self, pos: &[f64]) -> bool {
        if pos.len() < 2 {
            return false;
        }
        match self {
            Self::Simple(s) => s.contains(Point::new(pos[0], pos[1])),
            Self::Shape(s) => s.contains(Point::new(pos[0], pos[1])),
            Self::Transformed { source, to_source } => {
                let q = *to_source * Point::new(pos[0], pos[1]);
                let mut moved: SmallVec<[f64; 5]> = SmallVec::from_slice(pos);
                moved[0] = q.x;
                moved[1] = q.y;
                source.contains(&moved)
            }
            Self::Composite { operator, operands } => match operator {
                Operator::Or => operands.iter().any(|r| r.contains(pos)),
                Operator::And => !operands.is_empty() && operands.iter().all(|r| r.contains(pos)),
                Operator::Minus => match operands.split_first() {
                    Some((first, rest)) => {
                        first.contains(pos) && !rest.iter().any(|r| r.contains(pos))
                    }
                    None => false,
                },
                Operator::Xor => operands.iter().filter(|r| r.contains(pos)).count() % 2 == 1,
                Operator::Not => !operands.first().is_some_and(|r| r.contains(pos)),
            },
            Self::OnPlane { source, plane } => {
                let [x, y, z, t, c] = match pos {
                    [x, y, z, t, c, ..] => [*x, *y, *z, *t, *c],
                    _ => return false,
                };
                axis_matches(plane.z(), z)
                    && axis_matches(plane.t(), t)
                    && axis_matches(plane.c(), c)
                    && source.contains(&[x, y])
            }
            Self::Planes(c) => c.contains(pos),
        }
    }

    /// Boundary type of the predicate.
    ///
    /// Negation swaps Closed and Open; every other combination yields the
    /// shared type of its operands, or Unspecified when they disagree.
    #[must_use]
    pub fn boundary_type(&self) -> BoundaryType {
        match self {
            Self::Simple(s) => s.boundary,
            Self::Shape(s) => s.boundary_type(),
            Self::Transformed { source, .. } | Self::OnPlane { source, .. } => {
                source.boundary_type()
            }
            Self::Composite {
                operator: Operator::Not,
                operands,
            } => operands
                .first()
                .map_or(BoundaryType::Unspecified, |r| r.boundary_type().complement()),
            Self::Composite { operands, .. } => {
                BoundaryType::agreement(operands.iter().map(Self::boundary_type))
            }
            Self::Planes(c) => c.boundary_type(),
        }
    }

    /// Bounds in the `x, y` plane, or `None` when unbounded or empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Simple(s) => s.geometry.bounds(),
            Self::Shape(s) => s.bounds(),
            Self::Transformed { source, to_source } => {
                let inner = source.bounds()?;
                let to_image = roibridge_shape::invert(*to_source).ok()?;
                Some(to_image.transform_rect_bbox(inner))
            }
            Self::Composite { operator, operands } => match operator {
                Operator::Or | Operator::Xor => operands
                    .iter()
                    .map(Self::bounds)
                    .try_fold(None::<Rect>, |acc, b| {
                        let b = b?;
                        Some(Some(acc.map_or(b, |a| a.union(b))))
                    })
                    .flatten(),
                Operator::And => operands
                    .iter()
                    .filter_map(Self::bounds)
                    .reduce(|a, b| a.intersect(b)),
                Operator::Minus => operands.first().and_then(Self::bounds),
                Operator::Not => None,
            },
            Self::OnPlane { source, .. } => source.bounds(),
            Self::Planes(c) => c.xy_bounds(),
        }
    }
}

fn axis_matches(plane: i32, coord: f64) -> bool {
    plane == PlaneCoordinate::WILDCARD || f64::from(plane) == coord
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    const C: BoundaryType = BoundaryType::Closed;
    const O: BoundaryType = BoundaryType::Open;

    #[test]
    fn set_algebra() {
        let a = Region::rect(0.0, 0.0, 4.0, 4.0, C);
        let b = Region::rect(2.0, 2.0, 4.0, 4.0, C);
        let p = Point::new(3.0, 3.0);
        let q = Point::new(1.0, 1.0);
        assert!(a.clone().or(b.clone()).contains_point(q));
        assert!(a.clone().and(b.clone()).contains_point(p));
        assert!(!a.clone().and(b.clone()).contains_point(q));
        assert!(a.clone().minus(b.clone()).contains_point(q));
        assert!(!a.clone().minus(b.clone()).contains_point(p));
        assert!(!a.clone().xor(b).contains_point(p));
        assert!(a.negate().contains_point(Point::new(9.0, 9.0)));
    }

    #[test]
    fn transformed_maps_into_source() {
        let r = Region::rect(0.0, 0.0, 1.0, 1.0, C)
            .transform(Affine::translate(Vec2::new(-10.0, 0.0)));
        assert!(r.contains_point(Point::new(10.5, 0.5)));
        assert!(!r.contains_point(Point::new(0.5, 0.5)));
        assert_eq!(r.bounds(), Some(Rect::new(10.0, 0.0, 11.0, 1.0)));
    }

    #[test]
    fn on_plane_is_five_dimensional() {
        let plane = PlaneCoordinate::new(2, -1, 0).unwrap();
        let r = Region::rect(0.0, 0.0, 1.0, 1.0, C).on_plane(plane);
        assert_eq!(r.dimensions(), 5);
        assert!(r.contains(&[0.5, 0.5, 2.0, 7.0, 0.0]));
        assert!(!r.contains(&[0.5, 0.5, 1.0, 7.0, 0.0]));
        assert!(!r.contains(&[0.5, 0.5]));
    }

    #[test]
    fn boundary_type_agreement() {
        let a = Region::rect(0.0, 0.0, 1.0, 1.0, O);
        let b = Region::ellipse(0.0, 0.0, 1.0, 1.0, O);
        assert_eq!(a.clone().or(b.clone()).boundary_type(), O);
        assert_eq!(a.clone().negate().boundary_type(), C);
        let c = Region::rect(0.0, 0.0, 1.0, 1.0, C);
        assert_eq!(
            a.or(c).boundary_type(),
            BoundaryType::Unspecified,
            "mixed operands are unspecified"
        );
        assert_eq!(b.boundary_type(), O);
    }

    #[test]
    fn union_bounds_need_every_operand_bounded() {
        let a = Region::rect(0.0, 0.0, 1.0, 1.0, C);
        let b = Region::rect(5.0, 5.0, 1.0, 1.0, C);
        assert_eq!(
            a.clone().or(b).bounds(),
            Some(Rect::new(0.0, 0.0, 6.0, 6.0))
        );
        let unbounded = Region::rect(0.0, 0.0, 1.0, 1.0, C).negate();
        assert_eq!(a.or(unbounded).bounds(), None);
    }
}
