// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plane-indexed union of shapes.

use alloc::vec::Vec;

use hashbrown::HashMap;
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Rect};
use smallvec::SmallVec;

use roibridge_shape::{Axis, BoundaryType, PlaneCoordinate, RemoteRoi, RoiId};

use crate::adapter::ConversionError;
use crate::shape_region::ShapeRegion;

type Keys = SmallVec<[PlaneCoordinate; 8]>;

/// The union of several wrapped shapes, indexed by plane.
///
/// Each member sits at a [`PlaneCoordinate`]; members sharing a coordinate
/// are unioned. The *active axes* are those of Z, T and C on which at least
/// one member has a concrete index. A position is `[x, y]` followed by one
/// coordinate per active axis, in Z, T, C order, so [`dimensions`] is
/// `2 + active axes`.
///
/// ## Containment
///
/// Plane coordinates are real numbers, and a position between two planes is
/// inside when both neighboring planes are covered:
///
/// 1. A negative plane coordinate is never inside.
/// 2. Every floor/ceil combination of the plane coordinates (up to eight
///    neighbors) must be *covered*: held by a member key directly or after
///    relaxing one active axis to the wildcard, or, with three active axes,
///    by a key with two wildcards.
/// 3. The `x, y` point is then tested against the members at the rounded
///    plane position and its relaxations, and any hit is inside.
///
/// So shapes at Z = 0, 1, 2 contain Z = 1.5 but not Z = 3, and a shape with a
/// wildcard Z covers every Z.
///
/// Operands are available read-only through [`operands`]; there is no
/// positional operand access.
///
/// [`dimensions`]: Self::dimensions
/// [`operands`]: Self::operands
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaneComposite {
    roi_id: Option<RoiId>,
    members: Vec<ShapeRegion>,
    planes: HashMap<PlaneCoordinate, SmallVec<[usize; 2]>>,
    axes: SmallVec<[Axis; 3]>,
}

impl PlaneComposite {
    /// Creates an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps every shape of `roi`.
    pub fn from_roi(roi: &RemoteRoi) -> Result<Self, ConversionError> {
        let mut out = Self {
            roi_id: roi.id,
            ..Self::default()
        };
        for shape in roi.shapes() {
            out.add(ShapeRegion::new(shape.clone())?);
        }
        Ok(out)
    }

    /// Adds a member.
    pub fn add(&mut self, member: ShapeRegion) {
        let plane = member.plane();
        self.planes
            .entry(plane)
            .or_default()
            .push(self.members.len());
        self.members.push(member);
        for axis in plane.specified_axes() {
            if !self.axes.contains(&axis) {
                self.axes.push(axis);
                self.axes.sort_unstable();
            }
        }
    }

    /// Id of the ROI this composite was built from.
    #[must_use]
    pub fn roi_id(&self) -> Option<RoiId> {
        self.roi_id
    }

    /// Members, in insertion order.
    #[must_use]
    pub fn operands(&self) -> &[ShapeRegion] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Active axes, in Z, T, C order.
    #[must_use]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// `2 + ` number of active axes.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        2 + self.axes.len()
    }

    /// Plane keys holding at least one member (unordered).
    pub fn planes(&self) -> impl Iterator<Item = PlaneCoordinate> + '_ {
        self.planes.keys().copied()
    }

    /// Members stored exactly at `plane`.
    pub fn members_on(&self, plane: PlaneCoordinate) -> impl Iterator<Item = &ShapeRegion> + '_ {
        self.planes
            .get(&plane)
            .into_iter()
            .flatten()
            .map(|i| &self.members[*i])
    }

    /// Shared boundary type of all members, or Unspecified if they disagree.
    #[must_use]
    pub fn boundary_type(&self) -> BoundaryType {
        BoundaryType::agreement(self.members.iter().map(ShapeRegion::boundary_type))
    }

    /// Union of the members' `x, y` bounds.
    #[must_use]
    pub fn xy_bounds(&self) -> Option<Rect> {
        self.members
            .iter()
            .filter_map(ShapeRegion::bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Tests a position (see the type docs).
    #[must_use]
    pub fn contains(&self, pos: &[f64]) -> bool {
        let n = self.axes.len();
        if pos.len() < 2 + n {
            return false;
        }
        let xy = Point::new(pos[0], pos[1]);
        let coords = &pos[2..2 + n];
        if coords.iter().any(|v| !(*v >= 0.0)) {
            return false;
        }
        if n == 0 {
            return self
                .members_on(PlaneCoordinate::ALL)
                .any(|m| m.contains(xy));
        }

        for corner in 0..1_u32 << n {
            let mut key = PlaneCoordinate::ALL;
            for (i, (axis, v)) in self.axes.iter().zip(coords).enumerate() {
                let v = if corner & (1 << i) == 0 {
                    v.floor()
                } else {
                    v.ceil()
                };
                key = with_index(key, *axis, v);
            }
            if !self.candidates(key).iter().any(|k| self.planes.contains_key(k)) {
                return false;
            }
        }

        let mut rounded = PlaneCoordinate::ALL;
        for (axis, v) in self.axes.iter().zip(coords) {
            rounded = with_index(rounded, *axis, v.round());
        }
        self.candidates(rounded)
            .iter()
            .flat_map(|k| self.members_on(*k))
            .any(|m| m.contains(xy))
    }

    /// Keys that can stand in for `key`: itself, each single-axis relaxation
    /// and, with three active axes, each key with only one axis specified.
    fn candidates(&self, key: PlaneCoordinate) -> Keys {
        let mut out = Keys::new();
        out.push(key);
        for axis in &self.axes {
            out.push(key.relaxed(*axis));
        }
        if self.axes.len() == 3 {
            out.push(key.relaxed(Axis::Z).relaxed(Axis::T));
            out.push(key.relaxed(Axis::Z).relaxed(Axis::C));
            out.push(key.relaxed(Axis::T).relaxed(Axis::C));
        }
        out
    }
}

/// Places a non-negative integral plane index into `key`.
fn with_index(key: PlaneCoordinate, axis: Axis, v: f64) -> PlaneCoordinate {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "plane indexes saturate at i32::MAX"
    )]
    let v = v as i32;
    key.with(axis, v).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roibridge_shape::{RemoteShape, ShapeGeometry};

    fn square_at(z: i32, t: i32, c: i32) -> ShapeRegion {
        let shape = RemoteShape::new(ShapeGeometry::Rectangle {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        })
        .on_plane(PlaneCoordinate::new(z, t, c).unwrap());
        ShapeRegion::new(shape).unwrap()
    }

    fn composite(members: impl IntoIterator<Item = ShapeRegion>) -> PlaneComposite {
        let mut c = PlaneComposite::new();
        for m in members {
            c.add(m);
        }
        c
    }

    #[test]
    fn interpolated_planes_are_covered() {
        let c = composite([square_at(0, -1, -1), square_at(1, -1, -1), square_at(2, -1, -1)]);
        assert_eq!(c.axes(), [Axis::Z]);
        assert_eq!(c.dimensions(), 3);
        assert!(c.contains(&[5.0, 5.0, 1.5]));
        assert!(c.contains(&[5.0, 5.0, 2.0]));
        assert!(!c.contains(&[5.0, 5.0, 2.5]));
        assert!(!c.contains(&[5.0, 5.0, 3.0]));
        assert!(!c.contains(&[5.0, 5.0, -0.5]));
        assert!(!c.contains(&[50.0, 5.0, 1.0]));
    }

    #[test]
    fn wildcard_z_matches_any_integer_z() {
        let c = composite([square_at(-1, 2, 0), square_at(0, 0, 0)]);
        assert_eq!(c.axes(), [Axis::Z, Axis::T, Axis::C]);
        for z in 0..20 {
            assert!(c.contains(&[5.0, 5.0, f64::from(z), 2.0, 0.0]), "z = {z}");
        }
        assert!(!c.contains(&[5.0, 5.0, 3.0, 1.0, 0.0]));
    }

    #[test]
    fn two_wildcards_with_three_axes() {
        let c = composite([square_at(-1, -1, 1), square_at(0, 0, 0)]);
        assert!(c.contains(&[5.0, 5.0, 7.0, 3.0, 1.0]));
        assert!(!c.contains(&[5.0, 5.0, 7.0, 3.0, 2.0]));
    }

    #[test]
    fn no_active_axes_tests_all_planes_shape() {
        let c = composite([square_at(-1, -1, -1)]);
        assert_eq!(c.dimensions(), 2);
        assert!(c.contains(&[1.0, 1.0]));
        assert!(!c.contains(&[11.0, 1.0]));
    }

    #[test]
    fn missing_coordinates_are_outside() {
        let c = composite([square_at(0, 0, -1)]);
        assert!(!c.contains(&[1.0, 1.0, 0.0]));
        assert!(c.contains(&[1.0, 1.0, 0.0, 0.0]));
        assert!(!c.contains(&[1.0, 1.0, f64::NAN, 0.0]));
    }

    #[test]
    fn boundary_agreement_and_bounds() {
        let mut open = square_at(1, -1, -1);
        open.set_boundary_type(BoundaryType::Open);
        let c = composite([square_at(0, -1, -1), open]);
        assert_eq!(c.boundary_type(), BoundaryType::Unspecified);
        assert_eq!(c.xy_bounds(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(c.operands().len(), 2);
    }
}
