// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Remote shapes as testable, mutable predicates.

use alloc::boxed::Box;

use kurbo::{Affine, Point, Rect, Vec2};

use roibridge_shape::{BoundaryType, PlaneCoordinate, RemoteShape, ShapeId};

use crate::adapter::{ConversionError, decode_geometry, encode_shape_geometry};
use crate::geometry::Geometry;
use crate::region::Region;

/// A remote shape bound to a local predicate.
///
/// The wrapper owns the [`RemoteShape`] together with its decoded
/// [`Geometry`] and boundary type. The two sides are kept equal explicitly:
/// [`sync_to_remote`](Self::sync_to_remote) writes the local side into the
/// shape and [`sync_from_remote`](Self::sync_from_remote) re-reads it. Every
/// mutator writes through immediately, so [`shape`](Self::shape) and
/// [`bounds`](Self::bounds) always reflect the latest edit.
///
/// Containment is tested in image space: when the shape carries a transform,
/// points are mapped into shape space first.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeRegion {
    shape: RemoteShape,
    geometry: Geometry,
    boundary: BoundaryType,
    to_source: Option<Affine>,
}

impl ShapeRegion {
    /// Binds `shape`, decoding its geometry, marker and transform.
    pub fn new(shape: RemoteShape) -> Result<Self, ConversionError> {
        let geometry = decode_geometry(&shape.geometry)?;
        let to_source = shape.transform.map(|t| t.to_source()).transpose()?;
        Ok(Self {
            boundary: shape.boundary_type(),
            shape,
            geometry,
            to_source,
        })
    }

    /// The bound shape.
    #[must_use]
    pub fn shape(&self) -> &RemoteShape {
        &self.shape
    }

    /// Local geometry.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Boundary type.
    #[must_use]
    pub fn boundary_type(&self) -> BoundaryType {
        self.boundary
    }

    /// Plane position of the shape.
    #[must_use]
    pub fn plane(&self) -> PlaneCoordinate {
        self.shape.plane
    }

    /// Server id of the shape.
    #[must_use]
    pub fn id(&self) -> Option<ShapeId> {
        self.shape.id
    }

    /// Tests an image-space point.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let p = self.to_source.map_or(p, |a| a * p);
        self.geometry.contains(p, self.boundary)
    }

    /// Image-space bounds of the current data.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let local = self.geometry.bounds()?;
        Some(match self.shape.transform {
            Some(t) => t.to_affine().transform_rect_bbox(local),
            None => local,
        })
    }

    /// Moves the shape by `delta` (in shape space).
    pub fn translate(&mut self, delta: Vec2) {
        self.geometry.translate(delta);
        self.sync_to_remote();
    }

    /// Moves vertex `index`; returns `false` when out of range.
    pub fn set_vertex(&mut self, index: usize, p: Point) -> bool {
        let moved = self.geometry.set_vertex(index, p);
        if moved {
            self.sync_to_remote();
        }
        moved
    }

    /// Moves the shape so that its bounds are centered on `center`.
    pub fn set_center(&mut self, center: Point) {
        if let Some(b) = self.geometry.bounds() {
            self.translate(center - b.center());
        }
    }

    /// Replaces the geometry, possibly changing the shape kind.
    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.geometry = geometry;
        self.sync_to_remote();
    }

    /// Moves the shape to another plane.
    pub fn set_plane(&mut self, plane: PlaneCoordinate) {
        self.shape.plane = plane;
    }

    /// Changes the boundary type; the shape text keeps its other contents.
    pub fn set_boundary_type(&mut self, boundary: BoundaryType) {
        self.boundary = boundary;
        self.sync_to_remote();
    }

    /// Writes the local geometry and boundary into the shape.
    pub fn sync_to_remote(&mut self) {
        self.shape.geometry = encode_shape_geometry(&self.geometry);
        self.shape.set_boundary_type(self.boundary);
    }

    /// Re-reads geometry, boundary and transform from the shape.
    ///
    /// On failure the wrapper is left unchanged.
    pub fn sync_from_remote(&mut self) -> Result<(), ConversionError> {
        let fresh = Self::new(self.shape.clone())?;
        *self = fresh;
        Ok(())
    }

    /// Replaces the bound shape and re-reads it.
    ///
    /// On failure the wrapper is left unchanged.
    pub fn replace_shape(&mut self, shape: RemoteShape) -> Result<(), ConversionError> {
        *self = Self::new(shape)?;
        Ok(())
    }

    /// Edits the bound shape in place and re-reads it.
    ///
    /// `f` may change any field, including geometry and transform. If the
    /// edited shape cannot be bound, the wrapper is left unchanged.
    pub fn edit_shape<R>(
        &mut self,
        f: impl FnOnce(&mut RemoteShape) -> R,
    ) -> Result<R, ConversionError> {
        let mut shape = self.shape.clone();
        let out = f(&mut shape);
        *self = Self::new(shape)?;
        Ok(out)
    }

    /// Unwraps the bound shape.
    #[must_use]
    pub fn into_shape(self) -> RemoteShape {
        self.shape
    }

    /// This shape positioned on its own plane in `(x, y, z, t, c)` space.
    #[must_use]
    pub fn project(&self) -> Region {
        Region::OnPlane {
            source: Box::new(Region::Shape(self.clone())),
            plane: self.plane(),
        }
    }
}
