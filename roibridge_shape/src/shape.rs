// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single remote shape.

use alloc::string::String;
use core::fmt;

use kurbo::Rect;

use crate::boundary::{self, BoundaryType};
use crate::geometry::{ShapeGeometry, ShapeKind};
use crate::plane::PlaneCoordinate;
use crate::transform::RemoteAffine;

/// Server-assigned identifier of a shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape:{}", self.0)
    }
}

/// Errors raised by shape and ROI model operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ShapeError {
    /// Synchronization between shapes of different kinds.
    #[error("cannot synchronize a {target} shape from a {source_kind} shape")]
    KindMismatch {
        /// Kind of the shape being updated.
        target: ShapeKind,
        /// Kind of the shape providing the data.
        source_kind: ShapeKind,
    },
    /// A local shape has no equivalent among the saved shapes.
    #[error("no saved shape is equivalent to local shape at position {position}")]
    MissingShape {
        /// Position of the unmatched shape in the local ROI.
        position: usize,
    },
}

/// One shape as stored on the server.
///
/// The `text` field is free text owned by users; the boundary type is carried
/// inside it as a marker (see [`boundary`](crate::boundary)).
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteShape {
    /// Server id; `None` until persisted.
    pub id: Option<ShapeId>,
    /// Geometry fields.
    pub geometry: ShapeGeometry,
    /// Discrete plane position.
    pub plane: PlaneCoordinate,
    /// Optional shape-to-image transform.
    pub transform: Option<RemoteAffine>,
    /// Free text, including the boundary marker.
    pub text: String,
}

impl RemoteShape {
    /// Creates an unpersisted shape on all planes with empty text.
    #[must_use]
    pub fn new(geometry: ShapeGeometry) -> Self {
        Self {
            id: None,
            geometry,
            plane: PlaneCoordinate::ALL,
            transform: None,
            text: String::new(),
        }
    }

    /// Sets the plane.
    #[must_use]
    pub fn on_plane(mut self, plane: PlaneCoordinate) -> Self {
        self.plane = plane;
        self
    }

    /// Sets the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: RemoteAffine) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: ShapeId) -> Self {
        self.id = Some(id);
        self
    }

    /// Kind of the geometry.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    /// Whether the server has assigned an id.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Boundary type decoded from the text marker.
    #[must_use]
    pub fn boundary_type(&self) -> BoundaryType {
        boundary::boundary_type_of(&self.text)
    }

    /// Merges `boundary` into the text marker.
    pub fn set_boundary_type(&mut self, boundary: BoundaryType) {
        self.text = boundary::merge(&self.text, boundary);
    }

    /// Image-space bounds, taking the transform into account.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        let local = self.geometry.bounds()?;
        Some(match self.transform {
            Some(t) => t.to_affine().transform_rect_bbox(local),
            None => local,
        })
    }

    /// Whether `other` describes the same shape.
    ///
    /// Compares kind, plane, text and every geometry field exactly. Ids and
    /// transforms are ignored, so a freshly converted shape is equivalent to
    /// the saved copy the server returned for it.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        self.plane == other.plane && self.text == other.text && self.geometry == other.geometry
    }

    /// Copies everything but the id from `updated`.
    ///
    /// Fails without modifying `self` when the kinds differ.
    pub fn synchronize_from(&mut self, updated: &Self) -> Result<(), ShapeError> {
        if self.kind() != updated.kind() {
            return Err(ShapeError::KindMismatch {
                target: self.kind(),
                source_kind: updated.kind(),
            });
        }
        self.geometry.clone_from(&updated.geometry);
        self.plane = updated.plane;
        self.transform = updated.transform;
        self.text.clone_from(&updated.text);
        Ok(())
    }
}
