// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Roibridge Shape: the remote side of ROI bridging.
//!
//! This crate models ROIs the way a multi-dimensional image server stores
//! them: discrete shapes with plain numeric fields, each tagged with a plane
//! position and optional affine transform, and grouped into ROIs.
//!
//! - **Plane coordinates** ([`PlaneCoordinate`]): `(z, t, c)` positions where
//!   `-1` means "every plane on that axis".
//! - **Geometry** ([`ShapeGeometry`], [`Bitmask`]): rectangle, ellipse, line,
//!   point, polygon, polyline, bit mask and text, stored field-for-field.
//! - **Transforms** ([`RemoteAffine`]): the remote shape-to-image matrix and
//!   its inverse relation to local to-source affines.
//! - **Boundary markers** ([`boundary`]): the boundary inclusion type encoded
//!   into a shape's free text, since the server has no field for it.
//! - **Shapes and ROIs** ([`RemoteShape`], [`RemoteRoi`]): shape equivalence
//!   and synchronization, and an ROI whose plane index stays consistent with
//!   its shapes through every change.
//!
//! ## Example
//!
//! ```rust
//! use roibridge_shape::{BoundaryType, PlaneCoordinate, RemoteRoi, RemoteShape, ShapeGeometry};
//!
//! let mut shape = RemoteShape::new(ShapeGeometry::Rectangle {
//!     x: 10.0,
//!     y: 10.0,
//!     width: 5.0,
//!     height: 5.0,
//! })
//! .with_text("nucleus")
//! .on_plane(PlaneCoordinate::new(2, 0, -1).unwrap());
//! shape.set_boundary_type(BoundaryType::Open);
//! assert_eq!(shape.text, "nucleus ij-bt:[O]");
//!
//! let mut roi = RemoteRoi::with_name("cell 1");
//! let key = roi.add_shape(shape);
//! assert_eq!(roi.shapes_on_plane(PlaneCoordinate::new(2, 0, -1).unwrap()), [key]);
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` (default) and `libm`
//! features are forwarded to Kurbo.

#![no_std]

extern crate alloc;

pub mod boundary;
mod geometry;
mod plane;
mod roi;
mod shape;
mod transform;

pub use boundary::BoundaryType;
pub use geometry::{Bitmask, ShapeGeometry, ShapeKind, points_bounds};
pub use plane::{Axis, PlaneCoordinate, PlaneError};
pub use roi::{RemoteRoi, RoiId, ShapeKey};
pub use shape::{RemoteShape, ShapeError, ShapeId};
pub use transform::{NotInvertible, RemoteAffine, invert};
