// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Roibridge Region: local region predicates and their remote counterparts.
//!
//! Locally, an ROI is a predicate over real coordinates that may be combined
//! with set algebra, transformed, and placed on discrete planes. Remotely
//! (see [`roibridge_shape`]) it is a bag of plane-tagged shapes with no notion
//! of boundary inclusion or set algebra. This crate bridges the two:
//!
//! - **Local predicates** ([`Region`], [`Geometry`]): boxes, ellipses, lines,
//!   points, polygons, polylines and pixel masks, each tested under a
//!   [`BoundaryType`](roibridge_shape::BoundaryType), plus unions,
//!   intersections, differences, negation, affine transforms and plane
//!   placement.
//! - **Shape wrappers** ([`ShapeRegion`]): a remote shape bound to a local
//!   predicate. Edits on either side are synchronized explicitly, and every
//!   mutator writes through to the remote shape immediately.
//! - **Plane-indexed composites** ([`PlaneComposite`]): the union of the
//!   shapes of one ROI, tested at real-valued plane positions with wildcard
//!   planes and interpolation between neighboring planes.
//! - **Conversion** ([`adapter`]): exact, bidirectional conversion between
//!   regions and remote shapes, failing on anything the remote model cannot
//!   express.
//!
//! ## Example
//!
//! ```rust
//! use roibridge_region::{Region, adapter};
//! use roibridge_shape::BoundaryType;
//!
//! let region = Region::rect(10.0, 20.0, 5.0, 5.0, BoundaryType::Closed);
//! assert!(region.contains(&[15.0, 25.0]));
//!
//! let shape = adapter::to_remote(&region).unwrap();
//! assert_eq!(shape.text, "ij-bt:[C]");
//!
//! let (back, boundary) = adapter::from_remote(&shape).unwrap();
//! assert_eq!(back, region);
//! assert_eq!(boundary, BoundaryType::Closed);
//! ```
//!
//! Shapes on several planes form a [`PlaneComposite`]:
//!
//! ```rust
//! use roibridge_region::adapter;
//! use roibridge_shape::{PlaneCoordinate, RemoteRoi, RemoteShape, ShapeGeometry};
//!
//! let square = ShapeGeometry::Rectangle { x: 0.0, y: 0.0, width: 4.0, height: 4.0 };
//! let roi = RemoteRoi::from_shapes((0..3).map(|z| {
//!     RemoteShape::new(square.clone()).on_plane(PlaneCoordinate::new(z, -1, -1).unwrap())
//! }));
//! let composite = adapter::from_remote_roi(&roi).unwrap();
//! assert!(composite.contains(&[1.0, 1.0, 1.5]));
//! assert!(!composite.contains(&[1.0, 1.0, 3.0]));
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` (default) and `libm`
//! features are forwarded to Kurbo.

#![no_std]

extern crate alloc;

pub mod adapter;
mod composite;
mod geometry;
mod region;
mod shape_region;

pub use adapter::ConversionError;
pub use composite::PlaneComposite;
pub use geometry::{EDGE_TOLERANCE, Geometry, RasterMask};
pub use region::{Operator, Region, SimpleRegion};
pub use shape_region::ShapeRegion;
