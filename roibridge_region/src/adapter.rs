// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion between local regions and remote shapes.
//!
//! Dispatch is a plain match on the geometry or region variant. Every
//! numeric field is copied as-is in both directions, so a region converted to
//! a shape and back compares equal to the original. Anything the remote
//! model cannot express exactly is rejected with a [`ConversionError`].

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Line, Point};

use roibridge_shape::{
    Bitmask, BoundaryType, NotInvertible, PlaneCoordinate, RemoteAffine, RemoteRoi, RemoteShape,
    ShapeGeometry, ShapeKind, boundary, invert,
};

use crate::composite::PlaneComposite;
use crate::geometry::{Geometry, RasterMask};
use crate::region::{Operator, Region};
use crate::shape_region::ShapeRegion;

/// Errors raised when a region or shape has no exact counterpart.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// The shape kind has no local equivalent.
    #[error("{0} shapes cannot be converted")]
    UnsupportedKind(ShapeKind),
    /// The remote model only stores unions.
    #[error("{0} has no remote equivalent; only unions can be stored")]
    UnsupportedOperator(Operator),
    /// A union contains a composite with a different operator.
    #[error("a union nests a {0}; only flat unions can be stored")]
    MixedOperators(Operator),
    /// A single shape was requested from a region made of several.
    #[error("region consists of {count} shapes, expected exactly one")]
    MultipleShapes {
        /// Number of shapes the region consists of.
        count: usize,
    },
    /// A multi-plane predicate was submitted where one 2D shape is needed.
    #[error("expected a 2D region, found {found} dimensions")]
    Dimensionality {
        /// Dimensions of the submitted region.
        found: usize,
    },
    /// A transform could not be inverted.
    #[error(transparent)]
    NotInvertible(#[from] NotInvertible),
    /// A mask's extent or buffer is inconsistent.
    #[error("invalid mask {width}x{height}: {reason}")]
    InvalidMask {
        /// Stored width.
        width: f64,
        /// Stored height.
        height: f64,
        /// What is wrong.
        reason: &'static str,
    },
}

/// Converts local geometry and a boundary type into remote fields and text.
///
/// The returned text is the bare boundary marker.
#[must_use]
pub fn encode_geometry(geometry: &Geometry, boundary: BoundaryType) -> (ShapeGeometry, String) {
    (
        encode_shape_geometry(geometry),
        boundary::encode(boundary).to_owned(),
    )
}

/// Converts local geometry into remote fields.
#[must_use]
pub fn encode_shape_geometry(geometry: &Geometry) -> ShapeGeometry {
    match geometry {
        Geometry::Box { origin, size } => ShapeGeometry::Rectangle {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        },
        Geometry::Ellipse { center, radii } => ShapeGeometry::Ellipse {
            x: center.x,
            y: center.y,
            radius_x: radii.x,
            radius_y: radii.y,
        },
        Geometry::Line(line) => ShapeGeometry::Line {
            x1: line.p0.x,
            y1: line.p0.y,
            x2: line.p1.x,
            y2: line.p1.y,
        },
        Geometry::Point(p) => ShapeGeometry::Point { x: p.x, y: p.y },
        Geometry::Polygon(points) => ShapeGeometry::Polygon {
            points: points.clone(),
        },
        Geometry::Polyline(points) => ShapeGeometry::Polyline {
            points: points.clone(),
        },
        Geometry::Mask(mask) => ShapeGeometry::Mask(Bitmask {
            x: mask.origin.x,
            y: mask.origin.y,
            width: f64::from(mask.width),
            height: f64::from(mask.height),
            bits: mask.bits.clone(),
        }),
    }
}

/// Converts remote fields into local geometry.
pub fn decode_geometry(geometry: &ShapeGeometry) -> Result<Geometry, ConversionError> {
    Ok(match geometry {
        ShapeGeometry::Rectangle {
            x,
            y,
            width,
            height,
        } => Geometry::new_box(*x, *y, *width, *height),
        ShapeGeometry::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
        } => Geometry::new_ellipse(*x, *y, *radius_x, *radius_y),
        ShapeGeometry::Line { x1, y1, x2, y2 } => {
            Geometry::Line(Line::new(Point::new(*x1, *y1), Point::new(*x2, *y2)))
        }
        ShapeGeometry::Point { x, y } => Geometry::Point(Point::new(*x, *y)),
        ShapeGeometry::Polygon { points } => Geometry::Polygon(points.clone()),
        ShapeGeometry::Polyline { points } => Geometry::Polyline(points.clone()),
        ShapeGeometry::Mask(mask) => Geometry::Mask(decode_mask(mask)?),
        ShapeGeometry::Text { .. } => return Err(ConversionError::UnsupportedKind(ShapeKind::Text)),
    })
}

fn decode_mask(mask: &Bitmask) -> Result<RasterMask, ConversionError> {
    let invalid = |reason| ConversionError::InvalidMask {
        width: mask.width,
        height: mask.height,
        reason,
    };
    let width = pixel_extent(mask.width).ok_or_else(|| invalid("extent is not a whole pixel count"))?;
    let height =
        pixel_extent(mask.height).ok_or_else(|| invalid("extent is not a whole pixel count"))?;
    let needed = (width as usize * height as usize).div_ceil(8);
    if mask.bits.len() < needed {
        return Err(invalid("bit buffer is shorter than the extent"));
    }
    Ok(RasterMask {
        origin: Point::new(mask.x, mask.y),
        width,
        height,
        bits: mask.bits.clone(),
    })
}

fn pixel_extent(v: f64) -> Option<u32> {
    if v >= 0.0 && v <= f64::from(u32::MAX) && v.floor() == v {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "v is integral and within u32 range"
        )]
        let n = v as u32;
        Some(n)
    } else {
        None
    }
}

/// Transform and plane pushed down onto the shapes of a region.
#[derive(Copy, Clone)]
struct Placement {
    to_image: Option<Affine>,
    plane: Option<PlaneCoordinate>,
}

impl Placement {
    const NONE: Self = Self {
        to_image: None,
        plane: None,
    };

    fn transformed(self, to_source: Affine) -> Result<Self, ConversionError> {
        let outer = invert(to_source)?;
        Ok(Self {
            to_image: Some(self.to_image.map_or(outer, |a| a * outer)),
            ..self
        })
    }

    fn apply(self, mut shape: RemoteShape) -> RemoteShape {
        if let Some(outer) = self.to_image {
            let inner = shape.transform.map_or(Affine::IDENTITY, RemoteAffine::to_affine);
            shape.transform = Some(RemoteAffine::from_affine(outer * inner));
        }
        if let Some(plane) = self.plane {
            shape.plane = plane;
        }
        shape
    }
}

/// Converts a region into a single remote shape.
///
/// - Simple regions get a fresh marker as text.
/// - Wrapped shapes keep their text; the marker is merged into it.
/// - Transforms compose with any inner transform and are stored inverted.
/// - Plane-positioned regions set the shape plane.
/// - A union of exactly one operand converts that operand.
pub fn to_remote(region: &Region) -> Result<RemoteShape, ConversionError> {
    let mut shapes = to_remote_shapes(region)?;
    match shapes.len() {
        1 => Ok(shapes.remove(0)),
        count => match region {
            Region::Planes(c) if c.dimensions() > 2 => Err(ConversionError::Dimensionality {
                found: c.dimensions(),
            }),
            _ => Err(ConversionError::MultipleShapes { count }),
        },
    }
}

/// Converts a region into the shapes of one remote ROI.
///
/// Unions (including plane-indexed composites) are flattened, and enclosing
/// transforms and plane positions are pushed down onto every member.
pub fn to_remote_shapes(region: &Region) -> Result<Vec<RemoteShape>, ConversionError> {
    let mut out = Vec::new();
    collect(region, Placement::NONE, false, &mut out)?;
    Ok(out)
}

fn collect(
    region: &Region,
    placement: Placement,
    in_union: bool,
    out: &mut Vec<RemoteShape>,
) -> Result<(), ConversionError> {
    match region {
        Region::Simple(s) => {
            let (geometry, text) = encode_geometry(&s.geometry, s.boundary);
            out.push(placement.apply(RemoteShape::new(geometry).with_text(text)));
        }
        Region::Shape(s) => {
            let mut shape = s.shape().clone();
            shape.set_boundary_type(s.boundary_type());
            out.push(placement.apply(shape));
        }
        Region::Transformed { source, to_source } => {
            collect(source, placement.transformed(*to_source)?, in_union, out)?;
        }
        Region::OnPlane { source, plane } => {
            let placement = Placement {
                plane: Some(*plane),
                ..placement
            };
            collect(source, placement, in_union, out)?;
        }
        Region::Composite {
            operator: Operator::Or,
            operands,
        } => {
            for r in operands {
                collect(r, placement, true, out)?;
            }
        }
        Region::Composite { operator, .. } if in_union => {
            return Err(ConversionError::MixedOperators(*operator));
        }
        Region::Composite { operator, .. } => {
            return Err(ConversionError::UnsupportedOperator(*operator));
        }
        Region::Planes(c) => {
            for m in c.operands() {
                collect(&Region::Shape(m.clone()), placement, true, out)?;
            }
        }
    }
    Ok(())
}

/// Converts a region into a new, unpersisted remote ROI.
pub fn to_remote_roi(region: &Region) -> Result<RemoteRoi, ConversionError> {
    let mut roi = RemoteRoi::from_shapes(to_remote_shapes(region)?);
    if let Region::Planes(c) = region {
        roi.id = c.roi_id();
    }
    Ok(roi)
}

/// Converts a remote shape into a local region and its boundary type.
///
/// A shape transform becomes [`Region::Transformed`] with the inverted
/// matrix; a plane other than all-wildcard becomes [`Region::OnPlane`].
pub fn from_remote(shape: &RemoteShape) -> Result<(Region, BoundaryType), ConversionError> {
    let boundary = shape.boundary_type();
    let mut region = Region::simple(decode_geometry(&shape.geometry)?, boundary);
    if let Some(t) = shape.transform {
        region = region.transform(t.to_source()?);
    }
    if !shape.plane.is_all() {
        region = region.on_plane(shape.plane);
    }
    Ok((region, boundary))
}

/// Wraps every shape of a remote ROI into a plane-indexed composite.
pub fn from_remote_roi(roi: &RemoteRoi) -> Result<PlaneComposite, ConversionError> {
    PlaneComposite::from_roi(roi)
}

/// Binds a remote shape to a mutable predicate.
pub fn wrap(shape: RemoteShape) -> Result<ShapeRegion, ConversionError> {
    ShapeRegion::new(shape)
}
