// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Remote shape geometry, stored field-for-field as the server keeps it.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Point, Rect};

/// Discriminant of a [`ShapeGeometry`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rectangle,
    /// Axis-aligned ellipse.
    Ellipse,
    /// Single line segment.
    Line,
    /// Single point.
    Point,
    /// Closed polygon.
    Polygon,
    /// Open polyline.
    Polyline,
    /// Packed 1-bit raster.
    Mask,
    /// Text label.
    Text,
}

impl ShapeKind {
    /// Whether shapes of this kind have a local region equivalent.
    ///
    /// Text labels are carried through the model but never converted.
    #[must_use]
    pub const fn is_convertible(self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Geometry of a remote shape.
///
/// All numbers are kept exactly as stored remotely; no normalization is
/// applied, so a rectangle is always origin plus size and never two corners.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeGeometry {
    /// Rectangle with top-left origin and extent.
    Rectangle {
        /// Origin x.
        x: f64,
        /// Origin y.
        y: f64,
        /// Extent along x.
        width: f64,
        /// Extent along y.
        height: f64,
    },
    /// Ellipse given by center and semi-axes.
    Ellipse {
        /// Center x.
        x: f64,
        /// Center y.
        y: f64,
        /// Semi-axis along x.
        radius_x: f64,
        /// Semi-axis along y.
        radius_y: f64,
    },
    /// Line segment.
    Line {
        /// Start x.
        x1: f64,
        /// Start y.
        y1: f64,
        /// End x.
        x2: f64,
        /// End y.
        y2: f64,
    },
    /// Point.
    Point {
        /// Position x.
        x: f64,
        /// Position y.
        y: f64,
    },
    /// Closed polygon; the closing edge is implicit.
    Polygon {
        /// Vertices in order.
        points: Vec<Point>,
    },
    /// Open polyline.
    Polyline {
        /// Vertices in order.
        points: Vec<Point>,
    },
    /// Bit mask.
    Mask(Bitmask),
    /// Text label anchored at a point.
    Text {
        /// Anchor x.
        x: f64,
        /// Anchor y.
        y: f64,
        /// Label contents.
        value: String,
    },
}

impl ShapeGeometry {
    /// The kind of this geometry.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Ellipse { .. } => ShapeKind::Ellipse,
            Self::Line { .. } => ShapeKind::Line,
            Self::Point { .. } => ShapeKind::Point,
            Self::Polygon { .. } => ShapeKind::Polygon,
            Self::Polyline { .. } => ShapeKind::Polyline,
            Self::Mask(_) => ShapeKind::Mask,
            Self::Text { .. } => ShapeKind::Text,
        }
    }

    /// Axis-aligned bounds in shape coordinates (before any transform).
    ///
    /// Returns `None` for vertex lists without vertices.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Rectangle {
                x,
                y,
                width,
                height,
            } => Some(Rect::new(*x, *y, x + width, y + height)),
            Self::Ellipse {
                x,
                y,
                radius_x,
                radius_y,
            } => Some(Rect::new(
                x - radius_x,
                y - radius_y,
                x + radius_x,
                y + radius_y,
            )),
            Self::Line { x1, y1, x2, y2 } => Some(Rect::new(*x1, *y1, *x2, *y2).abs()),
            Self::Point { x, y } | Self::Text { x, y, .. } => Some(Rect::new(*x, *y, *x, *y)),
            Self::Polygon { points } | Self::Polyline { points } => points_bounds(points),
            Self::Mask(mask) => Some(mask.bounds()),
        }
    }
}

/// Bounds of a vertex list, or `None` when empty.
#[must_use]
pub fn points_bounds(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Packed 1-bit raster positioned in image space.
///
/// Bits are stored row-major, most significant bit first: bit `i` lives in
/// byte `i / 8` under mask `0x80 >> (i % 8)`. The extent is kept as the
/// floating-point values stored remotely.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmask {
    /// Origin x.
    pub x: f64,
    /// Origin y.
    pub y: f64,
    /// Extent along x, in pixels.
    pub width: f64,
    /// Extent along y, in pixels.
    pub height: f64,
    /// Packed bits.
    pub bits: Vec<u8>,
}

impl Bitmask {
    /// Creates an all-clear mask with `columns x rows` pixels at `(x, y)`.
    #[must_use]
    pub fn new(x: f64, y: f64, columns: u32, rows: u32) -> Self {
        let len = columns as usize * rows as usize;
        Self {
            x,
            y,
            width: f64::from(columns),
            height: f64::from(rows),
            bits: vec![0; len.div_ceil(8)],
        }
    }

    /// Creates a mask whose pixel `(col, row)` is set when `f(col, row)` holds.
    #[must_use]
    pub fn from_fn(
        x: f64,
        y: f64,
        columns: u32,
        rows: u32,
        mut f: impl FnMut(u32, u32) -> bool,
    ) -> Self {
        let mut mask = Self::new(x, y, columns, rows);
        for row in 0..rows {
            for col in 0..columns {
                if f(col, row) {
                    mask.set(row as usize * columns as usize + col as usize, true);
                }
            }
        }
        mask
    }

    /// Reads bit `index`; out-of-range reads are `false`.
    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        self.bits
            .get(index / 8)
            .is_some_and(|b| b & (0x80 >> (index % 8)) != 0)
    }

    /// Writes bit `index`, growing the buffer if needed.
    pub fn set(&mut self, index: usize, value: bool) {
        let byte = index / 8;
        if byte >= self.bits.len() {
            self.bits.resize(byte + 1, 0);
        }
        let bit = 0x80 >> (index % 8);
        if value {
            self.bits[byte] |= bit;
        } else {
            self.bits[byte] &= !bit;
        }
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }

    /// Image-space bounds.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}
