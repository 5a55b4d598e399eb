// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Local 2D geometry and boundary-aware containment.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Line, ParamCurveNearest, Point, Rect, Size, Vec2};

use roibridge_shape::{BoundaryType, points_bounds};

/// Distance within which a point counts as lying on an edge, segment or point.
pub const EDGE_TOLERANCE: f64 = 1e-10;

/// Local 2D geometry of a region predicate.
///
/// Variants mirror the convertible remote shape kinds one to one, and keep
/// their numbers in the same form (a box is origin plus size), so conversion
/// in either direction never changes a value.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box.
    Box {
        /// Minimum corner.
        origin: Point,
        /// Extent.
        size: Size,
    },
    /// Axis-aligned ellipse.
    Ellipse {
        /// Center.
        center: Point,
        /// Semi-axes.
        radii: Vec2,
    },
    /// Line segment (zero area).
    Line(Line),
    /// Single point (zero area).
    Point(Point),
    /// Closed polygon; the closing edge is implicit.
    Polygon(Vec<Point>),
    /// Open polyline (zero area).
    Polyline(Vec<Point>),
    /// Pixel mask.
    Mask(RasterMask),
}

impl Geometry {
    /// Box from origin and size.
    #[must_use]
    pub fn new_box(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::Box {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Ellipse from center and semi-axes.
    #[must_use]
    pub fn new_ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        Self::Ellipse {
            center: Point::new(cx, cy),
            radii: Vec2::new(rx, ry),
        }
    }

    /// Tests `p` against this geometry under `boundary`.
    ///
    /// | Geometry | Closed | Open | Unspecified |
    /// |----------|--------|------|-------------|
    /// | Box | `min <= p <= max` | `min < p < max` | `min <= p < max` |
    /// | Ellipse | implicit `<= 1` | implicit `< 1` | implicit `<= 1` |
    /// | Polygon | edges inside | edges outside | crossing rule only |
    /// | Line, polyline, point | on the set | empty | on the set |
    /// | Mask | pixel lookup | pixel lookup | pixel lookup |
    #[must_use]
    pub fn contains(&self, p: Point, boundary: BoundaryType) -> bool {
        match self {
            Self::Box { origin, size } => {
                let r = Rect::from_origin_size(*origin, *size).abs();
                box_contains(r, p, boundary)
            }
            Self::Ellipse { center, radii } => {
                let dx = (p.x - center.x) / radii.x;
                let dy = (p.y - center.y) / radii.y;
                let v = dx * dx + dy * dy;
                match boundary {
                    BoundaryType::Open => v < 1.0,
                    BoundaryType::Closed | BoundaryType::Unspecified => v <= 1.0,
                }
            }
            Self::Polygon(points) => polygon_contains(points, p, boundary),
            Self::Line(line) => boundary != BoundaryType::Open && near_segment(*line, p),
            Self::Point(q) => {
                boundary != BoundaryType::Open
                    && (p - *q).hypot2() <= EDGE_TOLERANCE * EDGE_TOLERANCE
            }
            Self::Polyline(points) => {
                boundary != BoundaryType::Open && polyline_contains(points, p)
            }
            Self::Mask(mask) => mask.contains(p),
        }
    }

    /// Axis-aligned bounds, or `None` for an empty vertex list.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Self::Box { origin, size } => Some(Rect::from_origin_size(*origin, *size).abs()),
            Self::Ellipse { center, radii } => Some(Rect::new(
                center.x - radii.x,
                center.y - radii.y,
                center.x + radii.x,
                center.y + radii.y,
            )),
            Self::Line(line) => Some(Rect::from_points(line.p0, line.p1)),
            Self::Point(p) => Some(Rect::from_points(*p, *p)),
            Self::Polygon(points) | Self::Polyline(points) => points_bounds(points),
            Self::Mask(mask) => Some(mask.bounds()),
        }
    }

    /// Moves the geometry by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Self::Box { origin, .. } => *origin += delta,
            Self::Ellipse { center, .. } => *center += delta,
            Self::Line(line) => {
                line.p0 += delta;
                line.p1 += delta;
            }
            Self::Point(p) => *p += delta,
            Self::Polygon(points) | Self::Polyline(points) => {
                for p in points {
                    *p += delta;
                }
            }
            Self::Mask(mask) => mask.origin += delta,
        }
    }

    /// Number of editable vertices.
    ///
    /// Boxes expose their origin, ellipses their center, lines both ends.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Box { .. } | Self::Ellipse { .. } | Self::Point(_) | Self::Mask(_) => 1,
            Self::Line(_) => 2,
            Self::Polygon(points) | Self::Polyline(points) => points.len(),
        }
    }

    /// Moves vertex `index` to `p`; returns `false` when out of range.
    pub fn set_vertex(&mut self, index: usize, p: Point) -> bool {
        match (self, index) {
            (Self::Box { origin, .. }, 0) => *origin = p,
            (Self::Ellipse { center, .. }, 0) => *center = p,
            (Self::Point(q), 0) => *q = p,
            (Self::Mask(mask), 0) => mask.origin = p,
            (Self::Line(line), 0) => line.p0 = p,
            (Self::Line(line), 1) => line.p1 = p,
            (Self::Polygon(points) | Self::Polyline(points), i) => match points.get_mut(i) {
                Some(q) => *q = p,
                None => return false,
            },
            _ => return false,
        }
        true
    }
}

fn box_contains(r: Rect, p: Point, boundary: BoundaryType) -> bool {
    match boundary {
        BoundaryType::Closed => r.x0 <= p.x && p.x <= r.x1 && r.y0 <= p.y && p.y <= r.y1,
        BoundaryType::Open => r.x0 < p.x && p.x < r.x1 && r.y0 < p.y && p.y < r.y1,
        BoundaryType::Unspecified => r.x0 <= p.x && p.x < r.x1 && r.y0 <= p.y && p.y < r.y1,
    }
}

fn near_segment(line: Line, p: Point) -> bool {
    line.nearest(p, 0.).distance_sq <= EDGE_TOLERANCE * EDGE_TOLERANCE
}

fn edges(points: &[Point]) -> impl Iterator<Item = Line> + '_ {
    let n = points.len();
    (0..n).map(move |i| Line::new(points[i], points[(i + 1) % n]))
}

fn polygon_contains(points: &[Point], p: Point, boundary: BoundaryType) -> bool {
    if boundary != BoundaryType::Unspecified && edges(points).any(|e| near_segment(e, p)) {
        return boundary == BoundaryType::Closed;
    }
    // Even-odd crossing count.
    let mut inside = false;
    for e in edges(points) {
        let (a, b) = (e.p0, e.p1);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

fn polyline_contains(points: &[Point], p: Point) -> bool {
    match points {
        [] => false,
        [q] => (p - *q).hypot2() <= EDGE_TOLERANCE * EDGE_TOLERANCE,
        _ => points
            .windows(2)
            .any(|w| near_segment(Line::new(w[0], w[1]), p)),
    }
}

/// Pixel mask with an integral extent, positioned in image space.
///
/// Bits are row-major, most significant bit first, matching the remote
/// packing so the buffer is carried over unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterMask {
    /// Image-space position of pixel `(0, 0)`.
    pub origin: Point,
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
    /// Packed bits.
    pub bits: Vec<u8>,
}

impl RasterMask {
    /// Creates an all-clear mask.
    #[must_use]
    pub fn new(origin: Point, width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            origin,
            width,
            height,
            bits: vec![0; len.div_ceil(8)],
        }
    }

    /// Whether pixel `(col, row)` is set; out-of-range pixels are clear.
    #[must_use]
    pub fn pixel(&self, col: u32, row: u32) -> bool {
        if col >= self.width || row >= self.height {
            return false;
        }
        let i = row as usize * self.width as usize + col as usize;
        self.bits
            .get(i / 8)
            .is_some_and(|b| b & (0x80 >> (i % 8)) != 0)
    }

    /// Sets pixel `(col, row)`; out-of-range writes are ignored.
    pub fn set_pixel(&mut self, col: u32, row: u32, value: bool) {
        if col >= self.width || row >= self.height {
            return;
        }
        let i = row as usize * self.width as usize + col as usize;
        let Some(byte) = self.bits.get_mut(i / 8) else {
            return;
        };
        let bit = 0x80 >> (i % 8);
        if value {
            *byte |= bit;
        } else {
            *byte &= !bit;
        }
    }

    /// Tests an image-space point.
    ///
    /// The point and the origin are rounded to the nearest pixel before the
    /// lookup.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let col = p.x.round() - self.origin.x.round();
        let row = p.y.round() - self.origin.y.round();
        if !(col >= 0.0 && row >= 0.0 && col < f64::from(self.width) && row < f64::from(self.height))
        {
            return false;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "col and row are integral and within the u32 extent"
        )]
        let (col, row) = (col as u32, row as u32);
        self.pixel(col, row)
    }

    /// Image-space bounds.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(
            self.origin,
            Size::new(f64::from(self.width), f64::from(self.height)),
        )
    }
}
