// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Plane coordinates: the discrete Z/T/C position of a remote shape.

use core::fmt;

/// One of the three discrete (non-spatial) axes of a remote image.
///
/// The declaration order is the priority order used everywhere axes are
/// enumerated: Z, then T, then C.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    /// Focal plane.
    Z,
    /// Timepoint.
    T,
    /// Channel.
    C,
}

impl Axis {
    /// All axes in priority order.
    pub const ALL: [Self; 3] = [Self::Z, Self::T, Self::C];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Z => "Z",
            Self::T => "T",
            Self::C => "C",
        };
        f.write_str(name)
    }
}

/// Error returned when a plane component is below the wildcard value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlaneError {
    /// A component was smaller than [`PlaneCoordinate::WILDCARD`].
    #[error("invalid {axis} position {value}: must be >= -1")]
    InvalidPosition {
        /// The offending axis.
        axis: Axis,
        /// The rejected value.
        value: i32,
    },
}

/// Discrete position `(z, t, c)` of a shape.
///
/// Each component is either a non-negative index or [`WILDCARD`](Self::WILDCARD),
/// meaning "every plane on that axis". Coordinates order lexicographically by
/// `(z, t, c)`, which keeps plane indexes deterministic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlaneCoordinate {
    z: i32,
    t: i32,
    c: i32,
}

impl Default for PlaneCoordinate {
    fn default() -> Self {
        Self::ALL
    }
}

impl PlaneCoordinate {
    /// Component value meaning "unspecified: applies to every plane".
    pub const WILDCARD: i32 = -1;

    /// The all-wildcard coordinate.
    pub const ALL: Self = Self {
        z: Self::WILDCARD,
        t: Self::WILDCARD,
        c: Self::WILDCARD,
    };

    /// Creates a plane coordinate, validating every component.
    pub fn new(z: i32, t: i32, c: i32) -> Result<Self, PlaneError> {
        check(Axis::Z, z)?;
        check(Axis::T, t)?;
        check(Axis::C, c)?;
        Ok(Self { z, t, c })
    }

    /// Focal plane index, or `-1`.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.z
    }

    /// Timepoint index, or `-1`.
    #[must_use]
    pub const fn t(self) -> i32 {
        self.t
    }

    /// Channel index, or `-1`.
    #[must_use]
    pub const fn c(self) -> i32 {
        self.c
    }

    /// Component on `axis`.
    #[must_use]
    pub const fn get(self, axis: Axis) -> i32 {
        match axis {
            Axis::Z => self.z,
            Axis::T => self.t,
            Axis::C => self.c,
        }
    }

    /// Returns a copy with `axis` replaced by `value`.
    pub fn with(self, axis: Axis, value: i32) -> Result<Self, PlaneError> {
        check(axis, value)?;
        Ok(self.with_unchecked(axis, value))
    }

    /// Returns a copy with `axis` set to the wildcard.
    #[must_use]
    pub const fn relaxed(self, axis: Axis) -> Self {
        self.with_unchecked(axis, Self::WILDCARD)
    }

    const fn with_unchecked(mut self, axis: Axis, value: i32) -> Self {
        match axis {
            Axis::Z => self.z = value,
            Axis::T => self.t = value,
            Axis::C => self.c = value,
        }
        self
    }

    /// Whether `axis` holds the wildcard.
    #[must_use]
    pub const fn is_wildcard(self, axis: Axis) -> bool {
        self.get(axis) == Self::WILDCARD
    }

    /// Whether every axis holds the wildcard.
    #[must_use]
    pub const fn is_all(self) -> bool {
        self.z == Self::WILDCARD && self.t == Self::WILDCARD && self.c == Self::WILDCARD
    }

    /// Axes carrying a concrete index, in priority order.
    pub fn specified_axes(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |a| !self.is_wildcard(*a))
    }

    /// Whether this coordinate applies to the concrete plane `(z, t, c)`.
    ///
    /// A wildcard component matches any value on its axis.
    #[must_use]
    pub fn matches(self, z: i32, t: i32, c: i32) -> bool {
        let m = |own: i32, other: i32| own == Self::WILDCARD || own == other;
        m(self.z, z) && m(self.t, t) && m(self.c, c)
    }
}

impl fmt::Display for PlaneCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(z={}, t={}, c={})", self.z, self.t, self.c)
    }
}

fn check(axis: Axis, value: i32) -> Result<(), PlaneError> {
    if value < PlaneCoordinate::WILDCARD {
        Err(PlaneError::InvalidPosition { axis, value })
    } else {
        Ok(())
    }
}
