// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The remote affine transform and its relation to local "to-source" affines.

use kurbo::Affine;

/// Smallest determinant magnitude accepted as invertible.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Error returned when a transform cannot be inverted.
#[derive(Copy, Clone, Debug, PartialEq, thiserror::Error)]
#[error("affine transform is not invertible (determinant {determinant})")]
pub struct NotInvertible {
    /// Determinant of the rejected linear part.
    pub determinant: f64,
}

/// Affine transform attached to a remote shape.
///
/// The remote convention maps shape coordinates *to* canonical image space:
///
/// ```text
/// x' = a00 * x + a01 * y + a02
/// y' = a10 * x + a11 * y + a12
/// ```
///
/// Local regions store the opposite direction (a "to-source" affine that maps
/// image space back into the source region), so conversion between the two is
/// always an inversion. See [`RemoteAffine::to_source`] and
/// [`RemoteAffine::from_to_source`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RemoteAffine {
    /// Row 0, column 0.
    pub a00: f64,
    /// Row 0, column 1.
    pub a01: f64,
    /// Row 0, column 2 (x translation).
    pub a02: f64,
    /// Row 1, column 0.
    pub a10: f64,
    /// Row 1, column 1.
    pub a11: f64,
    /// Row 1, column 2 (y translation).
    pub a12: f64,
}

impl Default for RemoteAffine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RemoteAffine {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        a00: 1.0,
        a01: 0.0,
        a02: 0.0,
        a10: 0.0,
        a11: 1.0,
        a12: 0.0,
    };

    /// Reads the remote matrix as a kurbo affine (same direction).
    #[must_use]
    pub fn to_affine(self) -> Affine {
        Affine::new([self.a00, self.a10, self.a01, self.a11, self.a02, self.a12])
    }

    /// Builds a remote matrix from a kurbo affine (same direction).
    #[must_use]
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        Self {
            a00: a,
            a01: c,
            a02: e,
            a10: b,
            a11: d,
            a12: f,
        }
    }

    /// Determinant of the linear part.
    #[must_use]
    pub fn determinant(self) -> f64 {
        self.a00 * self.a11 - self.a01 * self.a10
    }

    /// The local to-source affine: the inverse of this matrix.
    pub fn to_source(self) -> Result<Affine, NotInvertible> {
        invert(self.to_affine())
    }

    /// Builds the remote matrix for a local to-source affine by inverting it.
    pub fn from_to_source(to_source: Affine) -> Result<Self, NotInvertible> {
        invert(to_source).map(Self::from_affine)
    }
}

/// Inverts `affine`, rejecting (near) singular matrices.
pub fn invert(affine: Affine) -> Result<Affine, NotInvertible> {
    let determinant = affine.determinant();
    if !determinant.is_finite() || determinant.abs() < SINGULAR_EPSILON {
        return Err(NotInvertible { determinant });
    }
    Ok(affine.inverse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Vec2};

    #[test]
    fn coefficient_mapping_matches_remote_convention() {
        let remote = RemoteAffine {
            a00: 2.0,
            a01: 0.5,
            a02: 10.0,
            a10: 0.0,
            a11: 3.0,
            a12: -4.0,
        };
        let p = remote.to_affine() * Point::new(1.0, 2.0);
        assert_eq!(p, Point::new(2.0 + 1.0 + 10.0, 6.0 - 4.0));
        assert_eq!(RemoteAffine::from_affine(remote.to_affine()), remote);
    }

    #[test]
    fn to_source_is_the_inverse() {
        let local = Affine::translate(Vec2::new(5.0, -2.0)) * Affine::scale(2.0);
        let remote = RemoteAffine::from_to_source(local).unwrap();
        let p = Point::new(3.0, 4.0);
        let there = remote.to_affine() * (local * p);
        assert!((there - p).hypot() < 1e-12);
        let back = remote.to_source().unwrap();
        assert!((back * p - local * p).hypot() < 1e-12);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let flat = Affine::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert!(RemoteAffine::from_to_source(flat).is_err());
        assert_eq!(RemoteAffine::IDENTITY.determinant(), 1.0);
    }
}
