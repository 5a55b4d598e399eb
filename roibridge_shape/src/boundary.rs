// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Boundary inclusion semantics and their text encoding.
//!
//! Remote shapes have no notion of whether their edge belongs to the region,
//! so the boundary type travels as a marker inside the shape's free text:
//!
//! | Boundary | Marker |
//! |----------|--------|
//! | Closed | `ij-bt:[C]` |
//! | Open | `ij-bt:[O]` |
//! | Unspecified | `ij-bt:[U]` |
//!
//! Text without a marker decodes as [`BoundaryType::Closed`]. Merging a marker
//! into existing text never touches the surrounding text.

use alloc::borrow::ToOwned;
use alloc::format;
use alloc::string::String;

/// Whether boundary points belong to a region.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum BoundaryType {
    /// Boundary points are inside.
    #[default]
    Closed,
    /// Boundary points are outside.
    Open,
    /// Boundary membership is undefined; predicates pick a convention.
    Unspecified,
}

impl BoundaryType {
    /// The marker for this boundary type.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Closed => CLOSED_MARKER,
            Self::Open => OPEN_MARKER,
            Self::Unspecified => UNSPECIFIED_MARKER,
        }
    }

    /// Closed and Open swap; Unspecified stays.
    #[must_use]
    pub const fn complement(self) -> Self {
        match self {
            Self::Closed => Self::Open,
            Self::Open => Self::Closed,
            Self::Unspecified => Self::Unspecified,
        }
    }

    /// Combines the boundary types of several operands.
    ///
    /// The result is the shared type when all operands agree and
    /// [`Unspecified`](Self::Unspecified) otherwise. No operands yields `Closed`.
    #[must_use]
    pub fn agreement(types: impl IntoIterator<Item = Self>) -> Self {
        let mut iter = types.into_iter();
        let Some(first) = iter.next() else {
            return Self::Closed;
        };
        if iter.all(|t| t == first) {
            first
        } else {
            Self::Unspecified
        }
    }
}

/// Common prefix of all markers.
pub const MARKER_PREFIX: &str = "ij-bt:[";
/// Marker for [`BoundaryType::Closed`].
pub const CLOSED_MARKER: &str = "ij-bt:[C]";
/// Marker for [`BoundaryType::Open`].
pub const OPEN_MARKER: &str = "ij-bt:[O]";
/// Marker for [`BoundaryType::Unspecified`].
pub const UNSPECIFIED_MARKER: &str = "ij-bt:[U]";

const MARKERS: [(&str, BoundaryType); 3] = [
    (CLOSED_MARKER, BoundaryType::Closed),
    (OPEN_MARKER, BoundaryType::Open),
    (UNSPECIFIED_MARKER, BoundaryType::Unspecified),
];

/// Returns the marker for `boundary`.
#[must_use]
pub const fn encode(boundary: BoundaryType) -> &'static str {
    boundary.marker()
}

/// Finds the first recognized marker in `text` as `(byte offset, type)`.
fn find_marker(text: &str) -> Option<(usize, BoundaryType)> {
    MARKERS
        .iter()
        .filter_map(|(m, bt)| text.find(m).map(|at| (at, *bt)))
        .min_by_key(|(at, _)| *at)
}

/// Decodes the marker in `text`, if any.
///
/// When several markers are present, the one appearing first wins.
#[must_use]
pub fn decode(text: &str) -> Option<BoundaryType> {
    find_marker(text).map(|(_, bt)| bt)
}

/// Decodes the marker in `text`, defaulting to [`BoundaryType::Closed`].
#[must_use]
pub fn boundary_type_of(text: &str) -> BoundaryType {
    decode(text).unwrap_or_default()
}

/// Stores `boundary` into `text`.
///
/// - Empty text becomes the bare marker.
/// - Text already containing the target marker is returned unchanged.
/// - An existing recognized marker is replaced in place.
/// - Otherwise the marker is appended after a single space.
///
/// The operation is idempotent.
#[must_use]
pub fn merge(text: &str, boundary: BoundaryType) -> String {
    let target = boundary.marker();
    if text.is_empty() {
        return target.to_owned();
    }
    if text.contains(target) {
        return text.to_owned();
    }
    if let Some((at, old)) = find_marker(text) {
        let end = at + old.marker().len();
        return format!("{}{}{}", &text[..at], target, &text[end..]);
    }
    format!("{text} {target}")
}

/// Ensures `text` carries some marker, appending the Closed one if not.
///
/// Used before saving server-authored shapes back, so that every persisted
/// shape states its boundary explicitly.
#[must_use]
pub fn ensure_marker(text: &str) -> String {
    if find_marker(text).is_some() {
        text.to_owned()
    } else {
        merge(text, BoundaryType::Closed)
    }
}
