// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Switches for bridge workflows.

/// Knobs for [`RoiBridge`](crate::RoiBridge) workflows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Fall back to the `boundaryType` shape annotation when a shape's text
    /// has no boundary marker.
    pub legacy_boundary_lookup: bool,
    /// Give every shape of a saved collection an explicit boundary marker.
    pub ensure_boundary_markers: bool,
    /// Fetch an ROI before updating it when its version is not cached.
    ///
    /// When disabled, the version of the local copy is used as-is.
    pub fetch_when_uncached: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            legacy_boundary_lookup: true,
            ensure_boundary_markers: true,
            fetch_when_uncached: true,
        }
    }
}
