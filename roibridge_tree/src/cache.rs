// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identity and version maps for uploaded and downloaded ROIs.

use std::hash::Hash;

use hashbrown::HashMap;
use roibridge_shape::{RemoteRoi, RoiId, ShapeId};

/// Remembers what was uploaded and what the server last reported.
///
/// - The *identity map* goes from a caller-chosen key for a local object
///   (typically a handle identifying one region instance) to the ROI most
///   recently uploaded for it. Uploading the same object again updates those
///   remote objects instead of creating new ones.
/// - The *version map* goes from ROI id to the latest known server state, so
///   updates start from the current version token instead of failing with a
///   stale version.
///
/// The cache is not synchronized; it belongs to one session used from one
/// thread.
#[derive(Debug, Clone)]
pub struct RoiCache<K> {
    saved: HashMap<K, RemoteRoi>,
    latest: HashMap<RoiId, RemoteRoi>,
}

impl<K> Default for RoiCache<K> {
    fn default() -> Self {
        Self {
            saved: HashMap::new(),
            latest: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> RoiCache<K> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// ROI last uploaded for `key`.
    pub fn saved(&self, key: &K) -> Option<&RemoteRoi> {
        self.saved.get(key)
    }

    /// Records the ROI uploaded for `key`, returning the previous one.
    pub fn remember_saved(&mut self, key: K, roi: RemoteRoi) -> Option<RemoteRoi> {
        self.saved.insert(key, roi)
    }

    /// Forgets the upload recorded for `key`.
    pub fn forget_saved(&mut self, key: &K) -> Option<RemoteRoi> {
        self.saved.remove(key)
    }

    /// Forgets every upload that produced ROI `id`; returns how many.
    pub fn forget_saved_roi(&mut self, id: RoiId) -> usize {
        let before = self.saved.len();
        self.saved.retain(|_, roi| roi.id != Some(id));
        before - self.saved.len()
    }

    /// Drops shape `shape` from every upload that produced ROI `id`.
    ///
    /// The uploads stay recorded, so uploading the same object again still
    /// updates ROI `id`. Returns how many uploads held the shape.
    pub fn forget_saved_shape(&mut self, id: RoiId, shape: ShapeId) -> usize {
        let mut dropped = 0;
        for roi in self.saved.values_mut().filter(|r| r.id == Some(id)) {
            if let Some(key) = roi.find_by_id(shape) {
                roi.remove_shape(key);
                dropped += 1;
            }
        }
        dropped
    }

    /// Keys with a recorded upload.
    pub fn saved_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.saved.keys()
    }

    /// Forgets every upload.
    pub fn clear_saved(&mut self) {
        self.saved.clear();
    }

    /// Latest known server state of `id`.
    pub fn latest(&self, id: RoiId) -> Option<&RemoteRoi> {
        self.latest.get(&id)
    }

    /// Records `roi` as the latest known state.
    ///
    /// Unpersisted ROIs are ignored; returns whether `roi` was recorded.
    pub fn remember_latest(&mut self, roi: RemoteRoi) -> bool {
        match roi.id {
            Some(id) => {
                self.latest.insert(id, roi);
                true
            }
            None => false,
        }
    }

    /// Forgets the latest state of `id`.
    pub fn forget_latest(&mut self, id: RoiId) -> Option<RemoteRoi> {
        self.latest.remove(&id)
    }

    /// Removes every trace of `id` from both maps.
    pub fn purge(&mut self, id: RoiId) {
        self.forget_latest(id);
        self.forget_saved_roi(id);
    }

    /// Number of ROIs in the version map.
    pub fn latest_len(&self) -> usize {
        self.latest.len()
    }
}
