// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-process [`Session`] backed by plain maps.

use hashbrown::HashMap;
use parking_lot::Mutex;
use roibridge_shape::{RemoteRoi, RoiId, ShapeId};

use crate::error::SessionError;
use crate::session::{AssignedIds, ImageId, ObjectRef, Session, TableInfo};

/// Number of calls made per [`Session`] method.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// [`Session::fetch_rois_for_image`].
    pub fetch_rois: usize,
    /// [`Session::fetch_roi`].
    pub fetch_roi: usize,
    /// [`Session::save_new_shapes`].
    pub save_new: usize,
    /// [`Session::save_existing_object`].
    pub save_existing: usize,
    /// [`Session::delete_object`].
    pub delete: usize,
    /// [`Session::query_annotations`].
    pub query_annotations: usize,
    /// [`Session::fetch_tables_for_image`].
    pub fetch_tables: usize,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    offline: bool,
    rois: HashMap<RoiId, (ImageId, RemoteRoi)>,
    annotations: HashMap<ShapeId, Vec<(String, String)>>,
    tables: HashMap<ImageId, Vec<TableInfo>>,
    calls: CallCounts,
}

impl State {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_online(&self) -> Result<(), SessionError> {
        if self.offline {
            Err(SessionError::communication("session is offline"))
        } else {
            Ok(())
        }
    }

    /// Assigns ids to every shape lacking one.
    fn assign_shape_ids(&mut self, roi: &mut RemoteRoi) -> Vec<ShapeId> {
        let keys: Vec<_> = roi.keys().collect();
        let mut ids = Vec::with_capacity(keys.len());
        for key in keys {
            let existing = roi.shape(key).and_then(|s| s.id);
            let id = existing.unwrap_or_else(|| ShapeId(self.allocate()));
            roi.modify_shape(key, |s| s.id = Some(id));
            ids.push(id);
        }
        ids
    }
}

/// A [`Session`] that keeps everything in memory.
///
/// Versions start at 1 and increase on every change, ids are allocated from a
/// single counter, and every call is counted (see [`calls`](Self::calls)).
/// Useful for tests and for working offline against a snapshot.
#[derive(Debug, Default)]
pub struct InMemorySession {
    state: Mutex<State>,
}

impl InMemorySession {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `roi` on `image` as if created by another client.
    ///
    /// Missing ids are assigned and the version is set to 1. Returns the stored
    /// ROI. Not counted as a call.
    pub fn insert_roi(&self, image: ImageId, mut roi: RemoteRoi) -> RemoteRoi {
        let mut state = self.state.lock();
        let id = match roi.id {
            Some(id) => id,
            None => RoiId(state.allocate()),
        };
        roi.id = Some(id);
        roi.version = Some(1);
        state.assign_shape_ids(&mut roi);
        state.rois.insert(id, (image, roi.clone()));
        roi
    }

    /// Simulates a concurrent edit by bumping the stored version of `roi`.
    pub fn touch(&self, roi: RoiId) {
        let mut state = self.state.lock();
        if let Some((_, stored)) = state.rois.get_mut(&roi) {
            stored.version = Some(stored.version.map_or(1, |v| v + 1));
        }
    }

    /// Attaches a table to `image`.
    pub fn add_table(&self, image: ImageId, name: impl Into<String>) -> TableInfo {
        let mut state = self.state.lock();
        let info = TableInfo {
            id: state.allocate(),
            name: name.into(),
        };
        state.tables.entry(image).or_default().push(info.clone());
        info
    }

    /// Attaches a key/value annotation to `shape`.
    pub fn annotate(&self, shape: ShapeId, key: impl Into<String>, value: impl Into<String>) {
        self.state
            .lock()
            .annotations
            .entry(shape)
            .or_default()
            .push((key.into(), value.into()));
    }

    /// Makes every subsequent call fail with a communication error.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    /// Stored state of `roi`, without counting a call.
    pub fn peek(&self, roi: RoiId) -> Option<RemoteRoi> {
        self.state.lock().rois.get(&roi).map(|(_, r)| r.clone())
    }

    /// Number of stored ROIs.
    pub fn roi_count(&self) -> usize {
        self.state.lock().rois.len()
    }
}

impl Session for InMemorySession {
    fn fetch_rois_for_image(&self, image: ImageId) -> Result<Vec<RemoteRoi>, SessionError> {
        let mut state = self.state.lock();
        state.calls.fetch_rois += 1;
        state.check_online()?;
        let mut rois: Vec<_> = state
            .rois
            .values()
            .filter(|(owner, _)| *owner == image)
            .map(|(_, r)| r.clone())
            .collect();
        rois.sort_by_key(|r| r.id);
        Ok(rois)
    }

    fn fetch_roi(&self, roi: RoiId) -> Result<RemoteRoi, SessionError> {
        let mut state = self.state.lock();
        state.calls.fetch_roi += 1;
        state.check_online()?;
        state
            .rois
            .get(&roi)
            .map(|(_, r)| r.clone())
            .ok_or_else(|| SessionError::not_found(roi))
    }

    fn save_new_shapes(
        &self,
        image: ImageId,
        roi: &RemoteRoi,
    ) -> Result<AssignedIds, SessionError> {
        let mut state = self.state.lock();
        state.calls.save_new += 1;
        state.check_online()?;
        let mut stored = roi.clone();
        stored.clear_ids();
        let id = RoiId(state.allocate());
        stored.id = Some(id);
        stored.version = Some(1);
        let shapes = state.assign_shape_ids(&mut stored);
        state.rois.insert(id, (image, stored));
        Ok(AssignedIds { roi: id, shapes })
    }

    fn save_existing_object(&self, mut roi: RemoteRoi) -> Result<RemoteRoi, SessionError> {
        let mut state = self.state.lock();
        state.calls.save_existing += 1;
        state.check_online()?;
        let id = roi.id.ok_or_else(|| SessionError::not_found("unsaved roi"))?;
        let (image, stored_version, stored_ids) = match state.rois.get(&id) {
            Some((image, stored)) => (
                *image,
                stored.version,
                stored.shapes().filter_map(|s| s.id).collect::<Vec<_>>(),
            ),
            None => return Err(SessionError::not_found(id)),
        };
        if roi.version != stored_version {
            return Err(SessionError::stale_version(id, roi.version, stored_version));
        }
        // Ids the server never issued for this ROI are treated as new shapes.
        let foreign: Vec<_> = roi
            .entries()
            .filter(|(_, s)| s.id.is_some_and(|sid| !stored_ids.contains(&sid)))
            .map(|(k, _)| k)
            .collect();
        for key in foreign {
            roi.modify_shape(key, |s| s.id = None);
        }
        state.assign_shape_ids(&mut roi);
        roi.version = Some(stored_version.map_or(1, |v| v + 1));
        state.rois.insert(id, (image, roi.clone()));
        Ok(roi)
    }

    fn delete_object(&self, object: ObjectRef) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.calls.delete += 1;
        state.check_online()?;
        match object {
            ObjectRef::Roi(id) => state
                .rois
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| SessionError::not_found(object)),
            ObjectRef::Shape(id) => {
                for (_, roi) in state.rois.values_mut() {
                    if let Some(key) = roi.find_by_id(id) {
                        roi.remove_shape(key);
                        roi.version = Some(roi.version.map_or(1, |v| v + 1));
                        return Ok(());
                    }
                }
                Err(SessionError::not_found(object))
            }
        }
    }

    fn query_annotations(&self, shape: ShapeId) -> Result<Vec<(String, String)>, SessionError> {
        let mut state = self.state.lock();
        state.calls.query_annotations += 1;
        state.check_online()?;
        Ok(state.annotations.get(&shape).cloned().unwrap_or_default())
    }

    fn fetch_tables_for_image(&self, image: ImageId) -> Result<Vec<TableInfo>, SessionError> {
        let mut state = self.state.lock();
        state.calls.fetch_tables += 1;
        state.check_online()?;
        Ok(state.tables.get(&image).cloned().unwrap_or_default())
    }
}
