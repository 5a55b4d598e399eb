// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Upload, download, update and delete workflows over a [`Session`].

use std::hash::Hash;
use std::sync::Arc;

use roibridge_region::{Region, adapter};
use roibridge_shape::{BoundaryType, RemoteRoi, RemoteShape, RoiId, ShapeId, ShapeKey, boundary};

use crate::cache::RoiCache;
use crate::error::{BridgeError, BridgeResult};
use crate::lazy::{LazyRoiTree, LazyTableList};
use crate::options::BridgeOptions;
use crate::scope::SessionStack;
use crate::session::{ImageId, ObjectRef, Session};
use crate::tree::{RoiCollection, RoiTree};

/// Annotation key consulted by the legacy boundary-type lookup.
pub const LEGACY_BOUNDARY_KEY: &str = "boundaryType";

/// Outcome of [`RoiBridge::resynchronize`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Shapes uploaded as new.
    pub added: usize,
    /// Existing shapes whose data changed.
    pub updated: usize,
    /// Remote shapes removed.
    pub deleted: usize,
    /// Existing shapes left as they were.
    pub unchanged: usize,
}

impl SyncReport {
    /// Whether the remote ROI needs saving.
    pub fn has_changes(&self) -> bool {
        self.added + self.updated + self.deleted > 0
    }
}

/// Bridges local regions with one remote session.
///
/// `K` identifies local objects for the identity map (see [`RoiCache`]).
/// All calls block on the session. The bridge is meant for a single thread.
#[derive(Debug)]
pub struct RoiBridge<S, K = u64> {
    session: Arc<S>,
    cache: RoiCache<K>,
    options: BridgeOptions,
}

impl<S: Session, K: Eq + Hash> RoiBridge<S, K> {
    /// Creates a bridge with default options.
    pub fn new(session: Arc<S>) -> Self {
        Self::with_options(session, BridgeOptions::default())
    }

    /// Creates a bridge with `options`.
    pub fn with_options(session: Arc<S>, options: BridgeOptions) -> Self {
        Self {
            session,
            cache: RoiCache::new(),
            options,
        }
    }

    /// Creates a bridge over the innermost session of `stack`.
    ///
    /// Returns `None` when no scope is active.
    pub fn from_current(stack: &SessionStack<S>, options: BridgeOptions) -> Option<Self> {
        let session = stack.current()?;
        Some(Self::with_options(session, options))
    }

    /// The session.
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// The identity and version maps.
    pub fn cache(&self) -> &RoiCache<K> {
        &self.cache
    }

    /// The identity and version maps, mutably.
    pub fn cache_mut(&mut self) -> &mut RoiCache<K> {
        &mut self.cache
    }

    /// Options in effect.
    pub fn options(&self) -> BridgeOptions {
        self.options
    }

    /// Downloads every ROI of `image` and records their versions.
    pub fn download_rois(&mut self, image: ImageId) -> BridgeResult<RoiTree> {
        let rois = self.session.fetch_rois_for_image(image)?;
        tracing::debug!("downloaded {} ROIs for {}", rois.len(), image);
        for roi in &rois {
            self.cache.remember_latest(roi.clone());
        }
        Ok(RoiTree::from_rois(rois))
    }

    /// Downloads one ROI and records its version.
    pub fn download_roi(&mut self, id: RoiId) -> BridgeResult<RoiCollection> {
        let roi = self.session.fetch_roi(id)?;
        self.cache.remember_latest(roi.clone());
        Ok(RoiCollection::from_roi(roi))
    }

    /// Uploads a local region as one ROI on `image`.
    ///
    /// If a region was uploaded under `key` before, its remote objects are
    /// updated: the ROI id and, pairwise in order, the shape ids are reused,
    /// and the save starts from the latest known version. Otherwise a new ROI
    /// is created. Returns the saved state.
    pub fn upload_region(
        &mut self,
        image: ImageId,
        key: K,
        region: &Region,
    ) -> BridgeResult<RemoteRoi> {
        let mut roi = adapter::to_remote_roi(region)?;
        let previous = self.cache.saved(&key).filter(|r| r.id.is_some()).cloned();
        let saved = match previous {
            Some(previous) => {
                tracing::debug!("identity hit: updating {:?}", previous.id);
                roi.id = previous.id;
                roi.version = previous.version;
                reuse_shape_ids(&mut roi, &previous);
                self.save_existing(roi)?
            }
            None => self.save_new(image, &roi)?,
        };
        tracing::info!(
            "uploaded {:?} with {} shapes",
            saved.id,
            saved.shape_count()
        );
        self.cache.remember_saved(key, saved.clone());
        Ok(saved)
    }

    /// Saves a collection, creating its ROI if needed, and copies the server
    /// ids back into it.
    pub fn save_collection(
        &mut self,
        image: ImageId,
        collection: &mut RoiCollection,
    ) -> BridgeResult<RemoteRoi> {
        if self.options.ensure_boundary_markers {
            collection.ensure_boundary_markers();
        }
        let roi = collection.data()?.clone();
        let saved = match roi.id {
            Some(_) => self.save_existing(roi)?,
            None => self.save_new(image, &roi)?,
        };
        collection.adopt_saved(&saved)?;
        Ok(saved)
    }

    /// Makes the remote ROI `id` hold exactly `desired`.
    ///
    /// Desired shapes are matched to remote shapes by id, or by equivalence
    /// when they have none. Matched shapes are synchronized, unmatched desired
    /// shapes are added as new, and remote shapes nobody matched are deleted.
    /// Nothing is saved when nothing changed. Aborts on the first session
    /// error.
    pub fn resynchronize(&mut self, id: RoiId, desired: &[RemoteShape]) -> BridgeResult<SyncReport> {
        let mut next = self.current(id)?;
        let mut report = SyncReport::default();
        let mut matched: Vec<ShapeKey> = Vec::new();

        for wanted in desired {
            let target = match wanted.id {
                Some(sid) => next.find_by_id(sid).filter(|k| !matched.contains(k)),
                None => next
                    .entries()
                    .find(|(k, s)| !matched.contains(k) && s.equivalent(wanted))
                    .map(|(k, _)| k),
            };
            let Some(key) = target else {
                let mut fresh = wanted.clone();
                fresh.id = None;
                matched.push(next.add_shape(fresh));
                report.added += 1;
                continue;
            };
            matched.push(key);
            let Some(current) = next.shape(key) else {
                continue;
            };
            if current.equivalent(wanted) && current.transform == wanted.transform {
                report.unchanged += 1;
            } else if current.kind() == wanted.kind() {
                next.modify_shape(key, |s| s.synchronize_from(wanted))
                    .transpose()?;
                report.updated += 1;
            } else {
                next.remove_shape(key);
                let mut fresh = wanted.clone();
                fresh.id = None;
                matched.push(next.add_shape(fresh));
                report.deleted += 1;
                report.added += 1;
            }
        }

        let stale: Vec<_> = next.keys().filter(|k| !matched.contains(k)).collect();
        for key in stale {
            next.remove_shape(key);
            report.deleted += 1;
        }

        if report.has_changes() {
            self.save_existing(next)?;
        }
        tracing::info!(
            "resynchronized {}: {} added, {} updated, {} deleted",
            id,
            report.added,
            report.updated,
            report.deleted
        );
        Ok(report)
    }

    /// Deletes ROI `id` and purges it from the cache.
    pub fn delete_roi(&mut self, id: RoiId) -> BridgeResult<()> {
        self.session.delete_object(ObjectRef::Roi(id))?;
        self.cache.purge(id);
        tracing::info!("deleted {}", id);
        Ok(())
    }

    /// Deletes one shape of ROI `roi`.
    ///
    /// The ROI's cached version is dropped, since the server bumps it. Uploads
    /// recorded for `roi` keep pointing at it, minus the deleted shape. Fails
    /// before contacting the server when the cached state of `roi` does not
    /// contain `shape`.
    pub fn delete_shape(&mut self, roi: RoiId, shape: ShapeId) -> BridgeResult<()> {
        if let Some(known) = self.cache.latest(roi) {
            if known.find_by_id(shape).is_none() {
                return Err(BridgeError::ShapeNotInRoi { shape, roi });
            }
        }
        self.session.delete_object(ObjectRef::Shape(shape))?;
        self.cache.forget_latest(roi);
        self.cache.forget_saved_shape(roi, shape);
        tracing::info!("deleted {} of {}", shape, roi);
        Ok(())
    }

    /// Boundary type of a remote shape.
    ///
    /// The text marker wins. Without one, and with
    /// [`legacy_boundary_lookup`](BridgeOptions::legacy_boundary_lookup), the
    /// shape's `boundaryType` annotation is consulted. Everything else,
    /// including a failed lookup, is Closed.
    pub fn boundary_type(&self, shape: &RemoteShape) -> BoundaryType {
        if let Some(bt) = boundary::decode(&shape.text) {
            return bt;
        }
        let (true, Some(id)) = (self.options.legacy_boundary_lookup, shape.id) else {
            return BoundaryType::Closed;
        };
        match self.session.query_annotations(id) {
            Ok(annotations) => annotations
                .iter()
                .find(|(k, _)| k == LEGACY_BOUNDARY_KEY)
                .map_or(BoundaryType::Closed, |(_, v)| {
                    if v.eq_ignore_ascii_case("open") {
                        BoundaryType::Open
                    } else if v.eq_ignore_ascii_case("unspecified") {
                        BoundaryType::Unspecified
                    } else {
                        BoundaryType::Closed
                    }
                }),
            Err(e) => {
                tracing::warn!("boundary lookup for {} failed, assuming closed: {}", id, e);
                BoundaryType::Closed
            }
        }
    }

    /// Loader for the ROIs of `image`.
    pub fn lazy_rois(&self, image: ImageId) -> LazyRoiTree<S> {
        LazyRoiTree::new(Arc::clone(&self.session), image)
    }

    /// Loader for the tables of `image`.
    pub fn lazy_tables(&self, image: ImageId) -> LazyTableList<S> {
        LazyTableList::new(Arc::clone(&self.session), image)
    }

    /// Latest known state of `id`, fetched if not cached.
    fn current(&mut self, id: RoiId) -> BridgeResult<RemoteRoi> {
        if let Some(roi) = self.cache.latest(id) {
            return Ok(roi.clone());
        }
        let roi = self.session.fetch_roi(id)?;
        self.cache.remember_latest(roi.clone());
        Ok(roi)
    }

    fn save_new(&mut self, image: ImageId, roi: &RemoteRoi) -> BridgeResult<RemoteRoi> {
        let assigned = self.session.save_new_shapes(image, roi)?;
        let saved = self.session.fetch_roi(assigned.roi)?;
        self.cache.remember_latest(saved.clone());
        Ok(saved)
    }

    fn save_existing(&mut self, mut roi: RemoteRoi) -> BridgeResult<RemoteRoi> {
        if let Some(id) = roi.id {
            match self.cache.latest(id) {
                Some(latest) => roi.version = latest.version,
                None if self.options.fetch_when_uncached => {
                    roi.version = self.session.fetch_roi(id)?.version;
                }
                None => {}
            }
        }
        let saved = self.session.save_existing_object(roi)?;
        self.cache.remember_latest(saved.clone());
        Ok(saved)
    }
}

/// Copies shape ids from `previous` pairwise, in order.
fn reuse_shape_ids(roi: &mut RemoteRoi, previous: &RemoteRoi) {
    let keys: Vec<_> = roi.keys().collect();
    for (key, old) in keys.into_iter().zip(previous.shapes()) {
        roi.modify_shape(key, |s| s.id = old.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySession;
    use roibridge_shape::ShapeGeometry;

    fn point(x: f64) -> RemoteShape {
        RemoteShape::new(ShapeGeometry::Point { x, y: 0.0 })
    }

    #[test]
    fn legacy_annotation_fallback() {
        let session = Arc::new(InMemorySession::new());
        session.annotate(ShapeId(1), LEGACY_BOUNDARY_KEY, "Open");
        session.annotate(ShapeId(3), LEGACY_BOUNDARY_KEY, "UNSPECIFIED");
        let bridge = RoiBridge::<_, u64>::new(Arc::clone(&session));
        assert_eq!(
            bridge.boundary_type(&point(0.0).with_id(ShapeId(1))),
            BoundaryType::Open
        );
        assert_eq!(
            bridge.boundary_type(&point(0.0).with_id(ShapeId(3))),
            BoundaryType::Unspecified
        );
        assert_eq!(
            bridge.boundary_type(&point(0.0).with_id(ShapeId(1)).with_text("ij-bt:[U]")),
            BoundaryType::Unspecified,
            "marker wins over annotation"
        );
        assert_eq!(
            bridge.boundary_type(&point(0.0).with_id(ShapeId(2))),
            BoundaryType::Closed
        );
    }

    #[test]
    fn failed_lookup_is_closed() {
        let session = Arc::new(InMemorySession::new());
        session.annotate(ShapeId(1), LEGACY_BOUNDARY_KEY, "open");
        session.set_offline(true);
        let bridge = RoiBridge::<_, u64>::new(Arc::clone(&session));
        assert_eq!(
            bridge.boundary_type(&point(0.0).with_id(ShapeId(1))),
            BoundaryType::Closed
        );
    }

    #[test]
    fn legacy_lookup_can_be_disabled() {
        let session = Arc::new(InMemorySession::new());
        session.annotate(ShapeId(1), LEGACY_BOUNDARY_KEY, "open");
        let options = BridgeOptions {
            legacy_boundary_lookup: false,
            ..BridgeOptions::default()
        };
        let bridge = RoiBridge::<_, u64>::with_options(Arc::clone(&session), options);
        assert_eq!(
            bridge.boundary_type(&point(0.0).with_id(ShapeId(1))),
            BoundaryType::Closed
        );
        assert_eq!(session.calls().query_annotations, 0);
    }

    #[test]
    fn reuse_ids_pairs_in_order() {
        let previous = RemoteRoi::from_shapes([
            point(0.0).with_id(ShapeId(1)),
            point(1.0).with_id(ShapeId(2)),
        ]);
        let mut roi = RemoteRoi::from_shapes([point(5.0), point(6.0), point(7.0)]);
        reuse_shape_ids(&mut roi, &previous);
        let ids: Vec<_> = roi.shapes().map(|s| s.id).collect();
        assert_eq!(ids, [Some(ShapeId(1)), Some(ShapeId(2)), None]);
    }
}
