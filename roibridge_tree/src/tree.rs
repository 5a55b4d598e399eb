// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! ROI hierarchy: a root of ROI collections, each holding shape elements.

use std::fmt;

use hashbrown::HashMap;
use roibridge_region::{PlaneComposite, Region, ShapeRegion, adapter};
use roibridge_shape::{RemoteRoi, RemoteShape, RoiId, ShapeId, ShapeKey, boundary};

use crate::error::{BridgeError, BridgeResult};

/// Handle of an element within one [`RoiCollection`].
///
/// Handles are allocated per collection and never reused by it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct RoiElement {
    id: ElementId,
    key: ShapeKey,
}

/// One ROI as a list of elements.
///
/// Each element is backed by a shape of the collection's [`RemoteRoi`].
/// Elements come in two flavors:
///
/// - *Backed* elements wrap a shape that came from the server (or a wrapped
///   remote shape that was added). They are edited in place through
///   [`with_element_mut`](Self::with_element_mut).
/// - *Pending* elements were added as local regions. The collection keeps the
///   local region and rebuilds the backing shape from it on every
///   [`data`](Self::data) call, so edits to the region are picked up. Once the
///   ROI has been saved and [`adopt_saved`](Self::adopt_saved) copied the
///   server ids back, pending elements become backed.
///
/// The backing ROI's plane index is kept consistent through every add, remove
/// and plane change.
#[derive(Clone, Debug, Default)]
pub struct RoiCollection {
    roi: RemoteRoi,
    elements: Vec<RoiElement>,
    pending: HashMap<ElementId, Region>,
    next_element: u64,
}

impl RoiCollection {
    /// Creates an empty collection for a new ROI.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_roi(RemoteRoi::with_name(name))
    }

    /// Wraps a downloaded ROI; every shape becomes a backed element.
    pub fn from_roi(roi: RemoteRoi) -> Self {
        let mut out = Self {
            roi,
            ..Self::default()
        };
        let keys: Vec<_> = out.roi.keys().collect();
        for key in keys {
            let id = out.allocate();
            out.elements.push(RoiElement { id, key });
        }
        out
    }

    fn allocate(&mut self) -> ElementId {
        self.next_element += 1;
        ElementId(self.next_element)
    }

    /// Id of the backing ROI, if persisted.
    pub fn id(&self) -> Option<RoiId> {
        self.roi.id
    }

    /// Name of the backing ROI.
    pub fn name(&self) -> &str {
        &self.roi.name
    }

    /// The backing ROI as last flushed; pending elements may be out of date.
    ///
    /// Use [`data`](Self::data) for an up-to-date view.
    pub fn roi(&self) -> &RemoteRoi {
        &self.roi
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the collection has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element handles in order.
    pub fn elements(&self) -> impl ExactSizeIterator<Item = ElementId> + '_ {
        self.elements.iter().map(|e| e.id)
    }

    /// Handle of the element at `index`.
    pub fn element_at(&self, index: usize) -> Option<ElementId> {
        self.elements.get(index).map(|e| e.id)
    }

    /// Position of `element`.
    pub fn position(&self, element: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == element)
    }

    /// Whether `element` was added as a local region and not saved yet.
    pub fn is_pending(&self, element: ElementId) -> bool {
        self.pending.contains_key(&element)
    }

    /// Handle of the element backed by server shape `id`.
    pub fn element_for_shape(&self, id: ShapeId) -> Option<ElementId> {
        let key = self.roi.find_by_id(id)?;
        self.elements.iter().find(|e| e.key == key).map(|e| e.id)
    }

    /// Appends a region.
    pub fn add(&mut self, region: Region) -> BridgeResult<ElementId> {
        self.insert(self.elements.len(), region)
    }

    /// Inserts a region at `index` (clamped to the length).
    ///
    /// Fails without modifying the collection when the region has no remote
    /// equivalent.
    pub fn insert(&mut self, index: usize, region: Region) -> BridgeResult<ElementId> {
        let shape = adapter::to_remote(&region)?;
        let key = self.roi.add_shape(shape);
        let id = self.allocate();
        let index = index.min(self.elements.len());
        self.elements.insert(index, RoiElement { id, key });
        if !matches!(region, Region::Shape(_)) {
            self.pending.insert(id, region);
        }
        Ok(id)
    }

    /// Removes `element` and returns its backing shape.
    pub fn remove(&mut self, element: ElementId) -> BridgeResult<RemoteShape> {
        let pos = self
            .position(element)
            .ok_or(BridgeError::UnknownElement(element))?;
        self.remove_at(pos)
    }

    /// Removes the element at `index` and returns its backing shape.
    pub fn remove_at(&mut self, index: usize) -> BridgeResult<RemoteShape> {
        let Some(element) = self.elements.get(index).cloned() else {
            return Err(BridgeError::IndexOutOfRange {
                index,
                len: self.elements.len(),
            });
        };
        let shape = self
            .roi
            .remove_shape(element.key)
            .ok_or(BridgeError::MissingShape(element.id))?;
        self.elements.remove(index);
        self.pending.remove(&element.id);
        Ok(shape)
    }

    /// Replaces `element` with `region` at the same position.
    ///
    /// Returns the new element handle and the removed shape. If `region` cannot
    /// be converted, nothing is modified.
    pub fn set(
        &mut self,
        element: ElementId,
        region: Region,
    ) -> BridgeResult<(ElementId, RemoteShape)> {
        let pos = self
            .position(element)
            .ok_or(BridgeError::UnknownElement(element))?;
        adapter::to_remote(&region)?;
        let old = self.remove_at(pos)?;
        let id = self.insert(pos, region)?;
        Ok((id, old))
    }

    /// Flushes pending elements into the backing ROI and returns it.
    pub fn data(&mut self) -> BridgeResult<&RemoteRoi> {
        for element in &self.elements {
            let Some(region) = self.pending.get(&element.id) else {
                continue;
            };
            let fresh = adapter::to_remote(region)?;
            self.roi
                .modify_shape(element.key, |s| {
                    if s.kind() == fresh.kind() {
                        s.synchronize_from(&fresh)
                    } else {
                        // The local region changed kind; rebuild the shape
                        // but keep its server identity.
                        let id = s.id;
                        *s = fresh.clone();
                        s.id = id;
                        Ok(())
                    }
                })
                .ok_or(BridgeError::MissingShape(element.id))??;
        }
        Ok(&self.roi)
    }

    /// Local region of `element`.
    ///
    /// Pending elements return a copy of their local region; backed elements
    /// return their shape wrapped as [`Region::Shape`].
    pub fn element_region(&self, element: ElementId) -> BridgeResult<Region> {
        if let Some(region) = self.pending.get(&element) {
            return Ok(region.clone());
        }
        let shape = self.backing_shape(element)?;
        Ok(Region::Shape(adapter::wrap(shape.clone())?))
    }

    /// Remote shape of `element`.
    ///
    /// Pending elements are rebuilt from their local region on every call.
    pub fn element_shape(&self, element: ElementId) -> BridgeResult<RemoteShape> {
        if let Some(region) = self.pending.get(&element) {
            let mut shape = adapter::to_remote(region)?;
            shape.id = self.backing_shape(element)?.id;
            return Ok(shape);
        }
        Ok(self.backing_shape(element)?.clone())
    }

    fn backing_shape(&self, element: ElementId) -> BridgeResult<&RemoteShape> {
        let e = self
            .elements
            .iter()
            .find(|e| e.id == element)
            .ok_or(BridgeError::UnknownElement(element))?;
        self.roi
            .shape(e.key)
            .ok_or(BridgeError::MissingShape(element))
    }

    /// Edits a backed element in place through a bound [`ShapeRegion`].
    ///
    /// The wrapper's edits are written back into the backing ROI when `f`
    /// returns, re-indexing the shape if its plane changed.
    pub fn with_element_mut<R>(
        &mut self,
        element: ElementId,
        f: impl FnOnce(&mut ShapeRegion) -> R,
    ) -> BridgeResult<R> {
        if self.pending.contains_key(&element) {
            return Err(BridgeError::PendingElement(element));
        }
        let key = self
            .elements
            .iter()
            .find(|e| e.id == element)
            .map(|e| e.key)
            .ok_or(BridgeError::UnknownElement(element))?;
        let shape = self
            .roi
            .shape(key)
            .ok_or(BridgeError::MissingShape(element))?;
        let mut bound = adapter::wrap(shape.clone())?;
        let out = f(&mut bound);
        self.roi.modify_shape(key, |s| *s = bound.into_shape());
        Ok(out)
    }

    /// Local region of a pending element, for editing.
    pub fn local_region_mut(&mut self, element: ElementId) -> Option<&mut Region> {
        self.pending.get_mut(&element)
    }

    /// Makes every backed shape state its boundary type explicitly.
    pub fn ensure_boundary_markers(&mut self) {
        let keys: Vec<_> = self.roi.keys().collect();
        for key in keys {
            self.roi
                .modify_shape(key, |s| s.text = boundary::ensure_marker(&s.text));
        }
    }

    /// Copies server identity from `saved` into this collection.
    ///
    /// Pending elements are flushed first and matched to saved shapes by
    /// equivalence; elements whose shape received an id become backed.
    pub fn adopt_saved(&mut self, saved: &RemoteRoi) -> BridgeResult<()> {
        self.data()?;
        self.roi.adopt_ids(saved)?;
        let roi = &self.roi;
        let elements = &self.elements;
        self.pending.retain(|id, _| {
            elements
                .iter()
                .find(|e| e.id == *id)
                .and_then(|e| roi.shape(e.key))
                .is_none_or(|s| s.id.is_none())
        });
        Ok(())
    }

    /// The collection as a plane-indexed predicate.
    pub fn to_composite(&mut self) -> BridgeResult<PlaneComposite> {
        Ok(adapter::from_remote_roi(self.data()?)?)
    }
}

/// Root of the ROI hierarchy of one image.
#[derive(Clone, Debug, Default)]
pub struct RoiTree {
    collections: Vec<RoiCollection>,
}

impl RoiTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// One collection per ROI.
    pub fn from_rois(rois: impl IntoIterator<Item = RemoteRoi>) -> Self {
        Self {
            collections: rois.into_iter().map(RoiCollection::from_roi).collect(),
        }
    }

    /// Number of collections.
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Whether the tree has no collections.
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Collections in order.
    pub fn collections(&self) -> &[RoiCollection] {
        &self.collections
    }

    /// Collections in order, mutably.
    pub fn collections_mut(&mut self) -> &mut [RoiCollection] {
        &mut self.collections
    }

    /// Appends a collection.
    pub fn push(&mut self, collection: RoiCollection) {
        self.collections.push(collection);
    }

    /// Collection of ROI `id`.
    pub fn get(&self, id: RoiId) -> Option<&RoiCollection> {
        self.collections.iter().find(|c| c.id() == Some(id))
    }

    /// Collection of ROI `id`, mutably.
    pub fn get_mut(&mut self, id: RoiId) -> Option<&mut RoiCollection> {
        self.collections.iter_mut().find(|c| c.id() == Some(id))
    }

    /// Removes the collection of ROI `id`.
    pub fn remove(&mut self, id: RoiId) -> Option<RoiCollection> {
        let pos = self.collections.iter().position(|c| c.id() == Some(id))?;
        Some(self.collections.remove(pos))
    }

    /// ROI holding server shape `shape`.
    pub fn parent_of(&self, shape: ShapeId) -> Option<RoiId> {
        self.collections
            .iter()
            .find(|c| c.roi().find_by_id(shape).is_some())
            .and_then(RoiCollection::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Point, Vec2};
    use roibridge_shape::{BoundaryType, PlaneCoordinate, ShapeGeometry};

    fn rect(x: f64) -> Region {
        Region::rect(x, 0.0, 2.0, 2.0, BoundaryType::Closed)
    }

    fn backed_roi() -> RemoteRoi {
        RemoteRoi::from_shapes([
            RemoteShape::new(ShapeGeometry::Point { x: 1.0, y: 1.0 })
                .with_id(ShapeId(10))
                .with_text("spot"),
        ])
    }

    #[test]
    fn add_and_remove_keep_roi_in_step() {
        let mut c = RoiCollection::new("cells");
        let a = c.add(rect(0.0)).unwrap();
        let b = c.add(rect(5.0)).unwrap();
        assert_eq!(c.data().unwrap().shape_count(), 2);
        c.remove(a).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.data().unwrap().shape_count(), 1);
        assert_eq!(c.element_at(0), Some(b));
        assert!(matches!(
            c.remove(a),
            Err(BridgeError::UnknownElement(id)) if id == a
        ));
        assert!(matches!(
            c.remove_at(1),
            Err(BridgeError::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn unsupported_regions_are_rejected() {
        let mut c = RoiCollection::new("cells");
        let err = c.add(rect(0.0).and(rect(1.0))).unwrap_err();
        assert!(matches!(err, BridgeError::Conversion(_)));
        assert!(c.is_empty());
        assert!(c.roi().is_empty());
    }

    #[test]
    fn pending_elements_replay_local_edits() {
        let mut c = RoiCollection::new("cells");
        let a = c.add(rect(0.0)).unwrap();
        assert!(c.is_pending(a));
        *c.local_region_mut(a).unwrap() = Region::rect(7.0, 7.0, 1.0, 1.0, BoundaryType::Open);
        let roi = c.data().unwrap();
        let shape = roi.shapes().next().unwrap();
        assert_eq!(
            shape.geometry,
            ShapeGeometry::Rectangle {
                x: 7.0,
                y: 7.0,
                width: 1.0,
                height: 1.0
            }
        );
        assert_eq!(shape.boundary_type(), BoundaryType::Open);
        assert!(matches!(
            c.with_element_mut(a, |_| ()),
            Err(BridgeError::PendingElement(_))
        ));
    }

    #[test]
    fn backed_elements_are_edited_in_place() {
        let mut c = RoiCollection::from_roi(backed_roi());
        let e = c.element_at(0).unwrap();
        assert!(!c.is_pending(e));
        c.with_element_mut(e, |s| {
            s.translate(Vec2::new(2.0, 0.0));
            s.set_plane(PlaneCoordinate::new(3, -1, -1).unwrap());
        })
        .unwrap();
        let shape = c.element_shape(e).unwrap();
        assert_eq!(shape.id, Some(ShapeId(10)));
        assert_eq!(shape.geometry, ShapeGeometry::Point { x: 3.0, y: 1.0 });
        assert_eq!(shape.text, "spot ij-bt:[C]");
        let plane = PlaneCoordinate::new(3, -1, -1).unwrap();
        assert_eq!(c.roi().shapes_on_plane(plane).len(), 1);
        assert!(c.roi().shapes_on_plane(PlaneCoordinate::ALL).is_empty());
        c.remove(e).unwrap();
        assert_eq!(c.roi().planes().count(), 0);
    }

    #[test]
    fn set_replaces_at_same_position() {
        let mut c = RoiCollection::new("cells");
        let a = c.add(rect(0.0)).unwrap();
        let b = c.add(rect(5.0)).unwrap();
        let (a2, old) = c.set(a, rect(9.0)).unwrap();
        assert_eq!(c.elements().collect::<Vec<_>>(), [a2, b]);
        assert_eq!(
            old.geometry,
            ShapeGeometry::Rectangle {
                x: 0.0,
                y: 0.0,
                width: 2.0,
                height: 2.0
            }
        );
        assert!(c.set(b, rect(0.0).negate()).is_err());
        assert_eq!(c.len(), 2, "failed set leaves the collection intact");
    }

    #[test]
    fn element_region_wraps_backed_shapes() {
        let c = RoiCollection::from_roi(backed_roi());
        let e = c.element_at(0).unwrap();
        let region = c.element_region(e).unwrap();
        assert!(region.contains_point(Point::new(1.0, 1.0)));
        assert_eq!(c.element_for_shape(ShapeId(10)), Some(e));
    }

    #[test]
    fn tree_finds_parents() {
        let mut roi = backed_roi();
        roi.id = Some(RoiId(4));
        let tree = RoiTree::from_rois([roi]);
        assert_eq!(tree.parent_of(ShapeId(10)), Some(RoiId(4)));
        assert_eq!(tree.parent_of(ShapeId(11)), None);
        assert!(tree.get(RoiId(4)).is_some());
    }
}
