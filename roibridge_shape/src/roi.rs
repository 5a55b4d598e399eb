// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Remote ROIs: a multiset of shapes plus a derived plane index.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::plane::PlaneCoordinate;
use crate::shape::{RemoteShape, ShapeError, ShapeId};

/// Server-assigned identifier of an ROI.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoiId(pub u64);

impl fmt::Display for RoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "roi:{}", self.0)
    }
}

/// Stable handle to a shape entry inside one [`RemoteRoi`].
///
/// Keys are allocated monotonically and never reused within an ROI, so a key
/// held across removals never aliases a different shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeKey(u32);

#[derive(Clone, Debug, PartialEq)]
struct Entry {
    key: ShapeKey,
    shape: RemoteShape,
}

type PlaneIndex = BTreeMap<PlaneCoordinate, SmallVec<[ShapeKey; 2]>>;

/// An ROI as stored on the server.
///
/// Shapes live in a low-level entry list; the plane index
/// (`PlaneCoordinate -> shapes`) is derived from it. Every structural change
/// goes through a method that keeps the index consistent, so removing a shape
/// after its plane changed never leaves a stale index entry behind.
///
/// `version` is the optimistic-lock token of the last server state this value
/// reflects; saving with an outdated token is rejected by the server.
#[derive(Clone, Debug, Default)]
pub struct RemoteRoi {
    /// Server id; `None` until persisted.
    pub id: Option<RoiId>,
    /// Optimistic-lock token.
    pub version: Option<u64>,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    entries: Vec<Entry>,
    index: PlaneIndex,
    next_key: u32,
}

impl PartialEq for RemoteRoi {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.version == other.version
            && self.name == other.name
            && self.description == other.description
            && self.shapes().eq(other.shapes())
    }
}

impl RemoteRoi {
    /// Creates an empty, unpersisted ROI.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty ROI with a name.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates an ROI holding `shapes`.
    #[must_use]
    pub fn from_shapes(shapes: impl IntoIterator<Item = RemoteShape>) -> Self {
        let mut roi = Self::new();
        for s in shapes {
            roi.add_shape(s);
        }
        roi
    }

    /// Appends a shape and returns its key.
    pub fn add_shape(&mut self, shape: RemoteShape) -> ShapeKey {
        let key = ShapeKey(self.next_key);
        self.next_key += 1;
        self.index.entry(shape.plane).or_default().push(key);
        self.entries.push(Entry { key, shape });
        key
    }

    /// Removes a shape from the entry list and rebuilds the plane index.
    ///
    /// Returns `None` if `key` is not part of this ROI.
    pub fn remove_shape(&mut self, key: ShapeKey) -> Option<RemoteShape> {
        let pos = self.position(key)?;
        let entry = self.entries.remove(pos);
        self.rebuild_index();
        Some(entry.shape)
    }

    /// Removes every shape.
    pub fn clear_shapes(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Shape under `key`.
    #[must_use]
    pub fn shape(&self, key: ShapeKey) -> Option<&RemoteShape> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.shape)
    }

    /// Mutates the shape under `key`, re-indexing it if its plane changed.
    ///
    /// Returns `None` if `key` is not part of this ROI.
    pub fn modify_shape<R>(
        &mut self,
        key: ShapeKey,
        f: impl FnOnce(&mut RemoteShape) -> R,
    ) -> Option<R> {
        let pos = self.position(key)?;
        let shape = &mut self.entries[pos].shape;
        let before = shape.plane;
        let out = f(shape);
        if shape.plane != before {
            self.rebuild_index();
        }
        Some(out)
    }

    /// Position of `key` in insertion order.
    #[must_use]
    pub fn position(&self, key: ShapeKey) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    /// Shapes in insertion order.
    pub fn shapes(&self) -> impl ExactSizeIterator<Item = &RemoteShape> + Clone + '_ {
        self.entries.iter().map(|e| &e.shape)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = ShapeKey> + '_ {
        self.entries.iter().map(|e| e.key)
    }

    /// `(key, shape)` pairs in insertion order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = (ShapeKey, &RemoteShape)> + '_ {
        self.entries.iter().map(|e| (e.key, &e.shape))
    }

    /// Number of shapes.
    #[must_use]
    pub fn shape_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ROI has no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key of the shape with server id `id`.
    #[must_use]
    pub fn find_by_id(&self, id: ShapeId) -> Option<ShapeKey> {
        self.entries
            .iter()
            .find(|e| e.shape.id == Some(id))
            .map(|e| e.key)
    }

    /// Keys of the shapes stored exactly at `plane`.
    #[must_use]
    pub fn shapes_on_plane(&self, plane: PlaneCoordinate) -> &[ShapeKey] {
        self.index
            .get(&plane)
            .map(|keys| keys.as_slice())
            .unwrap_or_default()
    }

    /// Planes that hold at least one shape, in order.
    pub fn planes(&self) -> impl Iterator<Item = PlaneCoordinate> + '_ {
        self.index.keys().copied()
    }

    /// Recomputes the plane index from the entry list.
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for e in &self.entries {
            self.index.entry(e.shape.plane).or_default().push(e.key);
        }
    }

    /// Forgets every server id, so that saving creates new objects.
    pub fn clear_ids(&mut self) {
        self.id = None;
        self.version = None;
        for e in &mut self.entries {
            e.shape.id = None;
        }
    }

    /// Copies server identity from `saved` into this ROI.
    ///
    /// The ROI id and version are taken over, and each local shape receives the
    /// id of an equivalent saved shape (see [`RemoteShape::equivalent`]). Each
    /// saved shape is matched at most once. On failure nothing is modified.
    pub fn adopt_ids(&mut self, saved: &Self) -> Result<(), ShapeError> {
        let mut used: Vec<bool> = alloc::vec![false; saved.entries.len()];
        let mut ids = Vec::with_capacity(self.entries.len());
        for (position, e) in self.entries.iter().enumerate() {
            let found = saved
                .entries
                .iter()
                .enumerate()
                .find(|(i, s)| !used[*i] && s.shape.equivalent(&e.shape));
            let Some((i, s)) = found else {
                return Err(ShapeError::MissingShape { position });
            };
            used[i] = true;
            ids.push(s.shape.id);
        }
        for (e, id) in self.entries.iter_mut().zip(ids) {
            e.shape.id = id;
        }
        self.id = saved.id;
        self.version = saved.version;
        Ok(())
    }
}
