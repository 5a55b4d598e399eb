// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The remote session interface.

use std::fmt;

use roibridge_shape::{RemoteRoi, RoiId, ShapeId};

use crate::error::SessionError;

/// Identifier of a remote image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image:{}", self.0)
    }
}

/// A deletable remote object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ObjectRef {
    /// An ROI and all of its shapes.
    Roi(RoiId),
    /// One shape.
    Shape(ShapeId),
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Roi(id) => id.fmt(f),
            Self::Shape(id) => id.fmt(f),
        }
    }
}

/// Descriptor of a table attached to an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableInfo {
    /// Server id.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// Ids assigned by [`Session::save_new_shapes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignedIds {
    /// The new ROI.
    pub roi: RoiId,
    /// One id per saved shape, in shape order.
    pub shapes: Vec<ShapeId>,
}

/// Blocking access to a remote ROI store.
///
/// All calls are synchronous and return only after the server answered.
/// There is no cancellation. Implementations decide about connection reuse;
/// callers never retry on their own.
pub trait Session {
    /// All ROIs linked to `image`.
    fn fetch_rois_for_image(&self, image: ImageId) -> Result<Vec<RemoteRoi>, SessionError>;

    /// One ROI with its current version.
    fn fetch_roi(&self, roi: RoiId) -> Result<RemoteRoi, SessionError>;

    /// Creates a new ROI on `image` holding the shapes of `roi`.
    ///
    /// Existing ids in `roi` are ignored.
    fn save_new_shapes(&self, image: ImageId, roi: &RemoteRoi)
    -> Result<AssignedIds, SessionError>;

    /// Replaces the stored state of an existing ROI and returns the result.
    ///
    /// Shapes without an id are created, stored shapes missing from `roi` are
    /// deleted. Fails with
    /// [`StaleVersion`](crate::SessionErrorKind::StaleVersion) when
    /// `roi.version` is not the stored version.
    fn save_existing_object(&self, roi: RemoteRoi) -> Result<RemoteRoi, SessionError>;

    /// Deletes an ROI or a shape.
    fn delete_object(&self, object: ObjectRef) -> Result<(), SessionError>;

    /// Key/value annotations attached to a shape.
    fn query_annotations(&self, shape: ShapeId) -> Result<Vec<(String, String)>, SessionError>;

    /// Tables attached to `image`.
    fn fetch_tables_for_image(&self, image: ImageId) -> Result<Vec<TableInfo>, SessionError> {
        let _ = image;
        Ok(Vec::new())
    }
}
