// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred, memoized remote fetches.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::session::{ImageId, Session, TableInfo};
use crate::tree::RoiTree;

/// The ROI tree of an image, fetched on first access.
///
/// The first call to [`children`](Self::children) performs exactly one
/// [`Session::fetch_rois_for_image`], even when several threads race for it;
/// the others block until the result is available. The result is kept for the
/// lifetime of the loader. A failed fetch is logged and memoized as an empty
/// tree.
pub struct LazyRoiTree<S> {
    session: Arc<S>,
    image: ImageId,
    tree: OnceCell<RoiTree>,
}

impl<S> fmt::Debug for LazyRoiTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRoiTree")
            .field("image", &self.image)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl<S: Session> LazyRoiTree<S> {
    /// Creates a loader; nothing is fetched yet.
    pub fn new(session: Arc<S>, image: ImageId) -> Self {
        Self {
            session,
            image,
            tree: OnceCell::new(),
        }
    }

    /// The image whose ROIs are loaded.
    pub fn image(&self) -> ImageId {
        self.image
    }

    /// The tree, fetching it on first access.
    pub fn children(&self) -> &RoiTree {
        self.tree
            .get_or_init(|| fetch_tree(self.session.as_ref(), self.image))
    }

    /// Takes the tree out of the loader, fetching it if necessary.
    pub fn into_children(self) -> RoiTree {
        let Self {
            session,
            image,
            tree,
        } = self;
        tree.into_inner()
            .unwrap_or_else(|| fetch_tree(session.as_ref(), image))
    }
}

impl<S> LazyRoiTree<S> {
    /// Whether the fetch already happened.
    pub fn is_loaded(&self) -> bool {
        self.tree.get().is_some()
    }
}

fn fetch_tree<S: Session>(session: &S, image: ImageId) -> RoiTree {
    match session.fetch_rois_for_image(image) {
        Ok(rois) => {
            tracing::debug!("lazily loaded {} ROIs for {}", rois.len(), image);
            RoiTree::from_rois(rois)
        }
        Err(e) => {
            tracing::error!("failed to load ROIs for {}: {}", image, e);
            RoiTree::new()
        }
    }
}

/// The tables of an image, fetched on first access.
///
/// Same loading rules as [`LazyRoiTree`].
pub struct LazyTableList<S> {
    session: Arc<S>,
    image: ImageId,
    tables: OnceCell<Vec<TableInfo>>,
}

impl<S> fmt::Debug for LazyTableList<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyTableList")
            .field("image", &self.image)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl<S: Session> LazyTableList<S> {
    /// Creates a loader; nothing is fetched yet.
    pub fn new(session: Arc<S>, image: ImageId) -> Self {
        Self {
            session,
            image,
            tables: OnceCell::new(),
        }
    }

    /// The tables, fetching them on first access.
    pub fn tables(&self) -> &[TableInfo] {
        self.tables.get_or_init(|| {
            match self.session.fetch_tables_for_image(self.image) {
                Ok(tables) => tables,
                Err(e) => {
                    tracing::error!("failed to load tables for {}: {}", self.image, e);
                    Vec::new()
                }
            }
        })
    }
}

impl<S> LazyTableList<S> {
    /// Whether the fetch already happened.
    pub fn is_loaded(&self) -> bool {
        self.tables.get().is_some()
    }
}
