// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Roibridge Tree: ROI hierarchies and session workflows.
//!
//! This crate sits on top of [`roibridge_region`] and talks to a remote shape
//! store through the [`Session`] trait:
//!
//! - [`RoiTree`] and [`RoiCollection`]: downloaded ROIs as collections of
//!   elements, with local edits buffered until [`RoiCollection::data`] flushes
//!   them into the remote shapes.
//! - [`RoiCache`]: the identity map (local object to uploaded ROI) and the
//!   version map (ROI id to latest known server state).
//! - [`RoiBridge`]: upload, download, resynchronize and delete workflows that
//!   keep the cache current.
//! - [`LazyRoiTree`] and [`LazyTableList`]: memoized fetches performed once,
//!   on first access.
//! - [`SessionStack`]: scoped tracking of the current session.
//!
//! [`InMemorySession`] implements [`Session`] over in-process maps, with the
//! same versioning and id assignment rules a server applies.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use roibridge_region::Region;
//! use roibridge_shape::BoundaryType;
//! use roibridge_tree::{ImageId, InMemorySession, RoiBridge};
//!
//! let session = Arc::new(InMemorySession::new());
//! let mut bridge = RoiBridge::new(Arc::clone(&session));
//!
//! let region = Region::rect(0.0, 0.0, 8.0, 8.0, BoundaryType::Closed);
//! let first = bridge.upload_region(ImageId(1), 7_u64, &region).unwrap();
//! let again = bridge.upload_region(ImageId(1), 7_u64, &region).unwrap();
//!
//! // The second upload updated the ROI created by the first.
//! assert_eq!(first.id, again.id);
//! assert_eq!(session.roi_count(), 1);
//! ```
//!
//! ## Logging
//!
//! Workflows emit [`tracing`] events: `debug` for fetches and cache hits,
//! `info` for completed saves and deletes, `warn` and `error` for failures
//! that are recovered from.

mod bridge;
mod cache;
mod error;
mod lazy;
mod memory;
mod options;
mod scope;
mod session;
mod tree;

pub use bridge::{LEGACY_BOUNDARY_KEY, RoiBridge, SyncReport};
pub use cache::RoiCache;
pub use error::{BridgeError, BridgeResult, SessionError, SessionErrorKind};
pub use lazy::{LazyRoiTree, LazyTableList};
pub use memory::{CallCounts, InMemorySession};
pub use options::BridgeOptions;
pub use scope::{SessionScope, SessionStack};
pub use session::{AssignedIds, ImageId, ObjectRef, Session, TableInfo};
pub use tree::{ElementId, RoiCollection, RoiTree};
