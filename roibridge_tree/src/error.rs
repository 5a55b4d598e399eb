// Copyright 2026 the Roibridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for session calls and bridge workflows.

use std::fmt;

use roibridge_region::ConversionError;
use roibridge_shape::{RoiId, ShapeError, ShapeId};
use thiserror::Error;

use crate::tree::ElementId;

/// What went wrong in a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// The call did not reach the server or failed in transit.
    Communication,
    /// The addressed object does not exist.
    NotFound,
    /// The object changed on the server since the version being saved.
    StaleVersion,
}

impl SessionErrorKind {
    /// Short machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Communication => "communication",
            Self::NotFound => "not_found",
            Self::StaleVersion => "stale_version",
        }
    }
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a [`Session`](crate::Session) call.
///
/// Session errors are never retried by this crate.
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct SessionError {
    /// Category.
    pub kind: SessionErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Underlying transport error, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SessionError {
    /// Creates an error without a source.
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Communication failure.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::Communication, message)
    }

    /// Missing object.
    pub fn not_found(what: impl fmt::Display) -> Self {
        Self::new(SessionErrorKind::NotFound, format!("{what} not found"))
    }

    /// Optimistic-lock conflict.
    pub fn stale_version(roi: RoiId, expected: Option<u64>, found: Option<u64>) -> Self {
        Self::new(
            SessionErrorKind::StaleVersion,
            format!("{roi} is at version {found:?}, save was based on {expected:?}"),
        )
    }

    /// Whether this is an optimistic-lock conflict.
    pub fn is_stale(&self) -> bool {
        self.kind == SessionErrorKind::StaleVersion
    }
}

/// Errors raised by the ROI hierarchy and bridge workflows.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A region or shape could not be converted.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// A remote call failed.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// A shape model operation failed.
    #[error(transparent)]
    Shape(#[from] ShapeError),
    /// The element is not part of the collection.
    #[error("element {0} is not part of this collection")]
    UnknownElement(ElementId),
    /// No element sits at the index.
    #[error("index {index} is out of range for a collection of {len} elements")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of elements in the collection.
        len: usize,
    },
    /// The element's backing shape vanished from the ROI.
    #[error("element {0} has no backing shape in the ROI")]
    MissingShape(ElementId),
    /// The element has not been saved yet and has no remote shape to bind.
    #[error("element {0} is not persisted; edit its local region instead")]
    PendingElement(ElementId),
    /// The shape is not part of the ROI.
    #[error("{shape} is not part of {roi}")]
    ShapeNotInRoi {
        /// The shape.
        shape: ShapeId,
        /// The ROI.
        roi: RoiId,
    },
}

impl BridgeError {
    /// Whether this wraps an optimistic-lock conflict.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Session(e) if e.is_stale())
    }
}

/// Result alias for bridge workflows.
pub type BridgeResult<T> = Result<T, BridgeError>;
