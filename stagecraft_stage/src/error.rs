// Copyright 2025 the Stagecraft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised when building a stage from a serialized description.
//!
//! Integrity problems reachable through normal editing never error: they are
//! reported as `bool`, `Option`, or empty results. Only malformed input at the
//! serialization boundary is an error.

use thiserror::Error;

use crate::id::ObjectId;

/// Failure while loading a [`SerializedStage`](crate::SerializedStage).
#[derive(Debug, Error)]
pub enum LoadError {
    /// A pen stroke path is not in `x,y,width~x,y,width~...` form.
    #[error("invalid pen stroke `{id}`: {reason}")]
    InvalidPenStroke {
        /// The offending stroke.
        id: ObjectId,
        /// What was wrong with the path.
        reason: &'static str,
    },
    /// A spline edge carries fewer than four control points.
    #[error("spline edge `{id}` has {count} control points, at least 4 are required")]
    TooFewControlPoints {
        /// The offending edge.
        id: ObjectId,
        /// Number of control points found.
        count: usize,
    },
    /// Two objects share an identifier.
    #[error("duplicate object id `{0}`")]
    DuplicateId(ObjectId),
}
