//! Error types for field index operations

use crate::types::{Bounds, Point};
use std::fmt;
use thiserror::Error;

/// How a missing entry was looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Name(String),
    Point(Point),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Name(name) => write!(f, "named '{name}'"),
            Lookup::Point(point) => write!(f, "at {point}"),
        }
    }
}

/// Failures reported by [`SpatialIndex`](crate::SpatialIndex) operations.
///
/// Every variant is recoverable. An operation that returns one of these has
/// not modified the index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("point {point} lies outside the field {bounds}")]
    OutOfBounds { point: Point, bounds: Bounds },

    #[error("point {0} is already occupied")]
    DuplicatePoint(Point),

    #[error("an entry named '{0}' already exists")]
    DuplicateName(String),

    #[error("no entry {0}")]
    NotFound(Lookup),
}

impl IndexError {
    /// True for the failures a mover should answer by turning around.
    pub fn is_blocked_move(&self) -> bool {
        matches!(
            self,
            IndexError::OutOfBounds { .. } | IndexError::DuplicatePoint(_)
        )
    }

    pub(crate) fn name_not_found(name: &str) -> Self {
        IndexError::NotFound(Lookup::Name(name.to_string()))
    }

    pub(crate) fn point_not_found(point: Point) -> Self {
        IndexError::NotFound(Lookup::Point(point))
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
