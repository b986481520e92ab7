//! # The Field Index Contract
//!
//! [`SpatialIndex`] is the operation set shared by [`RegionQuadTree`] and
//! [`KdTree`]. Game code holds a `Box<dyn SpatialIndex>` and never needs to
//! know which variant is behind it.
//!
//! ## Invariants
//!
//! - No two live entries share a name.
//! - No two live entries share a point.
//! - Every mutating operation validates all failure conditions before touching
//!   a node, so an `Err` return leaves the index exactly as it was.
//!
//! ## Concurrency
//!
//! Indexes are plain single-writer values. Hosts that share one across threads
//! wrap it in a single lock per field.

use crate::config::FieldConfig;
use crate::error::{IndexError, IndexResult};
use crate::kdtree::KdTree;
use crate::quadtree::RegionQuadTree;
use crate::stats::IndexStats;
use crate::types::{Bounds, Diagonal, Direction, Entry, Point};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which tree backs an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    #[default]
    QuadTree,
    KdTree,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::QuadTree => f.write_str("quadtree"),
            IndexKind::KdTree => f.write_str("kdtree"),
        }
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quadtree" | "quad" => Ok(IndexKind::QuadTree),
            "kdtree" | "kd" | "2dtree" => Ok(IndexKind::KdTree),
            other => Err(format!("unknown index kind '{other}'")),
        }
    }
}

/// Mutable point-location index over one bounded field.
pub trait SpatialIndex: fmt::Debug + Send {
    fn kind(&self) -> IndexKind;

    /// The field rectangle every entry must lie in.
    fn bounds(&self) -> Bounds;

    /// Current point of the entry called `name`. O(n).
    fn locate(&self, name: &str) -> Option<Point>;

    /// Name of the entry stored at exactly `point`. O(log n) on average.
    fn name_at(&self, point: Point) -> Option<&str>;

    /// Adds a new entry.
    ///
    /// # Errors
    ///
    /// `OutOfBounds`, `DuplicatePoint` and `DuplicateName`, checked in that order.
    fn insert(&mut self, name: &str, point: Point) -> IndexResult<()>;

    /// Removes the entry called `name`, returning it.
    ///
    /// Returns `NotFound` without touching the index if no such entry exists.
    fn remove(&mut self, name: &str) -> IndexResult<Entry>;

    /// Removes the entry stored at `point`, returning it.
    fn remove_point(&mut self, point: Point) -> IndexResult<Entry>;

    /// Moves the entry at `point` by `steps` cells and returns its new point.
    fn move_point(&mut self, point: Point, direction: Direction, steps: u32) -> IndexResult<Point>;

    /// Names of all entries inside [`Diagonal::query_box`] of `anchor`.
    fn names_in_range(&self, anchor: Point, direction: Diagonal, distance: u32) -> Vec<String>;

    fn size(&self) -> usize;

    /// Node count of the longest root-to-entry path. An empty index has height 0.
    fn height(&self) -> usize;

    /// Edges between the root and the node storing `point`.
    fn depth(&self, point: Point) -> Option<usize>;

    /// True when the root has no children.
    fn is_leaf(&self) -> bool;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Every live entry, in traversal order.
    fn entries(&self) -> Vec<Entry>;

    fn clear(&mut self);

    /// Rebuilds the tree from its current entries.
    fn rebalance(&mut self);

    fn stats(&self) -> IndexStats;

    fn contains(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }

    fn contains_point(&self, point: Point) -> bool {
        self.name_at(point).is_some()
    }

    /// Moves the entry called `name`; see [`SpatialIndex::move_point`].
    fn move_entry(&mut self, name: &str, direction: Direction, steps: u32) -> IndexResult<Point> {
        let from = self
            .locate(name)
            .ok_or_else(|| IndexError::name_not_found(name))?;
        self.move_point(from, direction, steps)
    }

    fn depth_of(&self, name: &str) -> Option<usize> {
        self.depth(self.locate(name)?)
    }

    /// Runs every insertion check without mutating anything.
    fn validate_insert(&self, name: &str, point: Point) -> IndexResult<()> {
        let bounds = self.bounds();
        if !bounds.contains(point) {
            return Err(IndexError::OutOfBounds { point, bounds });
        }
        if self.contains_point(point) {
            return Err(IndexError::DuplicatePoint(point));
        }
        if self.contains(name) {
            return Err(IndexError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Resolves the target of a move, failing before any mutation.
    ///
    /// A zero-step move resolves to `from` itself.
    fn validate_move(&self, from: Point, direction: Direction, steps: u32) -> IndexResult<Point> {
        if !self.contains_point(from) {
            return Err(IndexError::point_not_found(from));
        }
        let target = direction.step(from, steps);
        if target == from {
            return Ok(target);
        }
        let bounds = self.bounds();
        if !bounds.contains(target) {
            return Err(IndexError::OutOfBounds { point: target, bounds });
        }
        if self.contains_point(target) {
            return Err(IndexError::DuplicatePoint(target));
        }
        Ok(target)
    }
}

/// Builds the index variant selected by `config`.
pub fn build_index(config: &FieldConfig) -> Box<dyn SpatialIndex> {
    match config.kind {
        IndexKind::QuadTree => Box::new(RegionQuadTree::from_config(config)),
        IndexKind::KdTree => Box::new(KdTree::from_config(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("quadtree".parse::<IndexKind>(), Ok(IndexKind::QuadTree));
        assert_eq!("KD".parse::<IndexKind>(), Ok(IndexKind::KdTree));
        assert!("octree".parse::<IndexKind>().is_err());
        assert_eq!(IndexKind::KdTree.to_string(), "kdtree");
    }

    #[test]
    fn test_build_index_honours_kind() {
        let mut config = FieldConfig::new(50, 50);
        assert_eq!(build_index(&config).kind(), IndexKind::QuadTree);
        config.kind = IndexKind::KdTree;
        let index = build_index(&config);
        assert_eq!(index.kind(), IndexKind::KdTree);
        assert_eq!(index.bounds(), Bounds::field(50, 50));
    }

    #[test]
    fn test_validate_move_order() {
        let mut index = build_index(&FieldConfig::new(10, 10));
        index.insert("a", Point::new(0, 0)).unwrap();
        index.insert("b", Point::new(0, 2)).unwrap();

        assert!(matches!(
            index.validate_move(Point::new(0, 0), Direction::North, 1),
            Err(IndexError::OutOfBounds { .. })
        ));
        assert_eq!(
            index.validate_move(Point::new(0, 0), Direction::South, 2),
            Err(IndexError::DuplicatePoint(Point::new(0, 2)))
        );
        assert_eq!(
            index.validate_move(Point::new(0, 0), Direction::South, 0),
            Ok(Point::new(0, 0))
        );
        assert_eq!(
            index.validate_move(Point::new(5, 5), Direction::South, 1),
            Err(IndexError::point_not_found(Point::new(5, 5)))
        );
    }
}
