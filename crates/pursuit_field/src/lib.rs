//! # Pursuit Field
//!
//! Mutable spatial indexes for pursuit-style games (tag, zombie tag,
//! elimination tag) played on a bounded integer field. Entities are stored as
//! uniquely named, uniquely placed entries and queried for whoever is nearby
//! once per simulation tick.
//!
//! Two interchangeable implementations share the [`SpatialIndex`] contract:
//!
//! - [`RegionQuadTree`] - four-way subdivision around explicit node boxes,
//!   suited to entities that cluster unevenly.
//! - [`KdTree`] - binary splits alternating between `x` and `y` per level,
//!   suited to uniform spreads.
//!
//! ## Quick Start
//!
//! ```rust
//! use pursuit_field::{build_index, Diagonal, Direction, FieldConfig, IndexKind, Point};
//!
//! let config = FieldConfig::new(200, 200).with_kind(IndexKind::KdTree);
//! let mut field = build_index(&config);
//!
//! field.insert("it", Point::new(100, 100)).unwrap();
//! field.insert("runner", Point::new(105, 105)).unwrap();
//!
//! let seen = field.names_in_range(Point::new(100, 100), Diagonal::SouthEast, 10);
//! assert_eq!(seen.len(), 2);
//!
//! // A blocked move tells the mover to turn around.
//! let err = field.move_entry("it", Direction::South, 200).unwrap_err();
//! assert!(err.is_blocked_move());
//! assert!(field.contains_point(Point::new(100, 100)));
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod kdtree;
pub mod quadtree;
pub mod stats;
pub mod types;

pub use config::FieldConfig;
pub use error::{IndexError, IndexResult, Lookup};
pub use index::{build_index, IndexKind, SpatialIndex};
pub use kdtree::{KdNode, KdTree};
pub use quadtree::{QuadTreeNode, RegionQuadTree};
pub use stats::IndexStats;
pub use types::{Axis, Bounds, Diagonal, Direction, Entry, ParseDirectionError, Point};
