//! # Geometry Primitives
//!
//! Value types shared by every index in this crate: integer points, inclusive
//! bounding boxes, the cardinal and diagonal compass vocabulary, and split axes.
//!
//! ## Coordinate Convention
//!
//! The field is a screen-style grid: `x` grows to the east and `y` grows to the
//! south. Moving north therefore decreases `y`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Points and Boxes
// ============================================================================

/// An integer location on the field.
///
/// Coordinates are signed so that a movement target can be computed before it
/// is rejected for leaving the field.
///
/// # Examples
///
/// ```rust
/// use pursuit_field::Point;
///
/// let spawn = Point::new(10, 20);
/// assert_eq!(spawn.to_string(), "(10, 20)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl From<(i64, i64)> for Point {
    fn from((x, y): (i64, i64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Inclusive axis-aligned box.
///
/// A box whose `min` exceeds its `max` on either axis is empty; such boxes are
/// produced when a one-cell wide region is bisected and never contain a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// The field rectangle `(0, 0)`–`(width, height)`.
    pub const fn field(width: i64, height: i64) -> Self {
        Self::new(Point::new(0, 0), Point::new(width, height))
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// True when the two boxes share at least one cell. Edges are inclusive.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Floor midpoint of the box.
    pub fn centre(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x).div_euclid(2),
            (self.min.y + self.max.y).div_euclid(2),
        )
    }

    /// The part of this box lying in `quadrant` relative to `centre`.
    ///
    /// The centre lines belong to the west and north halves, matching
    /// [`Diagonal::quadrant_of`].
    pub fn quadrant_bounds(&self, centre: Point, quadrant: Diagonal) -> Bounds {
        let (min_x, max_x) = if quadrant.is_east() {
            (centre.x + 1, self.max.x)
        } else {
            (self.min.x, centre.x.min(self.max.x))
        };
        let (min_y, max_y) = if quadrant.is_south() {
            (centre.y + 1, self.max.y)
        } else {
            (self.min.y, centre.y.min(self.max.y))
        };
        Bounds::new(Point::new(min_x.max(self.min.x), min_y.max(self.min.y)), Point::new(max_x, max_y))
    }

    /// Splits the box at `value` on `axis` into the `<= value` and `> value` halves.
    pub fn split(&self, axis: Axis, value: i64) -> (Bounds, Bounds) {
        let mut lower = *self;
        let mut upper = *self;
        match axis {
            Axis::X => {
                lower.max.x = value.min(self.max.x);
                upper.min.x = (value + 1).max(self.min.x);
            }
            Axis::Y => {
                lower.max.y = value.min(self.max.y);
                upper.min.y = (value + 1).max(self.min.y);
            }
        }
        (lower, upper)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] x [{}, {}]",
            self.min.x, self.max.x, self.min.y, self.max.y
        )
    }
}

// ============================================================================
// Compass Vocabulary
// ============================================================================

/// Cardinal movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N", alias = "north")]
    North,
    #[serde(rename = "S", alias = "south")]
    South,
    #[serde(rename = "E", alias = "east")]
    East,
    #[serde(rename = "W", alias = "west")]
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Offsets `point` by `steps` cells in this direction.
    pub fn step(self, point: Point, steps: u32) -> Point {
        let steps = i64::from(steps);
        match self {
            Direction::North => Point::new(point.x, point.y - steps),
            Direction::South => Point::new(point.x, point.y + steps),
            Direction::East => Point::new(point.x + steps, point.y),
            Direction::West => Point::new(point.x - steps, point.y),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::South => "S",
            Direction::East => "E",
            Direction::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a compass label cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compass direction '{0}'")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(Direction::North),
            "s" | "south" => Ok(Direction::South),
            "e" | "east" => Ok(Direction::East),
            "w" | "west" => Ok(Direction::West),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// Diagonal compass direction.
///
/// Serves both as the direction of a range query and as the label of a
/// quadtree quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagonal {
    #[serde(rename = "NE", alias = "northeast")]
    NorthEast,
    #[serde(rename = "NW", alias = "northwest")]
    NorthWest,
    #[serde(rename = "SE", alias = "southeast")]
    SouthEast,
    #[serde(rename = "SW", alias = "southwest")]
    SouthWest,
}

impl Diagonal {
    pub const ALL: [Diagonal; 4] = [
        Diagonal::NorthEast,
        Diagonal::NorthWest,
        Diagonal::SouthEast,
        Diagonal::SouthWest,
    ];

    pub fn is_east(self) -> bool {
        matches!(self, Diagonal::NorthEast | Diagonal::SouthEast)
    }

    pub fn is_south(self) -> bool {
        matches!(self, Diagonal::SouthEast | Diagonal::SouthWest)
    }

    /// Slot of this quadrant in a four-element child array.
    pub fn index(self) -> usize {
        match self {
            Diagonal::NorthEast => 0,
            Diagonal::NorthWest => 1,
            Diagonal::SouthEast => 2,
            Diagonal::SouthWest => 3,
        }
    }

    /// Quadrant of `point` relative to `centre`.
    ///
    /// Points on the vertical centre line count as west, points on the
    /// horizontal centre line count as north.
    pub fn quadrant_of(centre: Point, point: Point) -> Diagonal {
        match (point.x > centre.x, point.y > centre.y) {
            (true, false) => Diagonal::NorthEast,
            (false, false) => Diagonal::NorthWest,
            (true, true) => Diagonal::SouthEast,
            (false, true) => Diagonal::SouthWest,
        }
    }

    /// The square with `anchor` as one corner extending `distance` cells along
    /// both axes in this direction. Inclusive on every edge.
    ///
    /// ```rust
    /// use pursuit_field::{Bounds, Diagonal, Point};
    ///
    /// let area = Diagonal::SouthEast.query_box(Point::new(100, 100), 10);
    /// assert_eq!(area, Bounds::new(Point::new(100, 100), Point::new(110, 110)));
    /// ```
    pub fn query_box(self, anchor: Point, distance: u32) -> Bounds {
        let d = i64::from(distance);
        let (min_x, max_x) = if self.is_east() {
            (anchor.x, anchor.x + d)
        } else {
            (anchor.x - d, anchor.x)
        };
        let (min_y, max_y) = if self.is_south() {
            (anchor.y, anchor.y + d)
        } else {
            (anchor.y - d, anchor.y)
        };
        Bounds::new(Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Diagonal::NorthEast => "NE",
            Diagonal::NorthWest => "NW",
            Diagonal::SouthEast => "SE",
            Diagonal::SouthWest => "SW",
        }
    }
}

impl fmt::Display for Diagonal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Diagonal {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ne" | "northeast" => Ok(Diagonal::NorthEast),
            "nw" | "northwest" => Ok(Diagonal::NorthWest),
            "se" | "southeast" => Ok(Diagonal::SouthEast),
            "sw" | "southwest" => Ok(Diagonal::SouthWest),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

/// Coordinate a kd-tree level partitions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Split axis of a kd-tree level: `X` at even depths, `Y` at odd ones.
    pub fn at_depth(depth: usize) -> Axis {
        if depth % 2 == 0 {
            Axis::X
        } else {
            Axis::Y
        }
    }

    pub fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }

    pub fn coord(self, point: Point) -> i64 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// A named entity stored at a point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub point: Point,
}

impl Entry {
    pub fn new(name: impl Into<String>, point: Point) -> Self {
        Self {
            name: name.into(),
            point,
        }
    }
}
