//! Region quadtree over a bounded integer field
//!
//! Every node owns an explicit bounding box and a centre that splits the box
//! into four quadrants. A node stores at most one entry. A point arriving at an
//! occupied leaf becomes a child in its own quadrant, unless it shares the
//! resident's quadrant; then both are pushed down into freshly bisected
//! quadrants until they separate.

use crate::config::FieldConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::{IndexKind, SpatialIndex};
use crate::stats::{Counters, IndexStats, NodeTally};
use crate::types::{Bounds, Diagonal, Direction, Entry, Point};
use tracing::{debug, trace};

/// A node in the quadtree.
///
/// Non-root nodes are never vacant: a node left with neither an entry nor
/// children is pruned from its parent.
#[derive(Debug)]
pub struct QuadTreeNode {
    bounds: Bounds,
    centre: Point,
    entry: Option<Entry>,
    /// Child nodes indexed by [`Diagonal::index`]
    children: [Option<Box<QuadTreeNode>>; 4],
}

impl QuadTreeNode {
    fn new(bounds: Bounds, centre: Point) -> Self {
        Self {
            bounds,
            centre,
            entry: None,
            children: [None, None, None, None],
        }
    }

    fn holding(bounds: Bounds, entry: Entry) -> Self {
        let mut node = Self::new(bounds, bounds.centre());
        node.entry = Some(entry);
        node
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn centre(&self) -> Point {
        self.centre
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.entry.as_ref()
    }

    pub fn child(&self, quadrant: Diagonal) -> Option<&QuadTreeNode> {
        self.children[quadrant.index()].as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }

    /// No entry and no children.
    pub fn is_vacant(&self) -> bool {
        self.entry.is_none() && self.is_leaf()
    }

    fn child_bounds(&self, quadrant: Diagonal) -> Bounds {
        self.bounds.quadrant_bounds(self.centre, quadrant)
    }

    fn quadrant_of(&self, point: Point) -> Diagonal {
        Diagonal::quadrant_of(self.centre, point)
    }

    /// Stores `entry` below this node. The caller has checked that the point
    /// lies in this node's bounds and is not already occupied.
    fn insert(&mut self, entry: Entry) {
        if self.is_vacant() {
            self.entry = Some(entry);
            return;
        }

        let quadrant = self.quadrant_of(entry.point);

        // Two points sharing a leaf quadrant both move down a level.
        let collides = self.is_leaf()
            && self
                .entry
                .as_ref()
                .is_some_and(|resident| self.quadrant_of(resident.point) == quadrant);
        if collides {
            if let Some(resident) = self.entry.take() {
                debug!(
                    "Pushing '{}' down into {} of {}",
                    resident.name, quadrant, self.bounds
                );
                let child = QuadTreeNode::holding(self.child_bounds(quadrant), resident);
                self.children[quadrant.index()] = Some(Box::new(child));
            }
        }

        let child_bounds = self.child_bounds(quadrant);
        let slot = &mut self.children[quadrant.index()];
        match slot {
            Some(child) => child.insert(entry),
            None => *slot = Some(Box::new(QuadTreeNode::holding(child_bounds, entry))),
        }
    }

    /// Finds the entry at `point` and the depth of the node storing it.
    fn find(&self, point: Point) -> Option<(&Entry, usize)> {
        let mut node = self;
        let mut depth = 0;
        loop {
            if let Some(entry) = &node.entry {
                if entry.point == point {
                    return Some((entry, depth));
                }
            }
            node = node.children[node.quadrant_of(point).index()].as_deref()?;
            depth += 1;
        }
    }

    fn find_name(&self, name: &str) -> Option<&Entry> {
        if let Some(entry) = &self.entry {
            if entry.name == name {
                return Some(entry);
            }
        }
        self.children
            .iter()
            .flatten()
            .find_map(|child| child.find_name(name))
    }

    /// Detaches the entry at `point`, refilling or pruning emptied nodes.
    fn remove_point(&mut self, point: Point) -> Option<Entry> {
        if self.entry.as_ref().is_some_and(|entry| entry.point == point) {
            let removed = self.entry.take();
            if let Some(promoted) = self.take_leaf_entry() {
                debug!(
                    "Promoting '{}' from {} into node at {}",
                    promoted.name, promoted.point, self.bounds
                );
                self.entry = Some(promoted);
            }
            return removed;
        }

        let quadrant = self.quadrant_of(point);
        let slot = &mut self.children[quadrant.index()];
        let removed = slot.as_mut()?.remove_point(point);
        if slot.as_ref().is_some_and(|child| child.is_vacant()) {
            *slot = None;
        }
        removed
    }

    /// Takes the entry of the first leaf below this node and prunes every node
    /// that empties as a result.
    fn take_leaf_entry(&mut self) -> Option<Entry> {
        for slot in self.children.iter_mut() {
            let Some(child) = slot.as_mut() else {
                continue;
            };
            let taken = if child.is_leaf() {
                child.entry.take()
            } else {
                child.take_leaf_entry()
            };
            if child.is_vacant() {
                *slot = None;
            }
            if taken.is_some() {
                return taken;
            }
        }
        None
    }

    /// Rewrites the point of the entry at `from` when `to` stays inside the
    /// storing node's bounds. Returns false when the entry has to relocate.
    fn relocate(&mut self, from: Point, to: Point) -> bool {
        if let Some(entry) = self.entry.as_mut() {
            if entry.point == from {
                if self.bounds.contains(to) {
                    entry.point = to;
                    return true;
                }
                return false;
            }
        }
        let quadrant = self.quadrant_of(from);
        match self.children[quadrant.index()].as_mut() {
            Some(child) => child.relocate(from, to),
            None => false,
        }
    }

    fn collect_in(&self, area: &Bounds, names: &mut Vec<String>) {
        if !self.bounds.intersects(area) {
            return;
        }
        if let Some(entry) = &self.entry {
            if area.contains(entry.point) {
                names.push(entry.name.clone());
            }
        }
        for child in self.children.iter().flatten() {
            child.collect_in(area, names);
        }
    }

    fn collect_entries(&self, entries: &mut Vec<Entry>) {
        entries.extend(self.entry.iter().cloned());
        for child in self.children.iter().flatten() {
            child.collect_entries(entries);
        }
    }

    fn height(&self) -> usize {
        if self.is_vacant() {
            return 0;
        }
        1 + self
            .children
            .iter()
            .flatten()
            .map(|child| child.height())
            .max()
            .unwrap_or(0)
    }

    fn tally(&self, tally: &mut NodeTally) {
        tally.record(self.is_leaf());
        for child in self.children.iter().flatten() {
            child.tally(tally);
        }
    }
}

/// Region quadtree implementing [`SpatialIndex`].
#[derive(Debug)]
pub struct RegionQuadTree {
    /// Root node of the quadtree; persists even when empty
    root: QuadTreeNode,
    /// Live entries
    len: usize,
    counters: Counters,
}

impl RegionQuadTree {
    /// Creates a quadtree whose root splits the field at its midpoint.
    pub fn new(bounds: Bounds) -> Self {
        Self::with_centre(bounds, bounds.centre())
    }

    /// Creates a quadtree whose root splits the field at `centre`.
    pub fn with_centre(bounds: Bounds, centre: Point) -> Self {
        Self {
            root: QuadTreeNode::new(bounds, centre),
            len: 0,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &FieldConfig) -> Self {
        Self::with_centre(config.bounds(), config.root_centre())
    }

    pub fn root(&self) -> &QuadTreeNode {
        &self.root
    }

    /// Removes the entry at `point` without touching the counters.
    fn detach(&mut self, point: Point) -> IndexResult<Entry> {
        let entry = self
            .root
            .remove_point(point)
            .ok_or_else(|| IndexError::point_not_found(point))?;
        self.len -= 1;
        Ok(entry)
    }

    fn attach(&mut self, entry: Entry) {
        self.root.insert(entry);
        self.len += 1;
    }
}

impl SpatialIndex for RegionQuadTree {
    fn kind(&self) -> IndexKind {
        IndexKind::QuadTree
    }

    fn bounds(&self) -> Bounds {
        self.root.bounds
    }

    fn locate(&self, name: &str) -> Option<Point> {
        self.root.find_name(name).map(|entry| entry.point)
    }

    fn name_at(&self, point: Point) -> Option<&str> {
        if !self.root.bounds.contains(point) {
            return None;
        }
        self.root
            .find(point)
            .map(|(entry, _)| entry.name.as_str())
    }

    fn insert(&mut self, name: &str, point: Point) -> IndexResult<()> {
        self.validate_insert(name, point)?;
        trace!("Inserting '{}' at {}", name, point);
        self.attach(Entry::new(name, point));
        self.counters.inserts += 1;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> IndexResult<Entry> {
        let point = self
            .locate(name)
            .ok_or_else(|| IndexError::name_not_found(name))?;
        self.remove_point(point)
    }

    fn remove_point(&mut self, point: Point) -> IndexResult<Entry> {
        let entry = self.detach(point)?;
        trace!("Removed '{}' from {}", entry.name, point);
        self.counters.removals += 1;
        Ok(entry)
    }

    fn move_point(&mut self, point: Point, direction: Direction, steps: u32) -> IndexResult<Point> {
        let target = self.validate_move(point, direction, steps)?;
        if target == point {
            return Ok(target);
        }

        if self.root.relocate(point, target) {
            trace!("Moved entry at {} to {} in place", point, target);
            self.counters.moves_in_place += 1;
        } else {
            let mut entry = self.detach(point)?;
            debug!("Relocating '{}' from {} to {}", entry.name, point, target);
            entry.point = target;
            self.attach(entry);
            self.counters.moves_relocated += 1;
        }
        Ok(target)
    }

    fn names_in_range(&self, anchor: Point, direction: Diagonal, distance: u32) -> Vec<String> {
        let area = direction.query_box(anchor, distance);
        let mut names = Vec::new();
        self.root.collect_in(&area, &mut names);
        names
    }

    fn size(&self) -> usize {
        self.len
    }

    fn height(&self) -> usize {
        self.root.height()
    }

    fn depth(&self, point: Point) -> Option<usize> {
        if !self.root.bounds.contains(point) {
            return None;
        }
        self.root.find(point).map(|(_, depth)| depth)
    }

    fn is_leaf(&self) -> bool {
        self.root.is_leaf()
    }

    fn is_empty(&self) -> bool {
        self.root.is_vacant()
    }

    fn entries(&self) -> Vec<Entry> {
        let mut entries = Vec::with_capacity(self.len);
        self.root.collect_entries(&mut entries);
        entries
    }

    fn clear(&mut self) {
        self.root = QuadTreeNode::new(self.root.bounds, self.root.centre);
        self.len = 0;
    }

    fn rebalance(&mut self) {
        let entries = self.entries();
        self.clear();
        for entry in entries {
            self.attach(entry);
        }
        self.counters.rebalances += 1;
        debug!("Rebuilt quadtree with {} entries", self.len);
    }

    fn stats(&self) -> IndexStats {
        let mut tally = NodeTally::default();
        self.root.tally(&mut tally);
        IndexStats::assemble(
            IndexKind::QuadTree,
            self.len,
            self.height(),
            tally,
            self.counters,
        )
    }
}
