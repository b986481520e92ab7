//! Alternating-axis binary space partition ("kd-tree") over a bounded field
//!
//! A node at even depth splits on `x`, a node at odd depth on `y`. Entries
//! whose coordinate on the split axis is less than or equal to the node's go
//! into `less_or_equal`, strictly greater ones into `greater`. The axis is
//! never stored: it is recomputed from the level while traversing, so
//! restructuring never has to repair it.

use crate::config::FieldConfig;
use crate::error::{IndexError, IndexResult};
use crate::index::{IndexKind, SpatialIndex};
use crate::stats::{Counters, IndexStats, NodeTally};
use crate::types::{Axis, Bounds, Diagonal, Direction, Entry, Point};
use tracing::{debug, trace};

/// Trees smaller than this are never rebuilt automatically.
const MIN_AUTO_REBALANCE_SIZE: usize = 8;

/// A node in the kd-tree. Every node stores exactly one entry.
#[derive(Debug)]
pub struct KdNode {
    entry: Entry,
    less_or_equal: Option<Box<KdNode>>,
    greater: Option<Box<KdNode>>,
}

type Link = Option<Box<KdNode>>;

impl KdNode {
    fn new(entry: Entry) -> Self {
        Self {
            entry,
            less_or_equal: None,
            greater: None,
        }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn less_or_equal(&self) -> Option<&KdNode> {
        self.less_or_equal.as_deref()
    }

    pub fn greater(&self) -> Option<&KdNode> {
        self.greater.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.less_or_equal.is_none() && self.greater.is_none()
    }

    /// Child a point belongs to when this node sits at `depth`.
    fn branch_mut(&mut self, point: Point, depth: usize) -> &mut Link {
        let axis = Axis::at_depth(depth);
        if axis.coord(point) <= axis.coord(self.entry.point) {
            &mut self.less_or_equal
        } else {
            &mut self.greater
        }
    }

    fn branch(&self, point: Point, depth: usize) -> Option<&KdNode> {
        let axis = Axis::at_depth(depth);
        if axis.coord(point) <= axis.coord(self.entry.point) {
            self.less_or_equal.as_deref()
        } else {
            self.greater.as_deref()
        }
    }
}

/// Places `entry` below `slot` and returns the depth it landed at.
fn insert_at(slot: &mut Link, entry: Entry, depth: usize) -> usize {
    match slot {
        Some(node) => {
            let point = entry.point;
            insert_at(node.branch_mut(point, depth), entry, depth + 1)
        }
        None => {
            *slot = Some(Box::new(KdNode::new(entry)));
            depth
        }
    }
}

fn find(root: Option<&KdNode>, point: Point) -> Option<(&Entry, usize)> {
    let mut node = root?;
    let mut depth = 0;
    loop {
        if node.entry.point == point {
            return Some((&node.entry, depth));
        }
        node = node.branch(point, depth)?;
        depth += 1;
    }
}

fn find_name<'a>(node: Option<&'a KdNode>, name: &str) -> Option<&'a Entry> {
    let node = node?;
    if node.entry.name == name {
        return Some(&node.entry);
    }
    find_name(node.less_or_equal(), name).or_else(|| find_name(node.greater(), name))
}

/// Point with the largest coordinate on `axis` in the subtree rooted at `depth`.
fn max_on(node: Option<&KdNode>, axis: Axis, depth: usize) -> Option<Point> {
    let node = node?;
    let own = node.entry.point;
    if Axis::at_depth(depth) == axis {
        return Some(max_on(node.greater(), axis, depth + 1).unwrap_or(own));
    }
    [
        Some(own),
        max_on(node.less_or_equal(), axis, depth + 1),
        max_on(node.greater(), axis, depth + 1),
    ]
    .into_iter()
    .flatten()
    .max_by_key(|point| axis.coord(*point))
}

/// Point with the smallest coordinate on `axis` in the subtree rooted at `depth`.
fn min_on(node: Option<&KdNode>, axis: Axis, depth: usize) -> Option<Point> {
    let node = node?;
    let own = node.entry.point;
    if Axis::at_depth(depth) == axis {
        return Some(min_on(node.less_or_equal(), axis, depth + 1).unwrap_or(own));
    }
    [
        Some(own),
        min_on(node.less_or_equal(), axis, depth + 1),
        min_on(node.greater(), axis, depth + 1),
    ]
    .into_iter()
    .flatten()
    .min_by_key(|point| axis.coord(*point))
}

/// Detaches the entry at `point` from the subtree in `slot`.
///
/// A removed node with children takes over the entry with the largest
/// coordinate on its own axis from `less_or_equal`. When only `greater`
/// exists it is first moved into the `less_or_equal` slot: every entry in it
/// is at most that maximum, and the move keeps every node at its depth.
fn remove_at(slot: &mut Link, point: Point, depth: usize) -> Option<Entry> {
    let node = slot.as_mut()?;
    if node.entry.point != point {
        return remove_at(node.branch_mut(point, depth), point, depth + 1);
    }

    if node.is_leaf() {
        return slot.take().map(|node| node.entry);
    }

    if node.less_or_equal.is_none() {
        node.less_or_equal = node.greater.take();
    }
    let axis = Axis::at_depth(depth);
    let successor = max_on(node.less_or_equal(), axis, depth + 1)?;
    let replacement = remove_at(&mut node.less_or_equal, successor, depth + 1)?;
    debug!(
        "Replacing '{}' with '{}' at depth {}",
        node.entry.name, replacement.name, depth
    );
    Some(std::mem::replace(&mut node.entry, replacement))
}

/// Rewrites the entry at `from` to `to` when doing so keeps the partition
/// valid: `to` stays in the node's region and still separates its children.
fn relocate(slot: &mut Link, from: Point, to: Point, region: Bounds, depth: usize) -> bool {
    let Some(node) = slot.as_mut() else {
        return false;
    };
    let axis = Axis::at_depth(depth);
    let split = axis.coord(node.entry.point);

    if node.entry.point != from {
        let (lower, upper) = region.split(axis, split);
        return if axis.coord(from) <= split {
            relocate(&mut node.less_or_equal, from, to, lower, depth + 1)
        } else {
            relocate(&mut node.greater, from, to, upper, depth + 1)
        };
    }

    if !region.contains(to) {
        return false;
    }
    let target = axis.coord(to);
    let lower_fits = max_on(node.less_or_equal(), axis, depth + 1)
        .map_or(true, |p| axis.coord(p) <= target);
    let upper_fits = min_on(node.greater(), axis, depth + 1)
        .map_or(true, |p| axis.coord(p) > target);
    if lower_fits && upper_fits {
        node.entry.point = to;
        return true;
    }
    false
}

fn collect_in(
    node: Option<&KdNode>,
    region: Bounds,
    area: &Bounds,
    depth: usize,
    names: &mut Vec<String>,
) {
    let Some(node) = node else {
        return;
    };
    if !region.intersects(area) {
        return;
    }
    if area.contains(node.entry.point) {
        names.push(node.entry.name.clone());
    }
    let axis = Axis::at_depth(depth);
    let (lower, upper) = region.split(axis, axis.coord(node.entry.point));
    collect_in(node.less_or_equal(), lower, area, depth + 1, names);
    collect_in(node.greater(), upper, area, depth + 1, names);
}

fn collect_entries(node: Option<&KdNode>, entries: &mut Vec<Entry>) {
    if let Some(node) = node {
        collect_entries(node.less_or_equal(), entries);
        entries.push(node.entry.clone());
        collect_entries(node.greater(), entries);
    }
}

fn height(node: Option<&KdNode>) -> usize {
    node.map_or(0, |node| {
        1 + height(node.less_or_equal()).max(height(node.greater()))
    })
}

fn tally(node: Option<&KdNode>, tally_acc: &mut NodeTally) {
    if let Some(node) = node {
        tally_acc.record(node.is_leaf());
        tally(node.less_or_equal(), tally_acc);
        tally(node.greater(), tally_acc);
    }
}

/// Builds a median-split subtree. Entries tying the median on the split axis
/// all go left so the `<=` rule holds.
fn build_balanced(mut entries: Vec<Entry>, depth: usize) -> Link {
    if entries.is_empty() {
        return None;
    }
    let axis = Axis::at_depth(depth);
    entries.sort_by_key(|entry| (axis.coord(entry.point), axis.other().coord(entry.point)));

    let mut median = entries.len() / 2;
    let split = axis.coord(entries[median].point);
    while median + 1 < entries.len() && axis.coord(entries[median + 1].point) == split {
        median += 1;
    }
    let greater = entries.split_off(median + 1);
    let entry = entries.pop()?;

    Some(Box::new(KdNode {
        entry,
        less_or_equal: build_balanced(entries, depth + 1),
        greater: build_balanced(greater, depth + 1),
    }))
}

/// Kd-tree implementing [`SpatialIndex`].
#[derive(Debug)]
pub struct KdTree {
    bounds: Bounds,
    root: Link,
    len: usize,
    /// Rebuild when an insertion path exceeds this multiple of the ideal height
    rebalance_factor: Option<u32>,
    counters: Counters,
}

impl KdTree {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            root: None,
            len: 0,
            rebalance_factor: None,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &FieldConfig) -> Self {
        Self::new(config.bounds()).with_rebalance_factor(config.rebalance_factor)
    }

    pub fn with_rebalance_factor(mut self, factor: Option<u32>) -> Self {
        self.rebalance_factor = factor.filter(|factor| *factor > 0);
        self
    }

    pub fn root(&self) -> Option<&KdNode> {
        self.root.as_deref()
    }

    /// Height of a perfectly balanced tree holding the current entries.
    fn ideal_height(&self) -> usize {
        (usize::BITS - self.len.leading_zeros()) as usize
    }

    fn needs_rebalance(&self, path_len: usize) -> bool {
        match self.rebalance_factor {
            Some(factor) if self.len >= MIN_AUTO_REBALANCE_SIZE => {
                path_len > factor as usize * self.ideal_height()
            }
            _ => false,
        }
    }

    fn detach(&mut self, point: Point) -> IndexResult<Entry> {
        let entry = remove_at(&mut self.root, point, 0)
            .ok_or_else(|| IndexError::point_not_found(point))?;
        self.len -= 1;
        Ok(entry)
    }

    fn attach(&mut self, entry: Entry) {
        let depth = insert_at(&mut self.root, entry, 0);
        self.len += 1;
        if self.needs_rebalance(depth + 1) {
            debug!(
                "Insertion path of {} nodes exceeds bound for {} entries",
                depth + 1,
                self.len
            );
            self.rebalance();
        }
    }
}

impl SpatialIndex for KdTree {
    fn kind(&self) -> IndexKind {
        IndexKind::KdTree
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn locate(&self, name: &str) -> Option<Point> {
        find_name(self.root(), name).map(|entry| entry.point)
    }

    fn name_at(&self, point: Point) -> Option<&str> {
        find(self.root(), point).map(|(entry, _)| entry.name.as_str())
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

        if relocate(&mut self.root, point, target, self.bounds, 0) {
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
        collect_in(self.root(), self.bounds, &area, 0, &mut names);
        names
    }

    fn size(&self) -> usize {
        self.len
    }

    fn height(&self) -> usize {
        height(self.root())
    }

    fn depth(&self, point: Point) -> Option<usize> {
        find(self.root(), point).map(|(_, depth)| depth)
    }

    fn is_leaf(&self) -> bool {
        self.root().map_or(true, KdNode::is_leaf)
    }

    fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    fn entries(&self) -> Vec<Entry> {
        let mut entries = Vec::with_capacity(self.len);
        collect_entries(self.root(), &mut entries);
        entries
    }

    fn clear(&mut self) {
        self.root = None;
        self.len = 0;
    }

    fn rebalance(&mut self) {
        let entries = self.entries();
        self.root = build_balanced(entries, 0);
        self.counters.rebalances += 1;
        debug!(
            "Rebuilt kd-tree with {} entries, height {}",
            self.len,
            self.height()
        );
    }

    fn stats(&self) -> IndexStats {
        let mut nodes = NodeTally::default();
        tally(self.root(), &mut nodes);
        IndexStats::assemble(
            IndexKind::KdTree,
            self.len,
            self.height(),
            nodes,
            self.counters,
        )
    }
}
