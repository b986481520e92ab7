//! Seeded random operation sequences checked against a plain map model

use pursuit_field::{
    Bounds, Diagonal, Direction, IndexError, KdTree, Point, RegionQuadTree, SpatialIndex,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, BTreeSet};

const SIZE: i64 = 64;
const STEPS: usize = 3_000;

/// Reference model: name -> point, with a reverse map for occupancy.
#[derive(Default)]
struct Model {
    by_name: BTreeMap<String, Point>,
    by_point: BTreeMap<Point, String>,
}

impl Model {
    fn insert(&mut self, name: &str, point: Point) {
        self.by_name.insert(name.to_string(), point);
        self.by_point.insert(point, name.to_string());
    }

    fn remove(&mut self, name: &str) -> Option<Point> {
        let point = self.by_name.remove(name)?;
        self.by_point.remove(&point);
        Some(point)
    }

    fn in_box(&self, area: &Bounds) -> BTreeSet<String> {
        self.by_name
            .iter()
            .filter(|(_, point)| area.contains(**point))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

fn random_point(rng: &mut StdRng) -> Point {
    // Occasionally step just outside the field.
    Point::new(rng.gen_range(-2..=SIZE + 2), rng.gen_range(-2..=SIZE + 2))
}

fn assert_agrees(index: &dyn SpatialIndex, model: &Model) {
    assert_eq!(index.size(), model.by_name.len());
    for (name, point) in &model.by_name {
        assert_eq!(index.locate(name), Some(*point), "{} lost {}", index.kind(), name);
        assert_eq!(index.name_at(*point), Some(name.as_str()));
        assert!(index.depth(*point).is_some_and(|depth| depth < index.height()));
    }
    let stored: BTreeSet<String> = index.entries().into_iter().map(|e| e.name).collect();
    assert_eq!(stored.len(), model.by_name.len(), "duplicate names stored");
}

fn run_against_model(index: &mut dyn SpatialIndex, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = Model::default();
    let bounds = index.bounds();

    for step in 0..STEPS {
        match rng.gen_range(0..10) {
            0..=3 => {
                let name = format!("e{}", rng.gen_range(0..120));
                let point = random_point(&mut rng);
                let expected = if !bounds.contains(point) {
                    Err(IndexError::OutOfBounds { point, bounds })
                } else if model.by_point.contains_key(&point) {
                    Err(IndexError::DuplicatePoint(point))
                } else if model.by_name.contains_key(&name) {
                    Err(IndexError::DuplicateName(name.clone()))
                } else {
                    Ok(())
                };
                assert_eq!(index.insert(&name, point), expected, "step {step}");
                if expected.is_ok() {
                    model.insert(&name, point);
                }
            }
            4 => {
                let name = format!("e{}", rng.gen_range(0..120));
                let removed = index.remove(&name).ok().map(|entry| entry.point);
                assert_eq!(removed, model.remove(&name), "step {step}");
            }
            5 => {
                let point = random_point(&mut rng);
                let removed = index.remove_point(point).ok().map(|entry| entry.name);
                let expected = model.by_point.get(&point).cloned();
                if let Some(name) = &expected {
                    model.remove(name);
                }
                assert_eq!(removed, expected, "step {step}");
            }
            6..=8 => {
                let pick = rng.gen_range(0..model.by_name.len().max(1));
                let Some(name) = model.by_name.keys().nth(pick).cloned() else {
                    continue;
                };
                let direction = Direction::ALL[rng.gen_range(0..4)];
                let steps = rng.gen_range(0..12);
                let from = model.by_name[&name];
                let target = direction.step(from, steps);
                let blocked = !bounds.contains(target)
                    || (target != from && model.by_point.contains_key(&target));

                let result = if rng.gen_bool(0.5) {
                    index.move_entry(&name, direction, steps)
                } else {
                    index.move_point(from, direction, steps)
                };
                if blocked {
                    assert!(result.as_ref().is_err_and(IndexError::is_blocked_move), "step {step}");
                    assert_eq!(index.locate(&name), Some(from));
                } else {
                    assert_eq!(result, Ok(target), "step {step}");
                    model.remove(&name);
                    model.insert(&name, target);
                }
            }
            _ => {
                let anchor = random_point(&mut rng);
                let diagonal = Diagonal::ALL[rng.gen_range(0..4)];
                let distance = rng.gen_range(0..20);
                let found: BTreeSet<String> = index
                    .names_in_range(anchor, diagonal, distance)
                    .into_iter()
                    .collect();
                assert_eq!(found, model.in_box(&diagonal.query_box(anchor, distance)), "step {step}");
            }
        }

        if step % 250 == 0 {
            assert_agrees(index, &model);
        }
    }
    assert_agrees(index, &model);
}

#[test]
fn test_quadtree_matches_model() {
    for seed in [1, 7, 42] {
        let mut tree = RegionQuadTree::new(Bounds::field(SIZE, SIZE));
        run_against_model(&mut tree, seed);
    }
}

#[test]
fn test_quadtree_with_offset_centre_matches_model() {
    let mut tree = RegionQuadTree::with_centre(Bounds::field(SIZE, SIZE), Point::new(5, 50));
    run_against_model(&mut tree, 11);
}

#[test]
fn test_kdtree_matches_model() {
    for seed in [1, 7, 42] {
        let mut tree = KdTree::new(Bounds::field(SIZE, SIZE));
        run_against_model(&mut tree, seed);
    }
}

#[test]
fn test_self_rebalancing_kdtree_matches_model() {
    let mut tree = KdTree::new(Bounds::field(SIZE, SIZE)).with_rebalance_factor(Some(2));
    run_against_model(&mut tree, 99);
    assert!(tree.height() <= 2 * 7 + 1);
}
