//! Replay scripts: a list of index operations applied in order.
//!
//! ```toml
//! [[steps]]
//! op = "insert"
//! name = "it"
//! x = 100
//! y = 100
//!
//! [[steps]]
//! op = "query"
//! x = 100
//! y = 100
//! direction = "SE"
//! distance = 10
//! ```

use anyhow::{Context, Result};
use pursuit_field::{Diagonal, Direction, IndexError, IndexKind, IndexStats, Point, SpatialIndex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One operation against the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Insert { name: String, x: i64, y: i64 },
    Remove { name: String },
    RemovePoint { x: i64, y: i64 },
    Move { name: String, direction: Direction, steps: u32 },
    MovePoint { x: i64, y: i64, direction: Direction, steps: u32 },
    Query { x: i64, y: i64, direction: Diagonal, distance: u32 },
    Rebalance,
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::Insert { .. } => "insert",
            Step::Remove { .. } => "remove",
            Step::RemovePoint { .. } => "remove_point",
            Step::Move { .. } => "move",
            Step::MovePoint { .. } => "move_point",
            Step::Query { .. } => "query",
            Step::Rebalance => "rebalance",
        }
    }

    fn apply(&self, index: &mut dyn SpatialIndex) -> Result<Outcome, IndexError> {
        match self {
            Step::Insert { name, x, y } => {
                index.insert(name, Point::new(*x, *y))?;
                Ok(Outcome::done())
            }
            Step::Remove { name } => {
                let entry = index.remove(name)?;
                Ok(Outcome::at(entry.point))
            }
            Step::RemovePoint { x, y } => {
                let entry = index.remove_point(Point::new(*x, *y))?;
                Ok(Outcome::found(vec![entry.name]))
            }
            Step::Move { name, direction, steps } => {
                let point = index.move_entry(name, *direction, *steps)?;
                Ok(Outcome::at(point))
            }
            Step::MovePoint { x, y, direction, steps } => {
                let point = index.move_point(Point::new(*x, *y), *direction, *steps)?;
                Ok(Outcome::at(point))
            }
            Step::Query { x, y, direction, distance } => {
                let mut names = index.names_in_range(Point::new(*x, *y), *direction, *distance);
                names.sort();
                Ok(Outcome::found(names))
            }
            Step::Rebalance => {
                index.rebalance();
                Ok(Outcome::done())
            }
        }
    }
}

/// Result of a single step as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        point: Option<Point>,
        #[serde(skip_serializing_if = "Option::is_none")]
        names: Option<Vec<String>>,
    },
    Rejected {
        error: String,
        blocked: bool,
    },
}

impl Outcome {
    fn done() -> Self {
        Outcome::Ok { point: None, names: None }
    }

    fn at(point: Point) -> Self {
        Outcome::Ok { point: Some(point), names: None }
    }

    fn found(names: Vec<String>) -> Self {
        Outcome::Ok { point: None, names: Some(names) }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub kind: IndexKind,
    pub applied: usize,
    pub rejected: usize,
    pub steps: Vec<StepReport>,
    pub stats: IndexStats,
}

impl Script {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse replay script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Applies every step in order. Rejected steps are recorded and the run
    /// carries on.
    pub fn run(&self, index: &mut dyn SpatialIndex) -> Report {
        info!(kind = %index.kind(), steps = self.steps.len(), "Replaying script");

        let mut steps = Vec::with_capacity(self.steps.len());
        let mut rejected = 0;
        for (number, step) in self.steps.iter().enumerate() {
            let outcome = match step.apply(index) {
                Ok(outcome) => {
                    debug!(step = number, op = step.op(), "Step applied");
                    outcome
                }
                Err(err) => {
                    rejected += 1;
                    if err.is_blocked_move() {
                        warn!(step = number, op = step.op(), "Blocked: {}", err);
                    } else {
                        info!(step = number, op = step.op(), "Rejected: {}", err);
                    }
                    Outcome::Rejected {
                        error: err.to_string(),
                        blocked: err.is_blocked_move(),
                    }
                }
            };
            steps.push(StepReport { step: number, op: step.op(), outcome });
        }

        let stats = index.stats();
        info!(
            entries = stats.entries,
            height = stats.height,
            rejected,
            "Replay finished"
        );

        Report {
            kind: index.kind(),
            applied: steps.iter().filter(|report| report.outcome.is_ok()).count(),
            rejected,
            steps,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_field::{build_index, FieldConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CHASE: &str = r#"
        [[steps]]
        op = "insert"
        name = "it"
        x = 100
        y = 100

        [[steps]]
        op = "insert"
        name = "A"
        x = 105
        y = 105

        [[steps]]
        op = "insert"
        name = "B"
        x = 110
        y = 110

        [[steps]]
        op = "query"
        x = 100
        y = 100
        direction = "SE"
        distance = 10

        [[steps]]
        op = "move"
        name = "it"
        direction = "S"
        steps = 5

        [[steps]]
        op = "move_point"
        x = 105
        y = 105
        direction = "E"
        steps = 5

        [[steps]]
        op = "move"
        name = "B"
        direction = "E"
        steps = 500

        [[steps]]
        op = "remove"
        name = "ghost"

        [[steps]]
        op = "remove_point"
        x = 110
        y = 110

        [[steps]]
        op = "rebalance"
    "#;

    fn run_on(kind: IndexKind, content: &str) -> Report {
        let script = Script::from_toml_str(content).unwrap();
        let mut index = build_index(&FieldConfig::new(500, 500).with_kind(kind));
        script.run(index.as_mut())
    }

    #[test]
    fn test_parse_every_op() {
        let script = Script::from_toml_str(CHASE).unwrap();
        let ops: Vec<&str> = script.steps.iter().map(Step::op).collect();
        assert_eq!(
            ops,
            [
                "insert", "insert", "insert", "query", "move", "move_point", "move", "remove",
                "remove_point", "rebalance"
            ]
        );
        assert_eq!(
            script.steps[4],
            Step::Move { name: "it".into(), direction: Direction::South, steps: 5 }
        );
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        assert!(Script::from_toml_str("[[steps]]\nop = \"teleport\"\n").is_err());
    }

    #[test]
    fn test_empty_script_runs() {
        let report = run_on(IndexKind::QuadTree, "");
        assert_eq!(report.applied, 0);
        assert_eq!(report.stats.entries, 0);
    }

    #[test]
    fn test_replay_outcomes_match_for_both_kinds() {
        for kind in [IndexKind::QuadTree, IndexKind::KdTree] {
            let report = run_on(kind, CHASE);
            assert_eq!(report.kind, kind);
            assert_eq!(report.steps.len(), 10);
            assert_eq!(report.rejected, 2);

            assert_eq!(
                report.steps[3].outcome,
                Outcome::found(vec!["A".into(), "B".into(), "it".into()])
            );
            assert_eq!(report.steps[4].outcome, Outcome::at(Point::new(100, 105)));
            assert_eq!(report.steps[5].outcome, Outcome::at(Point::new(110, 105)));

            match &report.steps[6].outcome {
                Outcome::Rejected { blocked, .. } => assert!(*blocked),
                other => panic!("expected blocked move, got {other:?}"),
            }
            match &report.steps[7].outcome {
                Outcome::Rejected { error, blocked } => {
                    assert!(!*blocked);
                    assert!(error.contains("ghost"));
                }
                other => panic!("expected missing entry, got {other:?}"),
            }

            assert_eq!(report.steps[8].outcome, Outcome::found(vec!["B".into()]));
            assert!(report.steps[9].outcome.is_ok());
            assert_eq!(report.stats.entries, 2);
            assert_eq!(report.stats.rebalances, 1);
        }
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = run_on(IndexKind::KdTree, CHASE);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "kdtree");
        assert_eq!(json["steps"][3]["outcome"]["status"], "ok");
        assert_eq!(json["steps"][3]["outcome"]["names"][0], "A");
        assert_eq!(json["steps"][4]["outcome"]["point"]["y"], 105);
        assert_eq!(json["steps"][6]["outcome"]["status"], "rejected");
        assert!(json["steps"][0]["outcome"].get("point").is_none());
        assert_eq!(json["stats"]["entries"], 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(CHASE.as_bytes()).unwrap();
        let script = Script::load(file.path()).unwrap();
        assert_eq!(script.steps.len(), 10);

        let missing = Script::load(Path::new("/nonexistent/script.toml")).unwrap_err();
        assert!(missing.to_string().contains("script.toml"));
    }
}
