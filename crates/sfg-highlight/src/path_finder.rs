//! Enumeration of simple directed paths between two nodes.
//!
//! The walk is a depth-first recursion that threads its accumulators
//! explicitly, so a search never touches shared state and can be run
//! against any [`GraphView`]. Revisiting a node already on the current
//! branch records a [`Cycle`] instead of recursing; this bounds the
//! recursion depth by the node count. Every edge the walk looks at costs
//! one step of the configured budget, so dense graphs with few or no paths
//! still terminate promptly.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::HighlightConfig;
use crate::graph::{EdgeId, EdgeRef, GraphView, NodeId};

/// Ordered, non-empty edge sequence from the search source to its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Path {
    pub edges: Vec<EdgeRef>,
}

impl Path {
    pub fn source(&self) -> Option<&str> {
        self.edges.first().map(|e| e.source.as_str())
    }

    pub fn target(&self) -> Option<&str> {
        self.edges.last().map(|e| e.target.as_str())
    }

    /// Nodes strictly between the path's endpoints.
    pub fn internal_nodes(&self) -> impl Iterator<Item = &str> + '_ {
        let n = self.edges.len().saturating_sub(1);
        self.edges[..n].iter().map(|e| e.target.as_str())
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.iter().any(|e| e.id == id)
    }
}

/// Suffix of an in-progress path plus the edge that re-enters it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    pub edges: Vec<EdgeRef>,
}

impl Cycle {
    /// The edge whose target re-enters the path.
    pub fn closing_edge(&self) -> Option<&EdgeRef> {
        self.edges.last()
    }

    /// Source and target of the closing edge.
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        self.closing_edge()
            .map(|e| (e.source.as_str(), e.target.as_str()))
    }
}

/// Outcome of one source-to-target search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathSearch {
    /// Paths in discovery order.
    pub paths: Vec<Path>,
    /// Distinct cycles met during the walk, relevant or not.
    pub cycles: Vec<Cycle>,
    /// Nodes lying on at least one discovered path.
    pub path_nodes: BTreeSet<NodeId>,
    /// Set when enumeration stopped at the path cap or the step budget.
    pub truncated: bool,
}

impl PathSearch {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Cycles whose closing edge has both endpoints on a discovered path.
    pub fn relevant_cycles(&self) -> impl Iterator<Item = &Cycle> + '_ {
        self.cycles.iter().filter(move |cycle| match cycle.endpoints() {
            Some((from, to)) => self.path_nodes.contains(from) && self.path_nodes.contains(to),
            None => false,
        })
    }
}

/// Depth-first path and cycle finder.
#[derive(Debug, Clone)]
pub struct GraphPathFinder {
    max_paths: usize,
    max_steps: usize,
}

impl Default for GraphPathFinder {
    fn default() -> Self {
        Self::new(&HighlightConfig::default())
    }
}

struct Accumulator {
    paths: Vec<Path>,
    cycles: Vec<Cycle>,
    seen_cycles: HashSet<Vec<EdgeId>>,
    path_nodes: BTreeSet<NodeId>,
    max_paths: usize,
    max_steps: usize,
    steps: usize,
    truncated: bool,
}

impl Accumulator {
    fn exhausted(&self) -> bool {
        self.paths.len() >= self.max_paths || self.steps >= self.max_steps
    }

    /// Keeps the first occurrence of each edge sequence.
    fn record_cycle(&mut self, edges: Vec<EdgeRef>) {
        let key: Vec<EdgeId> = edges.iter().map(|e| e.id.clone()).collect();
        if self.seen_cycles.insert(key) {
            self.cycles.push(Cycle { edges });
        }
    }
}

impl GraphPathFinder {
    pub fn new(config: &HighlightConfig) -> Self {
        Self {
            max_paths: config.max_paths,
            max_steps: config.max_steps,
        }
    }

    /// Enumerate all simple paths from `source` to `target`.
    ///
    /// `source == target` yields no paths. Absence of a path is a valid
    /// result, never an error.
    pub fn find_paths<V: GraphView + ?Sized>(&self, view: &V, source: &str, target: &str) -> PathSearch {
        if source == target {
            return PathSearch::default();
        }

        let mut acc = Accumulator {
            paths: Vec::new(),
            cycles: Vec::new(),
            seen_cycles: HashSet::new(),
            path_nodes: BTreeSet::new(),
            max_paths: self.max_paths,
            max_steps: self.max_steps,
            steps: 0,
            truncated: false,
        };
        let mut current = Vec::new();

        if walk(view, source, target, &mut current, &mut acc) {
            acc.path_nodes.insert(target.to_string());
        }

        if acc.truncated {
            warn!(
                paths = acc.paths.len(),
                steps = acc.steps,
                "Path enumeration {} -> {} truncated",
                source,
                target
            );
        }

        PathSearch {
            paths: acc.paths,
            cycles: acc.cycles,
            path_nodes: acc.path_nodes,
            truncated: acc.truncated,
        }
    }
}

/// Returns true when at least one path to `target` leaves `node` on this branch.
fn walk<V: GraphView + ?Sized>(
    view: &V,
    node: &str,
    target: &str,
    current: &mut Vec<EdgeRef>,
    acc: &mut Accumulator,
) -> bool {
    let mut reached = false;

    for edge in view.outgoing_edges(node) {
        if acc.exhausted() {
            acc.truncated = true;
            break;
        }
        acc.steps += 1;

        if edge.target == target {
            let mut edges = current.clone();
            edges.push(edge);
            debug!(len = edges.len(), "path #{} found", acc.paths.len());
            acc.paths.push(Path { edges });
            reached = true;
            continue;
        }

        let revisit = current.iter().position(|e| e.source == edge.target);
        if revisit.is_some() || edge.is_self_loop() {
            let start = revisit.unwrap_or(current.len());
            let mut edges = current[start..].to_vec();
            debug!(edge = %edge.id, "cycle closes at {}", edge.target);
            edges.push(edge);
            acc.record_cycle(edges);
            continue;
        }

        let next = edge.target.clone();
        current.push(edge);
        if walk(view, &next, target, current, acc) {
            reached = true;
        }
        current.pop();
    }

    if reached {
        acc.path_nodes.insert(node.to_string());
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SfgGraph;
    use crate::weight::Weight;

    fn graph(nodes: &[&str], edges: &[(&str, &str, &str)]) -> SfgGraph {
        let mut g = SfgGraph::new();
        for n in nodes {
            g.add_node(*n);
        }
        for (id, s, t) in edges {
            g.add_edge(Some(id.to_string()), s, t, Weight::new(1.0, 0.0))
                .expect("valid test edge");
        }
        g
    }

    fn ids(path: &Path) -> Vec<&str> {
        path.edges.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_single_chain() {
        let g = graph(&["A", "B", "C"], &[("ab", "A", "B"), ("bc", "B", "C")]);
        let search = GraphPathFinder::default().find_paths(&g, "A", "C");

        assert_eq!(search.paths.len(), 1);
        assert_eq!(ids(&search.paths[0]), vec!["ab", "bc"]);
        assert_eq!(search.paths[0].source(), Some("A"));
        assert_eq!(search.paths[0].target(), Some("C"));
        assert_eq!(search.paths[0].internal_nodes().collect::<Vec<_>>(), vec!["B"]);
        assert!(search.cycles.is_empty());
        assert_eq!(
            search.path_nodes.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
    }

    #[test]
    fn test_parallel_edges_are_distinct_paths() {
        let g = graph(&["A", "B"], &[("x", "A", "B"), ("y", "A", "B")]);
        let search = GraphPathFinder::default().find_paths(&g, "A", "B");
        let found: Vec<_> = search.paths.iter().map(ids).collect();
        assert_eq!(found, vec![vec!["x"], vec!["y"]]);
    }

    #[test]
    fn test_source_equals_target_is_empty() {
        let g = graph(&["A", "B"], &[("ab", "A", "B"), ("ba", "B", "A")]);
        let search = GraphPathFinder::default().find_paths(&g, "A", "A");
        assert!(search.is_empty());
        assert!(search.cycles.is_empty());
    }

    #[test]
    fn test_unreachable_target() {
        let g = graph(&["A", "B", "C"], &[("ab", "A", "B"), ("cb", "C", "B")]);
        let search = GraphPathFinder::default().find_paths(&g, "A", "C");
        assert!(search.is_empty());
        assert!(search.path_nodes.is_empty());
    }

    #[test]
    fn test_self_loop_recorded_not_followed() {
        let g = graph(
            &["A", "B", "C"],
            &[("ab", "A", "B"), ("bb", "B", "B"), ("bc", "B", "C")],
        );
        let search = GraphPathFinder::default().find_paths(&g, "A", "C");

        assert_eq!(search.paths.len(), 1);
        assert_eq!(search.cycles.len(), 1);
        let cycle = &search.cycles[0];
        assert_eq!(cycle.edges.len(), 1);
        assert_eq!(cycle.endpoints(), Some(("B", "B")));
        assert_eq!(search.relevant_cycles().count(), 1);
    }

    #[test]
    fn test_back_edge_cycle_is_path_suffix() {
        // A -> B -> C -> D, with C -> B feeding back
        let g = graph(
            &["A", "B", "C", "D"],
            &[("ab", "A", "B"), ("bc", "B", "C"), ("cb", "C", "B"), ("cd", "C", "D")],
        );
        let search = GraphPathFinder::default().find_paths(&g, "A", "D");

        assert_eq!(search.paths.len(), 1);
        assert_eq!(ids(&search.paths[0]), vec!["ab", "bc", "cd"]);

        assert_eq!(search.cycles.len(), 1);
        let cycle_ids: Vec<_> = search.cycles[0].edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(cycle_ids, vec!["bc", "cb"]);
        assert_eq!(search.relevant_cycles().count(), 1);
    }

    #[test]
    fn test_cycle_off_the_path_is_irrelevant() {
        // B <-> E loop hangs off the path but E never reaches D
        let g = graph(
            &["A", "B", "D", "E"],
            &[("ab", "A", "B"), ("be", "B", "E"), ("eb", "E", "B"), ("bd", "B", "D")],
        );
        let search = GraphPathFinder::default().find_paths(&g, "A", "D");

        assert_eq!(search.paths.len(), 1);
        assert_eq!(search.cycles.len(), 1);
        assert_eq!(search.cycles[0].endpoints(), Some(("E", "B")));
        assert!(!search.path_nodes.contains("E"));
        assert_eq!(search.relevant_cycles().count(), 0);
    }

    #[test]
    fn test_return_to_source_is_cycle() {
        let g = graph(
            &["A", "B", "C"],
            &[("ab", "A", "B"), ("ba", "B", "A"), ("bc", "B", "C")],
        );
        let search = GraphPathFinder::default().find_paths(&g, "A", "C");
        assert_eq!(search.paths.len(), 1);
        assert_eq!(search.cycles.len(), 1);
        assert_eq!(search.cycles[0].edges.len(), 2);
        assert_eq!(search.relevant_cycles().count(), 1);
    }

    #[test]
    fn test_path_cap_truncates() {
        let g = graph(
            &["A", "B"],
            &[("x", "A", "B"), ("y", "A", "B"), ("z", "A", "B")],
        );
        let config = HighlightConfig {
            max_paths: 2,
            ..HighlightConfig::default()
        };
        let search = GraphPathFinder::new(&config).find_paths(&g, "A", "B");
        assert_eq!(search.paths.len(), 2);
        assert!(search.truncated);
    }

    #[test]
    fn test_step_budget_stops_search_without_paths() {
        // Complete digraph with self-loops; T only has incoming edges
        let names = ["n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7", "n8"];
        let mut g = SfgGraph::new();
        for n in names.iter().chain(["T"].iter()) {
            g.add_node(*n);
        }
        for s in names {
            for t in names {
                g.add_edge(None, s, t, Weight::new(1.0, 0.0)).expect("valid test edge");
            }
        }
        g.add_edge(Some("in".into()), "T", "T", Weight::new(1.0, 0.0))
            .expect("valid test edge");

        let config = HighlightConfig {
            max_steps: 5_000,
            ..HighlightConfig::default()
        };
        let search = GraphPathFinder::new(&config).find_paths(&g, "n0", "T");

        assert!(search.is_empty());
        assert!(search.truncated);
        assert!(search.cycles.len() <= 5_000);
        assert_eq!(search.relevant_cycles().count(), 0);
    }

    #[test]
    fn test_same_cycle_reached_twice_recorded_once() {
        // X <-> Z is entered both from S directly and via Y
        let g = graph(
            &["S", "X", "Y", "Z", "T"],
            &[
                ("sx", "S", "X"),
                ("sy", "S", "Y"),
                ("yx", "Y", "X"),
                ("xz", "X", "Z"),
                ("zx", "Z", "X"),
                ("xt", "X", "T"),
            ],
        );
        let search = GraphPathFinder::default().find_paths(&g, "S", "T");

        assert_eq!(search.paths.len(), 2);
        assert_eq!(search.cycles.len(), 1);
        let cycle_ids: Vec<_> = search.cycles[0].edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(cycle_ids, vec!["xz", "zx"]);
        assert!(!search.truncated);
    }

    #[test]
    fn test_every_path_runs_source_to_target() {
        // Diamond with a cross link and a feedback loop
        let g = graph(
            &["S", "X", "Y", "T"],
            &[
                ("sx", "S", "X"),
                ("sy", "S", "Y"),
                ("xy", "X", "Y"),
                ("yx", "Y", "X"),
                ("xt", "X", "T"),
                ("yt", "Y", "T"),
            ],
        );
        let search = GraphPathFinder::default().find_paths(&g, "S", "T");

        assert_eq!(search.paths.len(), 4);
        for path in &search.paths {
            assert_eq!(path.source(), Some("S"));
            assert_eq!(path.target(), Some("T"));
            for pair in path.edges.windows(2) {
                assert_eq!(pair[0].target, pair[1].source);
            }
        }
    }
}
