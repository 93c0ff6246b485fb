//! Pre-flight check for simplify requests.
//!
//! The backend only collapses a two-edge chain into a single edge, so the
//! selected pair must be exactly two hops apart along the shortest directed
//! path before the request body is built.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{HighlightError, HighlightResult, SimplifyError};
use crate::graph::{GraphView, NodeId};
use crate::selection::SelectionState;

/// Edge count the backend accepts between the simplify endpoints.
pub const SIMPLIFY_PATH_EDGES: usize = 2;

/// Body of the simplify call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifyRequest {
    pub source: NodeId,
    pub target: NodeId,
}

/// Edge count of the shortest directed path, `None` if unreachable.
pub fn shortest_path_len<V: GraphView + ?Sized>(view: &V, source: &str, target: &str) -> Option<usize> {
    if source == target {
        return Some(0);
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut frontier: VecDeque<(String, usize)> = VecDeque::new();
    visited.insert(source.to_string());
    frontier.push_back((source.to_string(), 0));

    while let Some((node, depth)) = frontier.pop_front() {
        for edge in view.outgoing_edges(&node) {
            if edge.target == target {
                return Some(depth + 1);
            }
            if visited.insert(edge.target.clone()) {
                frontier.push_back((edge.target, depth + 1));
            }
        }
    }

    None
}

/// Validate the current selection and build the simplify request body.
pub fn simplify_request<V: GraphView + ?Sized>(
    view: &V,
    selection: &SelectionState,
) -> HighlightResult<SimplifyRequest> {
    let (source, target) = selection.endpoints()?;
    for node in [source, target] {
        if !view.contains_node(node) {
            return Err(HighlightError::UnknownNode(node.to_string()));
        }
    }

    match shortest_path_len(view, source, target) {
        None => Err(SimplifyError::NoPath.into()),
        Some(n) if n < SIMPLIFY_PATH_EDGES => Err(SimplifyError::PathTooShort(n).into()),
        Some(n) if n > SIMPLIFY_PATH_EDGES => Err(SimplifyError::PathTooLong(n).into()),
        Some(_) => Ok(SimplifyRequest {
            source: source.to_string(),
            target: target.to_string(),
        }),
    }
}
