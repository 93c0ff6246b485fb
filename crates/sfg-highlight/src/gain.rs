use serde::Serialize;
use tracing::warn;

use crate::error::{HighlightError, HighlightResult};
use crate::graph::{EdgeRef, GraphView};
use crate::path_finder::Path;
use crate::weight::parse_magnitude;

/// A path left out of the dominant/weak comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExcludedPath {
    pub index: usize,
    pub edge: String,
    pub label: String,
}

/// Scalar gains and the dominant/weak picks for a set of paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GainReport {
    /// One entry per input path; `None` for excluded paths.
    pub gains: Vec<Option<f64>>,
    /// Index of the first path with the greatest gain.
    pub dominant: Option<usize>,
    /// Index of the first path with the smallest gain.
    pub weak: Option<usize>,
    pub excluded: Vec<ExcludedPath>,
}

impl GainReport {
    pub fn dominant_gain(&self) -> Option<f64> {
        self.dominant.and_then(|i| self.gains[i])
    }

    pub fn weak_gain(&self) -> Option<f64> {
        self.weak.and_then(|i| self.gains[i])
    }

    /// Both picks exist.
    pub fn is_classified(&self) -> bool {
        self.dominant.is_some() && self.weak.is_some()
    }

    /// The first exclusion as an error, for callers that must fail when
    /// nothing was comparable.
    pub fn first_exclusion_error(&self) -> Option<HighlightError> {
        self.excluded.first().map(|e| HighlightError::MalformedWeight {
            edge: e.edge.clone(),
            label: e.label.clone(),
        })
    }
}

/// Multiplies edge magnitudes along paths and ranks the products.
///
/// Phase is carried on every edge but does not enter the product.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathGainEvaluator;

impl PathGainEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Product of the magnitudes parsed from each edge's transmittance label.
    pub fn path_gain<V: GraphView + ?Sized>(&self, view: &V, path: &Path) -> HighlightResult<f64> {
        path.edges.iter().try_fold(1.0_f64, |acc, edge| -> HighlightResult<f64> {
            let label = view.transmittance(&edge.id).unwrap_or_default();
            Ok(acc * parse_magnitude(&edge.id, &label)?)
        })
    }

    /// Score every path and pick dominant and weak.
    ///
    /// Comparisons are strict, so ties keep the earliest path. With no
    /// comparable path both picks are `None`.
    pub fn evaluate<V: GraphView + ?Sized>(&self, view: &V, paths: &[Path]) -> GainReport {
        let mut report = GainReport::default();
        let mut max_gain = f64::NEG_INFINITY;
        let mut min_gain = f64::INFINITY;

        for (index, path) in paths.iter().enumerate() {
            let gain = match self.path_gain(view, path) {
                Ok(gain) => gain,
                Err(HighlightError::MalformedWeight { edge, label }) => {
                    warn!(path = index, edge = %edge, "Excluding path with malformed weight {:?}", label);
                    report.excluded.push(ExcludedPath { index, edge, label });
                    report.gains.push(None);
                    continue;
                }
                Err(e) => {
                    warn!(path = index, "Excluding path: {}", e);
                    report.excluded.push(ExcludedPath {
                        index,
                        edge: String::new(),
                        label: e.to_string(),
                    });
                    report.gains.push(None);
                    continue;
                }
            };

            if gain > max_gain {
                max_gain = gain;
                report.dominant = Some(index);
            }
            if gain < min_gain {
                min_gain = gain;
                report.weak = Some(index);
            }
            report.gains.push(Some(gain));
        }

        report
    }
}

/// Edges present in both paths, by identity, in `dominant` order.
pub fn common_edges(dominant: &Path, weak: &Path) -> Vec<EdgeRef> {
    dominant
        .edges
        .iter()
        .filter(|edge| weak.contains_edge(&edge.id))
        .cloned()
        .collect()
}
