//! Mapping of classification results onto view tags and summary text.

use serde::Serialize;
use tracing::debug;

use crate::gain::{common_edges, GainReport};
use crate::graph::{EdgeRef, ElementId, GraphView, HighlightTag};
use crate::path_finder::{Cycle, Path, PathSearch};
use crate::weight::to_exponential;

/// Summary text shown when no gain is available.
pub const NOT_AVAILABLE: &str = "N/A";

/// The two text sinks for dominant and weak gains.
pub trait SummaryDisplay {
    fn show_dominant_gain(&mut self, text: &str);
    fn show_weak_gain(&mut self, text: &str);
}

/// In-memory summary display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GainSummary {
    pub dominant: String,
    pub weak: String,
}

impl Default for GainSummary {
    fn default() -> Self {
        Self {
            dominant: NOT_AVAILABLE.to_string(),
            weak: NOT_AVAILABLE.to_string(),
        }
    }
}

impl SummaryDisplay for GainSummary {
    fn show_dominant_gain(&mut self, text: &str) {
        self.dominant = text.to_string();
    }

    fn show_weak_gain(&mut self, text: &str) {
        self.weak = text.to_string();
    }
}

/// Full result of one highlight query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub search: PathSearch,
    pub gains: GainReport,
    /// Edges on both the dominant and the weak path.
    pub common_edges: Vec<EdgeRef>,
}

impl Classification {
    pub fn new(search: PathSearch, gains: GainReport) -> Self {
        let common_edges = match (gains.dominant, gains.weak) {
            (Some(d), Some(w)) => common_edges(&search.paths[d], &search.paths[w]),
            _ => Vec::new(),
        };
        Self {
            search,
            gains,
            common_edges,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.gains.is_classified()
    }

    pub fn dominant_path(&self) -> Option<&Path> {
        self.gains.dominant.map(|i| &self.search.paths[i])
    }

    pub fn weak_path(&self) -> Option<&Path> {
        self.gains.weak.map(|i| &self.search.paths[i])
    }

    pub fn relevant_cycles(&self) -> Vec<&Cycle> {
        self.search.relevant_cycles().collect()
    }
}

#[derive(Debug, Clone)]
pub struct HighlightPresenter {
    gain_digits: usize,
}

impl Default for HighlightPresenter {
    fn default() -> Self {
        Self::new(2)
    }
}

impl HighlightPresenter {
    pub fn new(gain_digits: usize) -> Self {
        Self { gain_digits }
    }

    pub fn format_gain(&self, gain: f64) -> String {
        to_exponential(gain, self.gain_digits)
    }

    /// Tag the weak path, the dominant path, common edges and relevant
    /// cycles, in that order, then publish the summary.
    ///
    /// A cycle tag replaces any path tag on the same edge. Common edges keep
    /// their weak/highlighted tags alongside `common_edge`.
    pub fn apply<V, D>(&self, view: &mut V, display: &mut D, classification: &Classification)
    where
        V: GraphView + ?Sized,
        D: SummaryDisplay + ?Sized,
    {
        if let Some(weak) = classification.weak_path() {
            tag_path(view, weak, HighlightTag::WeakPath);
        }
        if let Some(dominant) = classification.dominant_path() {
            tag_path(view, dominant, HighlightTag::Highlighted);
        }
        for edge in &classification.common_edges {
            view.add_tag(&ElementId::Edge(edge.id.clone()), HighlightTag::CommonEdge);
        }

        for cycle in classification.relevant_cycles() {
            for edge in &cycle.edges {
                let element = ElementId::Edge(edge.id.clone());
                view.remove_tag(&element, HighlightTag::WeakPath);
                view.remove_tag(&element, HighlightTag::CommonEdge);
                view.remove_tag(&element, HighlightTag::Highlighted);
                view.add_tag(&element, HighlightTag::Cycle);
            }
        }

        self.summarize(display, classification);
    }

    /// Publish dominant and weak gains, or `N/A` for both when unclassified.
    pub fn summarize<D: SummaryDisplay + ?Sized>(&self, display: &mut D, classification: &Classification) {
        match (classification.gains.dominant_gain(), classification.gains.weak_gain()) {
            (Some(dominant), Some(weak)) => {
                display.show_dominant_gain(&self.format_gain(dominant));
                display.show_weak_gain(&self.format_gain(weak));
            }
            _ => reset_summary(display),
        }
    }

    /// Remove every highlight tag from every element and reset the summary.
    pub fn clear<V, D>(&self, view: &mut V, display: &mut D)
    where
        V: GraphView + ?Sized,
        D: SummaryDisplay + ?Sized,
    {
        let elements = view.elements();
        debug!("Clearing highlight tags on {} elements", elements.len());
        for element in &elements {
            for tag in HighlightTag::ALL {
                view.remove_tag(element, tag);
            }
        }
        reset_summary(display);
    }
}

fn reset_summary<D: SummaryDisplay + ?Sized>(display: &mut D) {
    display.show_dominant_gain(NOT_AVAILABLE);
    display.show_weak_gain(NOT_AVAILABLE);
}

/// Tags every edge of `path` and every node strictly inside it.
fn tag_path<V: GraphView + ?Sized>(view: &mut V, path: &Path, tag: HighlightTag) {
    for edge in &path.edges {
        view.add_tag(&ElementId::Edge(edge.id.clone()), tag);
    }
    for node in path.internal_nodes() {
        view.add_tag(&ElementId::Node(node.to_string()), tag);
    }
}
