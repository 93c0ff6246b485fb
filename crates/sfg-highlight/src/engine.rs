//! Highlight session: selection, search, scoring and presentation.
//!
//! Every request starts from a clean view. The session owns only the
//! selection, its phase and the active classification; the graph view and
//! the summary display are borrowed per call.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::HighlightConfig;
use crate::error::{HighlightError, HighlightResult};
use crate::gain::{ExcludedPath, PathGainEvaluator};
use crate::graph::{EdgeId, EdgeRef, GraphView, NodeId};
use crate::path_finder::GraphPathFinder;
use crate::presenter::{Classification, HighlightPresenter, SummaryDisplay};
use crate::selection::{HighlightPhase, SelectionChange, SelectionState};

/// Serializable digest of a presented classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightReport {
    pub source: NodeId,
    pub target: NodeId,
    /// Edge ids of every discovered path, in discovery order.
    pub paths: Vec<Vec<EdgeId>>,
    pub gains: Vec<Option<f64>>,
    pub dominant: usize,
    pub weak: usize,
    pub dominant_gain: String,
    pub weak_gain: String,
    pub common_edges: Vec<EdgeId>,
    /// Edge ids of the cycles that were tagged.
    pub cycles: Vec<Vec<EdgeId>>,
    pub excluded: Vec<ExcludedPath>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HighlightOutcome {
    Presented(HighlightReport),
    NoPath { source: NodeId, target: NodeId },
    AwaitingSelection,
}

impl HighlightOutcome {
    /// Text for the user, if the outcome warrants one.
    pub fn message(&self) -> Option<String> {
        match self {
            HighlightOutcome::NoPath { .. } => {
                Some("There is no path between the selected nodes".to_string())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TapOutcome {
    pub selection: SelectionChange,
    pub outcome: HighlightOutcome,
}

/// Stateless pipeline: find, score, classify.
#[derive(Debug, Clone, Default)]
pub struct HighlightEngine {
    finder: GraphPathFinder,
    evaluator: PathGainEvaluator,
    presenter: HighlightPresenter,
}

impl HighlightEngine {
    pub fn new(config: &HighlightConfig) -> Self {
        Self {
            finder: GraphPathFinder::new(config),
            evaluator: PathGainEvaluator::new(),
            presenter: HighlightPresenter::new(config.gain_digits),
        }
    }

    pub fn presenter(&self) -> &HighlightPresenter {
        &self.presenter
    }

    /// Search and score without touching the view's tags.
    pub fn classify<V: GraphView + ?Sized>(
        &self,
        view: &V,
        source: &str,
        target: &str,
    ) -> HighlightResult<Classification> {
        if source == target {
            return Err(HighlightError::InvalidSelection(format!(
                "source and target are both {}",
                source
            )));
        }
        for node in [source, target] {
            if !view.contains_node(node) {
                return Err(HighlightError::UnknownNode(node.to_string()));
            }
        }

        let search = self.finder.find_paths(view, source, target);
        debug!(
            paths = search.paths.len(),
            cycles = search.cycles.len(),
            "Search {} -> {} finished",
            source,
            target
        );
        let gains = self.evaluator.evaluate(view, &search.paths);
        Ok(Classification::new(search, gains))
    }

    pub fn report(&self, source: &str, target: &str, classification: &Classification) -> Option<HighlightReport> {
        let gains = &classification.gains;
        let (dominant, weak) = (gains.dominant?, gains.weak?);
        let edge_ids = |edges: &[EdgeRef]| -> Vec<EdgeId> {
            edges.iter().map(|e| e.id.clone()).collect()
        };

        Some(HighlightReport {
            source: source.to_string(),
            target: target.to_string(),
            paths: classification
                .search
                .paths
                .iter()
                .map(|p| edge_ids(&p.edges))
                .collect(),
            gains: gains.gains.clone(),
            dominant,
            weak,
            dominant_gain: self.presenter.format_gain(gains.dominant_gain()?),
            weak_gain: self.presenter.format_gain(gains.weak_gain()?),
            common_edges: edge_ids(&classification.common_edges),
            cycles: classification
                .relevant_cycles()
                .into_iter()
                .map(|c| edge_ids(&c.edges))
                .collect(),
            excluded: gains.excluded.clone(),
            truncated: classification.search.truncated,
        })
    }
}

/// Per-view highlight state machine.
#[derive(Debug, Clone)]
pub struct HighlightSession {
    engine: HighlightEngine,
    selection: SelectionState,
    phase: HighlightPhase,
    active: Option<Classification>,
}

impl Default for HighlightSession {
    fn default() -> Self {
        Self::new(&HighlightConfig::default())
    }
}

impl HighlightSession {
    pub fn new(config: &HighlightConfig) -> Self {
        Self {
            engine: HighlightEngine::new(config),
            selection: SelectionState::new(),
            phase: HighlightPhase::Idle,
            active: None,
        }
    }

    pub fn phase(&self) -> HighlightPhase {
        self.phase
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Classification currently shown, if any.
    pub fn active(&self) -> Option<&Classification> {
        self.active.as_ref()
    }

    /// Handle a node tap. Any change to the endpoints clears the view; a
    /// completed pair runs a highlight.
    pub fn tap<V, D>(&mut self, view: &mut V, display: &mut D, node: &str) -> HighlightResult<TapOutcome>
    where
        V: GraphView + ?Sized,
        D: SummaryDisplay + ?Sized,
    {
        if !view.contains_node(node) {
            return Err(HighlightError::UnknownNode(node.to_string()));
        }

        let change = self.selection.tap(node);
        debug!(?change, "tap on {}", node);

        if change == SelectionChange::Ignored {
            let outcome = if self.selection.is_complete() {
                self.current_outcome()
            } else {
                HighlightOutcome::AwaitingSelection
            };
            return Ok(TapOutcome {
                selection: change,
                outcome,
            });
        }

        self.clear(view, display);
        let outcome = if self.selection.is_complete() {
            self.run(view, display)?
        } else {
            HighlightOutcome::AwaitingSelection
        };

        Ok(TapOutcome {
            selection: change,
            outcome,
        })
    }

    /// Switch selection mode. Leaving the mode drops the endpoints and
    /// clears the view.
    pub fn set_mode<V, D>(&mut self, view: &mut V, display: &mut D, enabled: bool)
    where
        V: GraphView + ?Sized,
        D: SummaryDisplay + ?Sized,
    {
        self.selection.set_enabled(enabled);
        if !enabled {
            self.clear(view, display);
        }
    }

    /// Select both endpoints directly and highlight.
    pub fn highlight<V, D>(
        &mut self,
        view: &mut V,
        display: &mut D,
        source: &str,
        target: &str,
    ) -> HighlightResult<HighlightOutcome>
    where
        V: GraphView + ?Sized,
        D: SummaryDisplay + ?Sized,
    {
        self.selection.enabled = true;
        self.selection.source = Some(source.to_string());
        self.selection.target = Some(target.to_string());
        self.run(view, display)
    }

    /// Recompute the highlight for the current selection from scratch.
    pub fn run<V, D>(&mut self, view: &mut V, display: &mut D) -> HighlightResult<HighlightOutcome>
    where
        V: GraphView + ?Sized,
        D: SummaryDisplay + ?Sized,
    {
        self.clear(view, display);

        let (source, target) = self.selection.endpoints()?;
        let (source, target) = (source.to_string(), target.to_string());

        self.phase = HighlightPhase::Searching;
        let classification = match self.engine.classify(&*view, &source, &target) {
            Ok(c) => c,
            Err(e) => {
                self.phase = HighlightPhase::Idle;
                return Err(e);
            }
        };

        if classification.search.is_empty() {
            info!("No path between {} and {}", source, target);
            self.phase = HighlightPhase::Idle;
            return Ok(HighlightOutcome::NoPath { source, target });
        }

        if !classification.is_classified() {
            self.phase = HighlightPhase::Idle;
            let err = classification
                .gains
                .first_exclusion_error()
                .unwrap_or_else(|| HighlightError::InvalidGraph("no comparable path".to_string()));
            return Err(err);
        }
        self.phase = HighlightPhase::Classified;

        self.engine.presenter().apply(view, display, &classification);
        let report = self.engine.report(&source, &target, &classification);
        self.active = Some(classification);
        self.phase = HighlightPhase::Presented;

        match report {
            Some(report) => {
                info!(
                    paths = report.paths.len(),
                    cycles = report.cycles.len(),
                    "Highlighted {} -> {}: dominant {} weak {}",
                    source,
                    target,
                    report.dominant_gain,
                    report.weak_gain
                );
                Ok(HighlightOutcome::Presented(report))
            }
            None => Ok(HighlightOutcome::AwaitingSelection),
        }
    }

    /// Remove all highlight tags, reset the summary and return to idle.
    pub fn clear<V, D>(&mut self, view: &mut V, display: &mut D)
    where
        V: GraphView + ?Sized,
        D: SummaryDisplay + ?Sized,
    {
        self.engine.presenter().clear(view, display);
        self.active = None;
        self.phase = HighlightPhase::Idle;
    }

    fn current_outcome(&self) -> HighlightOutcome {
        let report = match (&self.active, self.selection.endpoints()) {
            (Some(active), Ok((source, target))) => self.engine.report(source, target, active),
            _ => None,
        };
        match report {
            Some(report) => HighlightOutcome::Presented(report),
            None => HighlightOutcome::AwaitingSelection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ElementId, HighlightTag, SfgGraph};
    use crate::presenter::{GainSummary, NOT_AVAILABLE};
    use crate::weight::Weight;

    fn chain() -> SfgGraph {
        let mut g = SfgGraph::new();
        for n in ["A", "B", "C"] {
            g.add_node(n);
        }
        g.add_edge(Some("ab".into()), "A", "B", Weight::new(2.0, 0.0)).unwrap();
        g.add_edge(Some("bc".into()), "B", "C", Weight::new(3.0, 45.0)).unwrap();
        g
    }

    #[test]
    fn test_taps_drive_phase_machine() -> anyhow::Result<()> {
        let mut g = chain();
        let mut summary = GainSummary::default();
        let mut session = HighlightSession::default();
        assert_eq!(session.phase(), HighlightPhase::Idle);

        let first = session.tap(&mut g, &mut summary, "A")?;
        assert_eq!(first.outcome, HighlightOutcome::AwaitingSelection);
        assert_eq!(session.phase(), HighlightPhase::Idle);

        let second = session.tap(&mut g, &mut summary, "C")?;
        assert!(matches!(second.outcome, HighlightOutcome::Presented(_)));
        assert_eq!(session.phase(), HighlightPhase::Presented);
        assert_eq!(summary.dominant, "6.00e+0");
        assert!(session.active().is_some());

        // Re-tapping the target deselects it and clears the view
        let third = session.tap(&mut g, &mut summary, "C")?;
        assert!(third.selection.is_deselection());
        assert_eq!(session.phase(), HighlightPhase::Idle);
        assert_eq!(summary.dominant, NOT_AVAILABLE);
        assert!(g.tagged_elements().is_empty());
        assert!(session.active().is_none());
        Ok(())
    }

    #[test]
    fn test_no_path_outcome_clears() -> anyhow::Result<()> {
        let mut g = chain();
        let mut summary = GainSummary::default();
        let mut session = HighlightSession::default();

        session.highlight(&mut g, &mut summary, "A", "C")?;
        let outcome = session.highlight(&mut g, &mut summary, "C", "A")?;

        assert_eq!(
            outcome,
            HighlightOutcome::NoPath {
                source: "C".into(),
                target: "A".into()
            }
        );
        assert!(outcome.message().is_some());
        assert_eq!(summary, GainSummary::default());
        assert!(g.tagged_elements().is_empty());
        assert_eq!(session.phase(), HighlightPhase::Idle);
        Ok(())
    }

    #[test]
    fn test_invalid_selection_does_not_search() {
        let mut g = chain();
        let mut summary = GainSummary::default();
        let mut session = HighlightSession::default();

        let err = session.highlight(&mut g, &mut summary, "A", "A").unwrap_err();
        assert!(matches!(err, HighlightError::InvalidSelection(_)));
        assert_eq!(session.phase(), HighlightPhase::Idle);

        let err = session.highlight(&mut g, &mut summary, "A", "Z").unwrap_err();
        assert_eq!(err, HighlightError::UnknownNode("Z".into()));

        let err = session.tap(&mut g, &mut summary, "Q").unwrap_err();
        assert_eq!(err, HighlightError::UnknownNode("Q".into()));
    }

    #[test]
    fn test_mode_off_clears_and_ignores() -> anyhow::Result<()> {
        let mut g = chain();
        let mut summary = GainSummary::default();
        let mut session = HighlightSession::default();
        session.highlight(&mut g, &mut summary, "A", "C")?;

        session.set_mode(&mut g, &mut summary, false);
        assert!(g.tagged_elements().is_empty());
        assert_eq!(session.selection().source, None);

        let tap = session.tap(&mut g, &mut summary, "A")?;
        assert_eq!(tap.selection, SelectionChange::Ignored);
        assert_eq!(tap.outcome, HighlightOutcome::AwaitingSelection);
        Ok(())
    }

    #[test]
    fn test_third_tap_keeps_highlight() -> anyhow::Result<()> {
        let mut g = chain();
        let mut summary = GainSummary::default();
        let mut session = HighlightSession::default();
        session.tap(&mut g, &mut summary, "A")?;
        session.tap(&mut g, &mut summary, "C")?;

        let tap = session.tap(&mut g, &mut summary, "B")?;
        assert_eq!(tap.selection, SelectionChange::Ignored);
        assert!(matches!(tap.outcome, HighlightOutcome::Presented(_)));
        assert_eq!(
            g.tags(&ElementId::Edge("ab".into())),
            vec![HighlightTag::Highlighted, HighlightTag::WeakPath, HighlightTag::CommonEdge]
        );
        Ok(())
    }

    #[test]
    fn test_all_paths_malformed_leaves_view_cleared() -> anyhow::Result<()> {
        let mut g = chain();
        g.add_node("D");
        g.add_edge(Some("cd".into()), "C", "D", Weight::new(f64::INFINITY, 0.0))?;
        let mut summary = GainSummary::default();
        let mut session = HighlightSession::default();
        session.highlight(&mut g, &mut summary, "A", "C")?;

        let err = session.highlight(&mut g, &mut summary, "A", "D").unwrap_err();

        assert_eq!(
            err,
            HighlightError::MalformedWeight {
                edge: "cd".into(),
                label: "Infinity∠0.00".into()
            }
        );
        assert_eq!(session.phase(), HighlightPhase::Idle);
        assert!(session.active().is_none());
        assert!(g.tagged_elements().is_empty());
        assert_eq!(summary.dominant, NOT_AVAILABLE);
        assert_eq!(summary.weak, NOT_AVAILABLE);
        Ok(())
    }

    #[test]
    fn test_rerun_replaces_previous_tags() -> anyhow::Result<()> {
        let mut g = chain();
        g.add_node("D");
        g.add_edge(Some("cd".into()), "C", "D", Weight::new(1.0, 0.0))?;
        let mut summary = GainSummary::default();
        let mut session = HighlightSession::default();

        session.highlight(&mut g, &mut summary, "A", "C")?;
        session.highlight(&mut g, &mut summary, "C", "D")?;

        assert!(g.tags(&ElementId::Edge("ab".into())).is_empty());
        assert!(!g.tags(&ElementId::Edge("cd".into())).is_empty());
        assert_eq!(summary.dominant, "1.00e+0");
        Ok(())
    }
}
