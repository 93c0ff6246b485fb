use serde::{Deserialize, Serialize};

use crate::error::{HighlightError, HighlightResult};
use crate::graph::NodeId;

/// Where a highlight session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightPhase {
    Idle,
    Searching,
    Classified,
    Presented,
}

/// What a tap did to the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "node", rename_all = "snake_case")]
pub enum SelectionChange {
    SourceSelected(NodeId),
    TargetSelected(NodeId),
    SourceCleared(NodeId),
    TargetCleared(NodeId),
    /// Mode off, or both slots already filled by other nodes.
    Ignored,
}

impl SelectionChange {
    /// True when an endpoint was removed.
    pub fn is_deselection(&self) -> bool {
        matches!(
            self,
            SelectionChange::SourceCleared(_) | SelectionChange::TargetCleared(_)
        )
    }
}

/// Source/target picks driven by node taps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub enabled: bool,
    pub source: Option<NodeId>,
    pub target: Option<NodeId>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            enabled: true,
            source: None,
            target: None,
        }
    }

    /// Tapping a selected node deselects it; otherwise the first free slot
    /// (source, then target) takes the node.
    pub fn tap(&mut self, node: &str) -> SelectionChange {
        if !self.enabled {
            return SelectionChange::Ignored;
        }

        if self.source.as_deref() == Some(node) {
            self.source = None;
            SelectionChange::SourceCleared(node.to_string())
        } else if self.target.as_deref() == Some(node) {
            self.target = None;
            SelectionChange::TargetCleared(node.to_string())
        } else if self.source.is_none() {
            self.source = Some(node.to_string());
            SelectionChange::SourceSelected(node.to_string())
        } else if self.target.is_none() {
            self.target = Some(node.to_string());
            SelectionChange::TargetSelected(node.to_string())
        } else {
            SelectionChange::Ignored
        }
    }

    /// Turn selection mode on or off. Turning it off drops both endpoints.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.source = None;
        self.target = None;
    }

    pub fn is_complete(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    /// Both endpoints, distinct, or `InvalidSelection`.
    pub fn endpoints(&self) -> HighlightResult<(&str, &str)> {
        match (self.source.as_deref(), self.target.as_deref()) {
            (Some(source), Some(target)) if source == target => Err(
                HighlightError::InvalidSelection(format!("source and target are both {}", source)),
            ),
            (Some(source), Some(target)) => Ok((source, target)),
            _ => Err(HighlightError::InvalidSelection(
                "Please select 2 nodes".to_string(),
            )),
        }
    }
}
