//! Dominant/weak path and cycle highlighting for signal flow graphs.
//!
//! A user picks a source and a target node on a rendered SFG. The engine
//! enumerates every simple path between them, multiplies edge magnitudes
//! along each, tags the strongest path, the weakest path, the edges they
//! share and any feedback cycle touching them, and publishes the two gains.

pub mod config;
pub mod engine;
pub mod error;
pub mod gain;
pub mod graph;
pub mod path_finder;
pub mod presenter;
pub mod protocol;
pub mod selection;
pub mod simplify;
pub mod stdio;
pub mod weight;

pub use config::HighlightConfig;
pub use engine::{HighlightEngine, HighlightOutcome, HighlightReport, HighlightSession, TapOutcome};
pub use error::{HighlightError, HighlightResult, SimplifyError};
pub use gain::{GainReport, PathGainEvaluator};
pub use graph::{EdgeRef, ElementId, GraphView, HighlightTag, SfgGraph};
pub use path_finder::{Cycle, GraphPathFinder, Path, PathSearch};
pub use presenter::{Classification, GainSummary, HighlightPresenter, SummaryDisplay, NOT_AVAILABLE};
pub use selection::{HighlightPhase, SelectionChange, SelectionState};
pub use weight::Weight;
