//! Per-run general linear model collapsing each run's timepoints into one
//! response map per category.

pub mod design;
pub mod fit;
pub mod hrf;

pub use design::{DesignMatrix, Event, build_design, events_from_labels};
pub use fit::{GlmMaps, GlmOutput, GlmParams, GlmRow, fit_run, reduce_runs};
