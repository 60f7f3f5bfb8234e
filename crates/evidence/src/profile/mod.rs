//! Dataset profiling: the data-quality report scored by the rigor engine.

mod kind;
mod profiler;

pub use kind::{ColumnKind, detect_kind};
pub use profiler::{DatasetProfiler, ProfileConfig};
