//! Evidence synthesis: fixed- and random-effects meta-analysis.

mod engine;
mod model;

pub use engine::EvidenceSynthesisEngine;
pub use model::{
    EggerTest, HeterogeneityLevel, HeterogeneityStats, PooledEstimate, StudyEffect, StudyRow,
    SynthesisResult,
};
