use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Which evaluator runs the pipeline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Differential dataflow on an in-process timely runtime.
    #[default]
    Dataflow,
    /// Single-threaded in-memory evaluation.
    Batch,
}

impl FromStr for Engine {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dataflow" => Ok(Engine::Dataflow),
            "batch" => Ok(Engine::Batch),
            other => Err(CoreError::UnknownEngine(other.to_string())),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engine::Dataflow => f.write_str("dataflow"),
            Engine::Batch => f.write_str("batch"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Products kept per class.
    pub top_k: usize,
    /// Timely workers; ignored by the batch engine.
    pub workers: usize,
    pub engine: Engine,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { top_k: 2, workers: 1, engine: Engine::Dataflow }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.top_k == 0 {
            return Err(CoreError::Config("top_k must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(CoreError::Config("workers must be at least 1".to_string()));
        }
        Ok(())
    }
}
