use super::params::ParamDict;
use super::schedule::{EconSpec, TempSpec};

/// One fully resolved phase of the annealing pipeline.
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub name: String,
    pub param: ParamDict,
    pub force: ParamDict,
    pub temp: Option<TempSpec>,
    pub econ: Option<EconSpec>,
    pub step_count: Option<u64>,
    pub minimizer_steps: Option<u64>,
    pub non_deriv_steps: Option<u64>,
    pub switch_fraction: Option<f64>,
    pub timestep_override: Option<f64>,
    /// Decreasing distance cutoffs driving the minimize-only prep phase.
    pub end_ramp: Option<Vec<f64>>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, param: ParamDict, force: ParamDict) -> Self {
        Self {
            name: name.into(),
            param,
            force,
            temp: None,
            econ: None,
            step_count: None,
            minimizer_steps: None,
            non_deriv_steps: None,
            switch_fraction: None,
            timestep_override: None,
            end_ramp: None,
        }
    }
}

/// The resolved, ordered stage sequence. Execution follows this order
/// exactly; stage names are unique.
#[derive(Debug, Clone, Default)]
pub struct StagePipeline {
    stages: Vec<StageSpec>,
}

impl StagePipeline {
    pub fn new(stages: Vec<StageSpec>) -> Self {
        Self { stages }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageSpec> {
        self.stages.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl IntoIterator for StagePipeline {
    type Item = StageSpec;
    type IntoIter = std::vec::IntoIter<StageSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.into_iter()
    }
}
