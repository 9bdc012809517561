use super::error::EngineError;
use crate::core::params::ParamDict;
use crate::core::schedule::ScheduleFunction;

/// The external refinement engine the scheduler drives.
///
/// Failures are constructed by implementations (typically
/// [`EngineError::Minimization`]) and propagate through the scheduler
/// unchanged: the physical state after a partial step is not revertible, so
/// no retry or wrapping happens here.
pub trait RefinementEngine {
    fn set_pars(&mut self, pars: &ParamDict) -> Result<(), EngineError>;
    fn set_forces(&mut self, forces: &ParamDict) -> Result<(), EngineError>;

    fn pars(&self) -> String;
    fn forces(&self) -> String;

    fn run_local_minimize(&mut self, steps: u64, tolerance: f64) -> Result<(), EngineError>;
    fn run_stochastic_refine(
        &mut self,
        steps: u64,
        algorithm: &str,
        radius: f64,
    ) -> Result<(), EngineError>;

    fn energy(&mut self) -> f64;
}

/// The dynamics integrator advancing the trajectory between stages.
///
/// `initialize_schedule` is called exactly once per run, at the first stage
/// carrying a temperature schedule; every later temperature-bearing stage
/// continues from the terminal state via `continue_schedule`, and stages
/// without a schedule hold the current targets via `continue_current`.
pub trait DynamicsIntegrator {
    fn timestep(&self) -> f64;

    fn initialize_schedule(
        &mut self,
        temp: &ScheduleFunction,
        econ: &ScheduleFunction,
        steps: u64,
        full_timestep: Option<f64>,
    ) -> Result<(), EngineError>;

    fn continue_schedule(
        &mut self,
        temp: &ScheduleFunction,
        econ: &ScheduleFunction,
        steps: u64,
        half_timestep: f64,
    ) -> Result<(), EngineError>;

    fn continue_current(&mut self, half_timestep: f64) -> Result<(), EngineError>;

    fn run(&mut self, fraction: Option<f64>) -> Result<(), EngineError>;
}
