//! Scripted collaborator stubs used by executor and workflow tests.

use super::error::EngineError;
use super::traits::{DynamicsIntegrator, RefinementEngine};
use crate::core::params::ParamDict;
use crate::core::schedule::ScheduleFunction;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SetPars { keys: Vec<String> },
    SetForces { keys: Vec<String> },
    Minimize { steps: u64 },
    Stochastic { steps: u64, algorithm: String },
    Initialize {
        steps: u64,
        full_timestep: Option<f64>,
        temp_at_start: f64,
        econ_at_start: f64,
    },
    Continue {
        steps: u64,
        half_timestep: f64,
        temp_at_end: f64,
    },
    Hold { half_timestep: f64 },
    Run { fraction: Option<f64> },
}

#[derive(Default)]
pub(crate) struct ScriptedEngine {
    pub calls: Vec<Call>,
    pub last_end_cutoff: Option<f64>,
    pub fail_on_minimize: bool,
    pub energy: f64,
}

impl RefinementEngine for ScriptedEngine {
    fn set_pars(&mut self, pars: &ParamDict) -> Result<(), EngineError> {
        if let Some(end) = pars.get("end").and_then(|v| v.as_f64()) {
            self.last_end_cutoff = Some(end);
        }
        self.calls.push(Call::SetPars {
            keys: pars.iter().map(|(k, _)| k.to_string()).collect(),
        });
        Ok(())
    }

    fn set_forces(&mut self, forces: &ParamDict) -> Result<(), EngineError> {
        self.calls.push(Call::SetForces {
            keys: forces.iter().map(|(k, _)| k.to_string()).collect(),
        });
        Ok(())
    }

    fn pars(&self) -> String {
        "scripted".to_string()
    }

    fn forces(&self) -> String {
        "scripted".to_string()
    }

    fn run_local_minimize(&mut self, steps: u64, _tolerance: f64) -> Result<(), EngineError> {
        if self.fail_on_minimize {
            return Err(EngineError::Minimization("scripted failure".to_string()));
        }
        self.calls.push(Call::Minimize { steps });
        Ok(())
    }

    fn run_stochastic_refine(
        &mut self,
        steps: u64,
        algorithm: &str,
        _radius: f64,
    ) -> Result<(), EngineError> {
        self.calls.push(Call::Stochastic {
            steps,
            algorithm: algorithm.to_string(),
        });
        Ok(())
    }

    fn energy(&mut self) -> f64 {
        self.energy
    }
}

pub(crate) struct ScriptedIntegrator {
    pub calls: Vec<Call>,
    pub timestep: f64,
    pub fail_on_initialize: bool,
}

impl Default for ScriptedIntegrator {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            timestep: 4.0,
            fail_on_initialize: false,
        }
    }
}

impl DynamicsIntegrator for ScriptedIntegrator {
    fn timestep(&self) -> f64 {
        self.timestep
    }

    fn initialize_schedule(
        &mut self,
        temp: &ScheduleFunction,
        econ: &ScheduleFunction,
        steps: u64,
        full_timestep: Option<f64>,
    ) -> Result<(), EngineError> {
        if self.fail_on_initialize {
            return Err(EngineError::Dynamics("scripted divergence".to_string()));
        }
        self.calls.push(Call::Initialize {
            steps,
            full_timestep,
            temp_at_start: temp.eval(0.0),
            econ_at_start: econ.eval(0.0),
        });
        Ok(())
    }

    fn continue_schedule(
        &mut self,
        temp: &ScheduleFunction,
        _econ: &ScheduleFunction,
        steps: u64,
        half_timestep: f64,
    ) -> Result<(), EngineError> {
        self.calls.push(Call::Continue {
            steps,
            half_timestep,
            temp_at_end: temp.eval(1.0),
        });
        Ok(())
    }

    fn continue_current(&mut self, half_timestep: f64) -> Result<(), EngineError> {
        self.calls.push(Call::Hold { half_timestep });
        Ok(())
    }

    fn run(&mut self, fraction: Option<f64>) -> Result<(), EngineError> {
        self.calls.push(Call::Run { fraction });
        Ok(())
    }
}
