use super::params::{ParamError, ParamKind, ParamValue};

/// Global dynamics knobs shared by every annealing stage.
///
/// The schema is closed: [`DynamicsOptions::apply`] accepts exactly the keys
/// listed here and nothing else. Defaults match the canonical protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicsOptions {
    /// Total dynamics step budget partitioned across the annealing phases.
    pub steps: u64,
    /// Starting temperature of the high-temperature phase (K).
    pub high_temp: f64,
    /// Fraction of `high_temp` used as the intermediate plateau temperature.
    pub med_frac: f64,
    /// Nonbonded-list update interval, in steps.
    pub update: u64,
    /// Fraction of the budget spent at `high_temp`.
    pub high_frac: f64,
    /// Fraction of the remaining budget spent ramping down to the plateau.
    pub to_med_frac: f64,
    /// Fraction of a stage's budget the integrator runs before switching.
    pub switch_frac: f64,
    /// Integration timestep (fs).
    pub time_step: f64,
    /// Steps reserved for the final low-temperature stage.
    pub steps_end: u64,
    /// Energy-constant target during the hot phases.
    pub econ_high: f64,
    /// Energy-constant target during the cold phases.
    pub econ_low: f64,
    /// Ramp exponent for the hot-to-plateau temperature schedule.
    pub time_power_high: f64,
    /// Ramp exponent for the plateau-to-cold temperature schedule.
    pub time_power_med: f64,
    /// Default bounded-minimization step count.
    pub min_steps: u64,
    /// Step count of the low-temperature polishing stage.
    pub polish_steps: u64,
    /// Non-derivative (stochastic) refinement step count; 0 disables it.
    pub dfree_steps: u64,
    /// Algorithm handed to the stochastic refinement pass.
    pub dfree_alg: String,
    /// Kinetic-energy scale used by the integrator's velocity assignment.
    pub kin_e_scale: f64,
    /// Weight applied to the improper-restraint force term.
    pub irp_weight: f64,
    /// Step count of the covalent-force switching stages; 0 skips them.
    pub cff_steps: u64,
}

impl Default for DynamicsOptions {
    fn default() -> Self {
        Self {
            steps: 15_000,
            high_temp: 5000.0,
            med_frac: 0.05,
            update: 20,
            high_frac: 0.3,
            to_med_frac: 0.5,
            switch_frac: 0.65,
            time_step: 4.0,
            steps_end: 100,
            econ_high: 0.005,
            econ_low: 0.001,
            time_power_high: 4.0,
            time_power_med: 4.0,
            min_steps: 100,
            polish_steps: 500,
            dfree_steps: 0,
            dfree_alg: "cmaes".to_string(),
            kin_e_scale: 200.0,
            irp_weight: 0.0,
            cff_steps: 0,
        }
    }
}

fn bad_value(key: &str, expected: &'static str) -> ParamError {
    ParamError::InvalidValue {
        key: key.to_string(),
        kind: ParamKind::Dynamics,
        expected,
    }
}

fn as_steps(key: &str, value: &ParamValue) -> Result<u64, ParamError> {
    value
        .as_i64()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(|| bad_value(key, "a non-negative integer"))
}

fn as_float(key: &str, value: &ParamValue) -> Result<f64, ParamError> {
    value.as_f64().ok_or_else(|| bad_value(key, "a number"))
}

impl DynamicsOptions {
    /// Applies overrides keyed by the external (kebab-case) option names.
    ///
    /// The first unknown key aborts with [`ParamError::InvalidKey`]; a value
    /// of the wrong shape aborts with [`ParamError::InvalidValue`].
    pub fn apply<'a, I>(&mut self, overrides: I) -> Result<(), ParamError>
    where
        I: IntoIterator<Item = (&'a String, &'a ParamValue)>,
    {
        for (key, value) in overrides {
            match key.as_str() {
                "steps" => self.steps = as_steps(key, value)?,
                "high-temp" => self.high_temp = as_float(key, value)?,
                "med-frac" => self.med_frac = as_float(key, value)?,
                "update" => self.update = as_steps(key, value)?,
                "high-frac" => self.high_frac = as_float(key, value)?,
                "to-med-frac" => self.to_med_frac = as_float(key, value)?,
                "switch-frac" => self.switch_frac = as_float(key, value)?,
                "time-step" => self.time_step = as_float(key, value)?,
                "steps-end" => self.steps_end = as_steps(key, value)?,
                "econ-high" => self.econ_high = as_float(key, value)?,
                "econ-low" => self.econ_low = as_float(key, value)?,
                "time-power-high" => self.time_power_high = as_float(key, value)?,
                "time-power-med" => self.time_power_med = as_float(key, value)?,
                "min-steps" => self.min_steps = as_steps(key, value)?,
                "polish-steps" => self.polish_steps = as_steps(key, value)?,
                "dfree-steps" => self.dfree_steps = as_steps(key, value)?,
                "dfree-alg" => {
                    self.dfree_alg = value
                        .as_str()
                        .ok_or_else(|| bad_value(key, "a string"))?
                        .to_string()
                }
                "kin-e-scale" => self.kin_e_scale = as_float(key, value)?,
                "irp-weight" => self.irp_weight = as_float(key, value)?,
                "cff-steps" => self.cff_steps = as_steps(key, value)?,
                _ => {
                    return Err(ParamError::InvalidKey {
                        key: key.clone(),
                        kind: ParamKind::Dynamics,
                    });
                }
            }
        }
        Ok(())
    }
}
