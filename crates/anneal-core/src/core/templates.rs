use super::options::DynamicsOptions;
use super::params::{ParamDict, ParamKind, ParamValue};
use super::schedule::{EconSpec, TempSpec};
use super::stage::StageSpec;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("step budget exhausted: {needed} steps reserved but only {steps} configured")]
    StepBudget { steps: u64, needed: u64 },
}

/// Temperature of the low-temperature polishing stage (K).
const POLISH_TEMP: f64 = 25.0;

/// Distance cutoffs walked during the minimize-only prep stage.
const PREP_END_RAMP: [f64; 4] = [20.0, 10.0, 6.0, 4.6];

/// The step-budget partition derived from the global options.
///
/// The four chunks always satisfy
/// `steps_high + steps_anneal1 + steps_anneal2 + steps_end == steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPartition {
    pub steps_high: u64,
    pub steps_anneal1: u64,
    pub steps_anneal2: u64,
    pub med_temp: u64,
}

impl StepPartition {
    pub fn derive(opts: &DynamicsOptions) -> Result<Self, TemplateError> {
        let steps_high = (opts.steps as f64 * opts.high_frac).round() as u64;

        let reserved = opts.steps_end + steps_high;
        let remaining = opts.steps.checked_sub(reserved).ok_or(TemplateError::StepBudget {
            steps: opts.steps,
            needed: reserved,
        })?;

        let steps_anneal1 = (remaining as f64 * opts.to_med_frac).round() as u64;
        let consumed = steps_high + opts.steps_end + steps_anneal1;
        let steps_anneal2 = opts.steps.checked_sub(consumed).ok_or(TemplateError::StepBudget {
            steps: opts.steps,
            needed: consumed,
        })?;

        let med_temp = (opts.high_temp * opts.med_frac).round() as u64;

        Ok(Self {
            steps_high,
            steps_anneal1,
            steps_anneal2,
            med_temp,
        })
    }
}

/// The requested pipeline flavor, parsed from the user-facing mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    Refine,
    Prep,
    Anneal,
    Cff,
    Gen,
    Standard,
}

impl Mode {
    /// Unknown mode strings fall back to the standard pipeline.
    pub fn parse(mode: &str) -> Self {
        match mode {
            "all" => Mode::All,
            "refine" => Mode::Refine,
            "prep" => Mode::Prep,
            "anneal" => Mode::Anneal,
            "cff" => Mode::Cff,
            "gen" => Mode::Gen,
            _ => Mode::Standard,
        }
    }

    /// Stage subset for this mode. `gen` runs the full pipeline whenever the
    /// covalent-force switching stages carry a step budget.
    pub fn stage_names(&self, opts: &DynamicsOptions) -> &'static [&'static str] {
        const ALL: &[&str] = &[
            "prep",
            "hi",
            "anneal_hi",
            "anneal_med",
            "anneal_low",
            "cff_reduced",
            "cff_full",
            "low",
        ];
        const STANDARD: &[&str] = &["prep", "hi", "anneal_hi", "anneal_med", "anneal_low", "low"];

        match self {
            Mode::All => ALL,
            Mode::Refine => &["refine", "low"],
            Mode::Prep => &["prep"],
            Mode::Anneal => &["hi", "anneal_hi", "anneal_med", "anneal_low", "low"],
            Mode::Cff => &["cff_reduced", "cff_full"],
            Mode::Gen if opts.cff_steps != 0 => ALL,
            Mode::Gen | Mode::Standard => STANDARD,
        }
    }
}

/// Instantiates one of the built-in stage templates.
///
/// Returns `None` for unknown names; the mode tables above only ever name
/// templates that exist.
pub fn instantiate(name: &str, opts: &DynamicsOptions, part: &StepPartition) -> Option<StageSpec> {
    let stage = match name {
        "prep" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [
                    ("coarse", true.into()),
                    ("useh", false.into()),
                    ("hardSphere", 0.15.into()),
                    ("shrinkValue", 0.20.into()),
                    ("shrinkHValue", 0.05.into()),
                    ("dislim", ParamValue::Float(4.6)),
                ],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [
                    ("repel", ParamValue::Float(0.5)),
                    ("dis", 1.0.into()),
                    ("irp", 0.05.into()),
                    ("dih", ParamValue::Int(5)),
                ],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.end_ramp = Some(PREP_END_RAMP.to_vec());
            stage.minimizer_steps = Some(opts.min_steps);
            stage
        }
        "hi" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [
                    ("useh", ParamValue::Bool(false)),
                    ("hardSphere", 0.4.into()),
                    ("updateAt", ParamValue::Int(opts.update as i64)),
                ],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [("repel", ParamValue::Float(0.1)), ("dis", 0.2.into())],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.temp = Some(TempSpec::Constant(opts.high_temp));
            stage.econ = Some(EconSpec::Constant(opts.econ_high));
            stage.step_count = Some(part.steps_high);
            stage.switch_fraction = Some(opts.switch_frac);
            stage.timestep_override = Some(opts.time_step);
            stage
        }
        "anneal_hi" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [("useh", ParamValue::Bool(false))],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [("repel", ParamValue::Float(0.5)), ("dis", 1.0.into())],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.temp = Some(TempSpec::RampPow {
                up: opts.high_temp,
                down: part.med_temp as f64,
                power: opts.time_power_high,
            });
            stage.econ = Some(EconSpec::Decay {
                scale: opts.econ_high,
            });
            stage.step_count = Some(part.steps_anneal1);
            stage
        }
        "anneal_med" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [("useh", ParamValue::Bool(true))],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [("repel", ParamValue::Float(1.0)), ("dis", 1.0.into())],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.temp = Some(TempSpec::RampPow {
                up: part.med_temp as f64,
                down: 1.0,
                power: opts.time_power_med,
            });
            stage.econ = Some(EconSpec::DecayBase {
                scale: opts.econ_high,
                base: opts.econ_low / opts.econ_high,
            });
            stage.step_count = Some(part.steps_anneal2);
            stage
        }
        "anneal_low" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [("useh", ParamValue::Bool(true))],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [("repel", ParamValue::Float(1.6)), ("dis", 1.0.into())],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.temp = Some(TempSpec::Constant(POLISH_TEMP));
            stage.econ = Some(EconSpec::Constant(opts.econ_low));
            stage.step_count = Some(opts.polish_steps);
            stage
        }
        "cff_reduced" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [("useh", ParamValue::Bool(true))],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [
                    ("cffnb", ParamValue::Float(0.5)),
                    ("repel", 0.0.into()),
                ],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.step_count = Some(opts.cff_steps);
            stage.minimizer_steps = Some(opts.min_steps);
            if opts.dfree_steps > 0 {
                stage.non_deriv_steps = Some(opts.dfree_steps);
            }
            stage
        }
        "cff_full" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [("useh", ParamValue::Bool(true))],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [
                    ("cffnb", ParamValue::Float(1.0)),
                    ("elec", 1.0.into()),
                ],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.step_count = Some(opts.cff_steps);
            stage.minimizer_steps = Some(opts.min_steps);
            stage
        }
        "low" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [("useh", ParamValue::Bool(true))],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [("repel", ParamValue::Float(2.0))],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.temp = Some(TempSpec::Constant(0.0));
            stage.econ = Some(EconSpec::Constant(opts.econ_low));
            stage.step_count = Some(opts.steps_end);
            stage.minimizer_steps = Some(opts.min_steps);
            stage
        }
        "refine" => {
            let param = ParamDict::with_defaults(
                ParamKind::Param,
                [
                    ("useh", ParamValue::Bool(true)),
                    ("dislim", 4.6.into()),
                ],
            );
            let force = ParamDict::with_defaults(
                ParamKind::Force,
                [
                    ("repel", ParamValue::Float(1.0)),
                    ("dis", 1.0.into()),
                    ("irp", opts.irp_weight.into()),
                ],
            );
            let mut stage = StageSpec::new(name, param, force);
            stage.temp = Some(TempSpec::RampPow {
                up: part.med_temp as f64,
                down: 1.0,
                power: opts.time_power_med,
            });
            stage.econ = Some(EconSpec::Constant(opts.econ_low));
            stage.step_count = Some(opts.steps.saturating_sub(opts.steps_end));
            stage.minimizer_steps = Some(opts.min_steps);
            if opts.dfree_steps > 0 {
                stage.non_deriv_steps = Some(opts.dfree_steps);
            }
            stage
        }
        _ => return None,
    };
    Some(stage)
}
