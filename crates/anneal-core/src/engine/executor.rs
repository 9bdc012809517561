use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::traits::{DynamicsIntegrator, RefinementEngine};
use crate::core::options::DynamicsOptions;
use crate::core::schedule::{resolve_econ, resolve_temp, TempSchedule};
use crate::core::stage::{StagePipeline, StageSpec};
use tracing::{debug, info, instrument};

/// Gradient tolerance handed to bounded local minimizations.
const MINIMIZE_TOLERANCE: f64 = 1e-7;

/// Search radius handed to stochastic refinement passes.
const STOCHASTIC_RADIUS: f64 = 2.0;

/// Minimization step count used by the prep branch when a stage does not
/// specify its own.
const DEFAULT_MINIMIZE_STEPS: u64 = 100;

/// Run-scoped dynamics-continuation state.
///
/// Owned by the pipeline driver, never a module global: it flips to
/// initialized at most once per run, at the first stage carrying a resolved
/// temperature schedule, and must be reset before each fresh run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionState {
    initialized: bool,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.initialized = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Walks a resolved pipeline sequentially, driving the refinement engine and
/// the dynamics integrator. Strictly single-threaded: every stage depends on
/// the exact terminal physical state of the previous one.
pub struct StageExecutor<'a, R, D>
where
    R: RefinementEngine,
    D: DynamicsIntegrator,
{
    engine: &'a mut R,
    integrator: &'a mut D,
    options: &'a DynamicsOptions,
    reporter: &'a ProgressReporter<'a>,
    state: ExecutionState,
    last_started: Option<String>,
}

impl<'a, R, D> StageExecutor<'a, R, D>
where
    R: RefinementEngine,
    D: DynamicsIntegrator,
{
    pub fn new(
        engine: &'a mut R,
        integrator: &'a mut D,
        options: &'a DynamicsOptions,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            engine,
            integrator,
            options,
            reporter,
            state: ExecutionState::new(),
            last_started: None,
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Name of the most recently started stage, for failure diagnostics.
    pub fn last_started(&self) -> Option<&str> {
        self.last_started.as_deref()
    }

    /// Executes every stage in pipeline order. Delegated failures abort the
    /// run unchanged; no per-stage retry is attempted because the physical
    /// state after a partial dynamics step cannot be cleanly reverted.
    pub fn run(&mut self, pipeline: &StagePipeline) -> Result<(), EngineError> {
        for stage in pipeline.iter() {
            self.reporter.report(Progress::StageStart {
                name: stage.name.clone(),
            });
            self.last_started = Some(stage.name.clone());
            info!(stage = %stage.name, "starting stage");
            self.run_stage(stage)?;
            self.reporter.report(Progress::StageFinish);
        }
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(stage = %stage.name))]
    fn run_stage(&mut self, stage: &StageSpec) -> Result<(), EngineError> {
        // 1. The engine always sees the stage's dictionaries first.
        self.engine.set_pars(&stage.param)?;
        self.engine.set_forces(&stage.force)?;

        // 2. Minimize-only pre-conditioning: walk the cutoff ramp and return
        //    without touching dynamics.
        if let Some(ramp) = &stage.end_ramp {
            let steps = stage.minimizer_steps.unwrap_or(DEFAULT_MINIMIZE_STEPS);
            for &cutoff in ramp {
                let mut param = stage.param.clone();
                param.set("end", cutoff.into())?;
                self.engine.set_pars(&param)?;
                self.reporter.report(Progress::StatusUpdate {
                    text: format!("minimizing to cutoff {:.2}", cutoff),
                });
                self.engine.run_local_minimize(steps, MINIMIZE_TOLERANCE)?;
            }
            return Ok(());
        }

        // 3. Optional refinement passes ahead of dynamics.
        if let Some(steps) = stage.non_deriv_steps.filter(|&s| s > 0) {
            self.engine
                .run_stochastic_refine(steps, &self.options.dfree_alg, STOCHASTIC_RADIUS)?;
        }
        if let Some(steps) = stage.minimizer_steps.filter(|&s| s > 0) {
            self.engine.run_local_minimize(steps, MINIMIZE_TOLERANCE)?;
        }

        // 4. Resolve the schedules and hand the stage to the integrator.
        let econ = resolve_econ(stage.econ.as_ref());
        let half_timestep = self.integrator.timestep() / 2.0;
        let step_count = stage.step_count.unwrap_or(self.options.min_steps);

        match resolve_temp(stage.temp.as_ref()) {
            TempSchedule::Run(temp) => {
                if !self.state.initialized {
                    debug!(steps = step_count, "initializing dynamics schedule");
                    self.integrator.initialize_schedule(
                        &temp,
                        &econ,
                        step_count,
                        stage.timestep_override,
                    )?;
                    self.state.initialized = true;
                } else {
                    debug!(steps = step_count, "continuing dynamics schedule");
                    self.integrator
                        .continue_schedule(&temp, &econ, step_count, half_timestep)?;
                }
            }
            // No retargeting: hold the current temperature and polish.
            TempSchedule::Hold => self.integrator.continue_current(half_timestep)?,
        }

        self.integrator.run(stage.switch_fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::StagePipeline;
    use crate::core::templates::{self, Mode, StepPartition};
    use crate::engine::stubs::{Call, ScriptedEngine, ScriptedIntegrator};

    fn pipeline_for(mode: Mode, opts: &DynamicsOptions) -> StagePipeline {
        let part = StepPartition::derive(opts).unwrap();
        let stages = mode
            .stage_names(opts)
            .iter()
            .filter_map(|name| templates::instantiate(name, opts, &part))
            .collect();
        StagePipeline::new(stages)
    }

    #[test]
    fn prep_stage_walks_the_cutoff_ramp_without_dynamics() {
        let opts = DynamicsOptions::default();
        let pipeline = pipeline_for(Mode::Prep, &opts);
        let mut engine = ScriptedEngine::default();
        let mut integrator = ScriptedIntegrator::default();
        let reporter = ProgressReporter::new();

        let state = {
            let mut executor = StageExecutor::new(&mut engine, &mut integrator, &opts, &reporter);
            executor.run(&pipeline).unwrap();
            executor.state()
        };

        let minimizations = engine
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Minimize { .. }))
            .count();
        assert_eq!(minimizations, 4); // one per ramp cutoff
        assert!(integrator.calls.is_empty());
        assert!(!state.is_initialized());
        // The last applied cutoff is the tightest one.
        assert_eq!(engine.last_end_cutoff, Some(4.6));
    }

    #[test]
    fn first_temperature_stage_initializes_then_rest_continue() {
        let opts = DynamicsOptions::default();
        let pipeline = pipeline_for(Mode::Anneal, &opts);
        let mut engine = ScriptedEngine::default();
        let mut integrator = ScriptedIntegrator::default();
        let reporter = ProgressReporter::new();

        let state = {
            let mut executor = StageExecutor::new(&mut engine, &mut integrator, &opts, &reporter);
            executor.run(&pipeline).unwrap();
            executor.state()
        };
        assert!(state.is_initialized());

        let inits: Vec<_> = integrator
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Initialize { .. }))
            .collect();
        assert_eq!(inits.len(), 1);
        // The initializing stage is hi: its schedule starts at high_temp
        // with the hot-phase energy constant and the full hi step chunk.
        assert!(matches!(
            inits[0],
            Call::Initialize { temp_at_start, econ_at_start, steps, .. }
                if *temp_at_start == opts.high_temp
                    && *econ_at_start == opts.econ_high
                    && *steps == 4500
        ));

        let continues: Vec<_> = integrator
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Continue { .. }))
            .collect();
        // anneal_hi, anneal_med, anneal_low, low.
        assert_eq!(continues.len(), 4);
        // The final continuation is low, whose schedule ends at 0 K.
        assert!(matches!(
            continues.last().unwrap(),
            Call::Continue { temp_at_end, .. } if *temp_at_end == 0.0
        ));
    }

    #[test]
    fn dictionaries_are_applied_before_anything_else() {
        let opts = DynamicsOptions::default();
        let pipeline = pipeline_for(Mode::Anneal, &opts);
        let mut engine = ScriptedEngine::default();
        let mut integrator = ScriptedIntegrator::default();
        let reporter = ProgressReporter::new();

        StageExecutor::new(&mut engine, &mut integrator, &opts, &reporter)
            .run(&pipeline)
            .unwrap();

        assert!(matches!(
            &engine.calls[0],
            Call::SetPars { keys } if keys.iter().any(|k| k == "useh")
        ));
        assert!(matches!(
            &engine.calls[1],
            Call::SetForces { keys } if keys.iter().any(|k| k == "repel")
        ));
    }

    #[test]
    fn initialization_passes_the_timestep_override() {
        let opts = DynamicsOptions::default();
        let pipeline = pipeline_for(Mode::Anneal, &opts);
        let mut engine = ScriptedEngine::default();
        let mut integrator = ScriptedIntegrator::default();
        let reporter = ProgressReporter::new();

        StageExecutor::new(&mut engine, &mut integrator, &opts, &reporter)
            .run(&pipeline)
            .unwrap();

        assert!(matches!(
            integrator.calls[0],
            Call::Initialize { full_timestep: Some(t), .. } if t == opts.time_step
        ));
    }

    #[test]
    fn schedule_free_stage_holds_current_targets() {
        let mut opts = DynamicsOptions::default();
        opts.cff_steps = 200;
        let pipeline = pipeline_for(Mode::Cff, &opts);
        let mut engine = ScriptedEngine::default();
        let mut integrator = ScriptedIntegrator::default();
        let reporter = ProgressReporter::new();

        let state = {
            let mut executor = StageExecutor::new(&mut engine, &mut integrator, &opts, &reporter);
            executor.run(&pipeline).unwrap();
            executor.state()
        };

        let holds = integrator
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Hold { .. }))
            .count();
        assert_eq!(holds, 2);
        assert!(!state.is_initialized());
        // Hold passes half the current timestep.
        assert!(matches!(
            integrator.calls[0],
            Call::Hold { half_timestep } if half_timestep == integrator.timestep / 2.0
        ));
    }

    #[test]
    fn switch_fraction_reaches_the_integrator_run() {
        let opts = DynamicsOptions::default();
        let pipeline = pipeline_for(Mode::Anneal, &opts);
        let mut engine = ScriptedEngine::default();
        let mut integrator = ScriptedIntegrator::default();
        let reporter = ProgressReporter::new();

        StageExecutor::new(&mut engine, &mut integrator, &opts, &reporter)
            .run(&pipeline)
            .unwrap();

        let runs: Vec<_> = integrator
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Run { fraction } => Some(*fraction),
                _ => None,
            })
            .collect();
        // hi carries the switch fraction; the rest run to completion.
        assert_eq!(runs[0], Some(opts.switch_frac));
        assert!(runs[1..].iter().all(|f| f.is_none()));
    }

    #[test]
    fn stochastic_pass_uses_configured_algorithm() {
        let mut opts = DynamicsOptions::default();
        opts.dfree_steps = 50;
        opts.dfree_alg = "powell".to_string();
        let pipeline = pipeline_for(Mode::Refine, &opts);
        let mut engine = ScriptedEngine::default();
        let mut integrator = ScriptedIntegrator::default();
        let reporter = ProgressReporter::new();

        StageExecutor::new(&mut engine, &mut integrator, &opts, &reporter)
            .run(&pipeline)
            .unwrap();

        assert!(engine.calls.iter().any(|c| matches!(
            c,
            Call::Stochastic { steps: 50, algorithm } if algorithm == "powell"
        )));
    }

    #[test]
    fn delegated_failure_aborts_the_run_unchanged() {
        let opts = DynamicsOptions::default();
        let pipeline = pipeline_for(Mode::Anneal, &opts);
        let mut engine = ScriptedEngine::default();
        let mut integrator = ScriptedIntegrator::default();
        integrator.fail_on_initialize = true;
        let reporter = ProgressReporter::new();

        let err = StageExecutor::new(&mut engine, &mut integrator, &opts, &reporter)
            .run(&pipeline)
            .unwrap_err();
        assert!(matches!(err, EngineError::Dynamics(_)));
        // Nothing after the failing stage ran.
        assert!(!integrator.calls.iter().any(|c| matches!(c, Call::Continue { .. })));
    }

    #[test]
    fn state_reset_allows_a_fresh_initialize() {
        let mut state = ExecutionState::new();
        assert!(!state.is_initialized());
        state.initialized = true;
        state.reset();
        assert!(!state.is_initialized());
    }
}
