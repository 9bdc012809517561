use crate::core::templates::Mode;
use crate::engine::builder;
use crate::engine::config::AnnealConfig;
use crate::engine::error::EngineError;
use crate::engine::executor::StageExecutor;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::traits::{DynamicsIntegrator, RefinementEngine};
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct AnnealOutcome {
    pub stage_names: Vec<String>,
    pub final_energy: f64,
}

/// Runs the full annealing protocol for a mode: resolve the stage pipeline,
/// then execute it sequentially against the supplied collaborators.
///
/// A fresh continuation state is created per call, so repeated runs (tests,
/// batch jobs) never share dynamics state. Delegated failures abort the run
/// and propagate unchanged; the last-started stage is logged for diagnostics.
#[instrument(skip_all, name = "anneal_workflow")]
pub fn run(
    mode: &str,
    config: &AnnealConfig,
    engine: &mut impl RefinementEngine,
    integrator: &mut impl DynamicsIntegrator,
    reporter: &ProgressReporter,
) -> Result<AnnealOutcome, EngineError> {
    let mode = Mode::parse(mode);
    info!(?mode, "resolving stage pipeline");

    let pipeline = builder::build(mode, &config.options, &config.settings)?;
    let stage_names: Vec<String> = pipeline.names().iter().map(|s| s.to_string()).collect();
    reporter.report(Progress::Message(format!(
        "resolved {} stage(s): {}",
        stage_names.len(),
        stage_names.join(" -> ")
    )));

    let mut executor = StageExecutor::new(engine, integrator, &config.options, reporter);
    if let Err(err) = executor.run(&pipeline) {
        error!(
            stage = executor.last_started().unwrap_or("<none>"),
            %err,
            "annealing run aborted"
        );
        return Err(err);
    }
    drop(executor);

    let final_energy = engine.energy();
    info!(final_energy, "annealing run complete");
    Ok(AnnealOutcome {
        stage_names,
        final_energy,
    })
}
