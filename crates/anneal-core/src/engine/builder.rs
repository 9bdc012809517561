use super::config::{Settings, StageOverride};
use super::error::EngineError;
use crate::core::options::DynamicsOptions;
use crate::core::stage::{StagePipeline, StageSpec};
use crate::core::templates::{self, Mode, StepPartition};
use tracing::{debug, info};

/// Resolves the stage pipeline for a mode: template defaults, the override
/// cascade (global settings, then per-stage settings), and dynamic insertion
/// of custom stages at their `after` anchors.
///
/// All validation happens here, before any dynamics work begins.
pub fn build(
    mode: Mode,
    options: &DynamicsOptions,
    settings: &Settings,
) -> Result<StagePipeline, EngineError> {
    let partition = StepPartition::derive(options)?;

    // 1. Instantiate the selected templates in mode order. The mode tables
    //    only name templates that exist, so a miss is a logic error.
    let mut stages: Vec<StageSpec> = Vec::new();
    for name in mode.stage_names(options) {
        let stage = templates::instantiate(name, options, &partition).ok_or_else(|| {
            EngineError::Internal(format!("mode table names unknown template '{name}'"))
        })?;
        stages.push(stage);
    }
    debug!(?mode, stages = stages.len(), "instantiated stage templates");

    // 2. Global settings apply to every selected stage.
    for stage in &mut stages {
        stage
            .param
            .strict_update(settings.param.iter().map(|(k, v)| (k, v)))?;
        stage
            .force
            .strict_update(settings.force.iter().map(|(k, v)| (k, v)))?;
    }

    // 3. Per-stage settings win over the global tier. Every override table
    //    must name a stage in the selected pipeline; typos fail the build.
    let unknown: Vec<String> = settings
        .stages
        .iter()
        .map(|(name, _)| name)
        .filter(|name| !stages.iter().any(|s| &s.name == *name))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(EngineError::UnresolvableStageReference { stages: unknown });
    }
    for stage in &mut stages {
        if let Some(overrides) = settings.stage_override(&stage.name) {
            apply_override(stage, overrides)?;
        }
    }

    // 4. Splice custom stages in after their anchors.
    insert_custom_stages(&mut stages, settings)?;

    info!(
        stages = ?stages.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        "stage pipeline resolved"
    );
    Ok(StagePipeline::new(stages))
}

fn apply_override(stage: &mut StageSpec, overrides: &StageOverride) -> Result<(), EngineError> {
    stage
        .param
        .strict_update(overrides.param.iter().map(|(k, v)| (k, v)))?;
    stage
        .force
        .strict_update(overrides.force.iter().map(|(k, v)| (k, v)))?;

    if let Some(temp) = &overrides.temp {
        stage.temp = Some(temp.clone());
    }
    if let Some(econ) = &overrides.econ {
        stage.econ = Some(econ.clone());
    }
    if let Some(steps) = overrides.step_count {
        stage.step_count = Some(steps);
    }
    if let Some(steps) = overrides.minimizer_steps {
        stage.minimizer_steps = Some(steps);
    }
    if let Some(steps) = overrides.non_deriv_steps {
        stage.non_deriv_steps = Some(steps);
    }
    if let Some(fraction) = overrides.switch_fraction {
        stage.switch_fraction = Some(fraction);
    }
    if let Some(timestep) = overrides.timestep_override {
        stage.timestep_override = Some(timestep);
    }
    if let Some(ramp) = &overrides.end_ramp {
        stage.end_ramp = Some(ramp.clone());
    }
    Ok(())
}

/// Iterative fixed-point insertion: scan the current ordering, and whenever
/// an unplaced custom names the visited stage as its anchor, clone the
/// anchor, overlay the custom's body, and insert the clone immediately after
/// the anchor. Same-anchor customs land adjacent in declaration order.
/// A full pass that places nothing terminates the loop; any leftover custom
/// has a dangling or cyclic anchor and fails the build.
fn insert_custom_stages(
    stages: &mut Vec<StageSpec>,
    settings: &Settings,
) -> Result<(), EngineError> {
    let mut pending = settings.custom.clone();
    if pending.is_empty() {
        return Ok(());
    }

    // A custom with no anchor can never be placed.
    for custom in &pending {
        if custom.after.is_none() {
            return Err(EngineError::MissingAfterKey {
                stage: custom.name.clone(),
            });
        }
    }

    // Each productive pass places at least one stage, so the pass count is
    // bounded by the number of customs.
    let max_passes = pending.len();
    for _ in 0..=max_passes {
        if pending.is_empty() {
            break;
        }

        let mut placed_any = false;
        let mut i = 0;
        while i < stages.len() {
            let anchor = stages[i].name.clone();
            let mut insert_at = i + 1;
            let mut j = 0;
            while j < pending.len() {
                if pending[j].after.as_deref() == Some(anchor.as_str()) {
                    let custom = pending.remove(j);
                    let mut stage = stages[i].clone();
                    stage.name = custom.name.clone();
                    apply_override(&mut stage, &custom.body)?;
                    debug!(stage = %stage.name, after = %anchor, "placed custom stage");
                    stages.insert(insert_at, stage);
                    insert_at += 1;
                    placed_any = true;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        if !placed_any {
            break;
        }
    }

    if pending.is_empty() {
        Ok(())
    } else {
        Err(EngineError::UnresolvableStageReference {
            stages: pending.into_iter().map(|c| c.name).collect(),
        })
    }
}
