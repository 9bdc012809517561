use crate::core::params::ParamError;
use crate::core::templates::TemplateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("custom stage '{stage}' is missing its 'after' anchor")]
    MissingAfterKey { stage: String },

    #[error("unresolvable stage reference(s): {}", stages.join(", "))]
    UnresolvableStageReference { stages: Vec<String> },

    #[error("minimization failed: {0}")]
    Minimization(String),

    #[error("dynamics integration failed: {0}")]
    Dynamics(String),

    #[error("internal logic error: {0}")]
    Internal(String),
}
