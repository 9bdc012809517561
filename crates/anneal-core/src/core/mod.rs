//! # Core Module
//!
//! Stateless building blocks of the annealing scheduler: validated parameter
//! dictionaries, the global dynamics options, the built-in stage templates,
//! and pure schedule functions.
//!
//! ## Architecture
//!
//! - **Parameter Dictionaries** ([`params`]) - Whitelist-guarded, ordered
//!   key/value maps for the engine's `param` and `force` tables
//! - **Global Options** ([`options`]) - The closed schema of dynamics knobs
//!   every stage derives from
//! - **Stage Templates** ([`templates`]) - The canonical annealing phases,
//!   the derived step partition, and the mode table
//! - **Schedules** ([`schedule`]) - Declarative temperature/energy-constant
//!   specs resolved into pure functions of the completion fraction
//! - **Stages** ([`stage`]) - The resolved per-phase record and the ordered
//!   pipeline consumed by the execution engine
//!
//! Everything here is deterministic and free of side effects; mutation and
//! collaborator I/O live in the `engine` layer.

pub mod options;
pub mod params;
pub mod schedule;
pub mod stage;
pub mod templates;
