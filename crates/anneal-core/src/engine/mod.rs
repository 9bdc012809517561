//! # Engine Module
//!
//! The stateful logic layer of the annealing scheduler. It turns user
//! settings and the built-in stage templates into a resolved pipeline, and
//! drives the external refinement engine and dynamics integrator through it.
//!
//! ## Architecture
//!
//! - **Settings** ([`config`]) - The nested user configuration surface:
//!   global override maps, per-stage overrides, and custom stages
//! - **Stage Builder** ([`builder`]) - The three-tier override cascade and
//!   fixed-point resolution of custom-stage anchors
//! - **Stage Executor** ([`executor`]) - The sequential per-stage state
//!   machine, including the initialize-once dynamics-continuation protocol
//! - **Collaborators** ([`traits`]) - The consumed capabilities of the
//!   external refinement engine and dynamics integrator
//! - **Progress Monitoring** ([`progress`]) - Callback-based stage progress
//!   reporting
//! - **Error Handling** ([`error`]) - Engine-specific error types and
//!   propagation
//!
//! ## Invariants
//!
//! - Every validation error surfaces during resolution, before any dynamics
//!   work begins
//! - Execution is strictly sequential over the resolved order; stages are
//!   never reordered, retried, or skipped once a run starts
//! - The dynamics schedule is initialized at most once per run, at the first
//!   stage carrying a temperature schedule

pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod progress;
#[cfg(test)]
pub(crate) mod stubs;
pub mod traits;
