//! # Workflows Module
//!
//! High-level entry points tying the scheduler together. A workflow takes
//! the parsed configuration and the external collaborators, resolves the
//! stage pipeline, and drives a complete annealing run.
//!
//! - **Annealing Workflow** ([`anneal`]) - Pipeline resolution followed by
//!   sequential stage execution, with progress reporting and structured
//!   logging throughout.

pub mod anneal;
