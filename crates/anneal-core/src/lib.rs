//! # Anneal++ Core Library
//!
//! A staged simulated-annealing scheduler and parameter-resolution engine
//! for molecular structure refinement.
//!
//! The library partitions a global dynamics step budget into named annealing
//! phases, resolves each phase's numeric knobs through a three-tier override
//! cascade (built-in template, then user global settings, then user
//! per-stage settings) under strict key validation, supports splicing
//! user-defined stages in after named anchors, and executes the resolved
//! pipeline against a stateful dynamics-continuation protocol.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to keep
//! the scheduling logic testable without any physics engine attached:
//!
//! - **[`core`]: The Foundation.** Stateless data models (parameter
//!   dictionaries, global options, stage templates) and pure schedule
//!   functions of the completion fraction.
//!
//! - **[`engine`]: The Logic Core.** The stateful layer: settings ingestion,
//!   the stage builder's override cascade and fixed-point anchor resolution,
//!   and the per-stage execution state machine with its initialize-once
//!   continuation protocol.
//!
//! - **[`workflows`]: The Public API.** The user-facing entry point that
//!   resolves a pipeline for a mode and drives a complete run against the
//!   caller's refinement engine and dynamics integrator.
//!
//! The physical integrator, the energy evaluator, and all molecule I/O are
//! external collaborators reached through the traits in [`engine::traits`].

pub mod core;
pub mod engine;
pub mod workflows;
