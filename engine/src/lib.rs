//! # IAT: Implicit Association Test trial engine
//!
//! Runs a four-block Implicit Association Test pairing the concepts
//! *Seres Humanos* / *Inteligencia Artificial* with the attributes
//! *Confiable* / *No Confiable*, and records one row per answered trial.
//!
//! ## Pipeline
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | Catalog | [`catalog`] | Four validated word lists, one per [`types::Category`] |
//! | Sequence | [`trial_generator`] | Eligible stimuli for a block, uniformly shuffled |
//! | Rules | [`response_rules`] | (block, category) → correct [`types::Side`], side labels |
//! | Session | [`session`] | Trial state machine: onset, response, recording, block advance |
//! | Log | [`recorder`] | Append-only CSV result log, one fsync'd row per outcome |
//! | Adapter | [`presentation`], [`server`] | Immutable snapshots, key bindings, axum HTTP frontend |
//!
//! ## Blocks
//!
//! 1. Practice, human words only (Left).
//! 2. Practice, AI words only (Right).
//! 3. Combined congruent: Human/Trust Left, AI/Untrust Right.
//! 4. Combined reversed: AI/Trust Left, Human/Untrust Right.
//!
//! Block 4 swaps only the concept sides; attributes stay where they were in
//! block 3. Per-trial reaction time is measured against a monotonic clock and
//! stored in milliseconds with three decimals.

pub mod catalog;
pub mod constants;
pub mod env_config;
pub mod error;
pub mod presentation;
pub mod recorder;
pub mod response_rules;
pub mod server;
pub mod session;
pub mod trial_generator;
pub mod types;
