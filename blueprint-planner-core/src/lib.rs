#![doc = "blueprint-planner-core: compiles blueprint scopes into ordered plugin pipeline plans."]

//! This crate holds the data model and the pure compilation logic for blueprint-planner.
//! Nothing in here touches the network or the filesystem; repository descriptors and
//! connections are resolved by the caller and handed in.
//!
//! # Usage
//! Decode a [`contract::ScopeEntry`], resolve its repository, then call
//! [`plan::compile_scope`] with the accumulator slot for that scope's index, or
//! [`accumulator::compile_scopes`] for a whole batch.

pub mod accumulator;
pub mod config;
pub mod contract;
pub mod error;
pub mod identifier;
pub mod options;
pub mod plan;
pub mod subtasks;
pub mod transformation;
