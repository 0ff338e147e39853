//! Per-scope plan slots and merging them into one pipeline plan.
//!
//! The accumulator is sized up front with one slot per scope entry. Each compilation
//! borrows exactly one slot, so entries compiled in sequence (or from different threads,
//! through disjoint `slot_mut` borrows) never see each other's stages.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::PlannerSettings;
use crate::contract::{
    ConnectionDescriptor, PipelinePlan, RepositoryDescriptor, ScopeEntry, ScopePlan, SubtaskMeta,
};
use crate::error::{CompileError, PlanError};
use crate::plan::compile_scope;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PlanAccumulator {
    slots: Vec<ScopePlan>,
}

/// A scope entry paired with its resolved repository.
#[derive(Debug, Clone, Copy)]
pub struct ScopeInput<'a> {
    pub scope: &'a ScopeEntry,
    pub repository: &'a RepositoryDescriptor,
}

impl PlanAccumulator {
    pub fn new(scopes: usize) -> Self {
        Self {
            slots: vec![ScopePlan::new(); scopes],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, scope_index: usize) -> Option<&ScopePlan> {
        self.slots.get(scope_index)
    }

    pub fn slot_mut(&mut self, scope_index: usize) -> Option<&mut ScopePlan> {
        self.slots.get_mut(scope_index)
    }

    pub fn slots(&self) -> &[ScopePlan] {
        &self.slots
    }

    /// Parallelizes the scope plans: stage `k` of the result runs stage `k` of every
    /// scope, in scope order.
    pub fn merge(&self) -> PipelinePlan {
        let depth = self.slots.iter().map(Vec::len).max().unwrap_or(0);
        (0..depth)
            .map(|k| {
                self.slots
                    .iter()
                    .filter_map(|plan| plan.get(k))
                    .flat_map(|stage| stage.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Compiles `inputs` in order into the matching slots of `accumulator`.
///
/// Stops at the first failing entry. Slots compiled before it stay valid; the failing
/// entry's slot and every later one are left as they were.
pub fn compile_scopes(
    settings: &PlannerSettings,
    connection: &ConnectionDescriptor,
    subtask_metas: &[SubtaskMeta],
    inputs: &[ScopeInput<'_>],
    accumulator: &mut PlanAccumulator,
) -> Result<(), PlanError> {
    info!(scopes = inputs.len(), slots = accumulator.len(), "Compiling scopes");
    let len = accumulator.len();
    for (scope_index, input) in inputs.iter().enumerate() {
        let slot = accumulator.slot_mut(scope_index).ok_or_else(|| {
            warn!(scope_index, len, "Accumulator is smaller than the scope list");
            PlanError {
                scope_index,
                kind: CompileError::SlotOutOfRange { len },
            }
        })?;
        compile_scope(
            settings,
            scope_index,
            input.scope,
            input.repository,
            connection,
            subtask_metas,
            slot,
        )?;
    }
    Ok(())
}
