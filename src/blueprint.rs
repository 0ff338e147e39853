//! Blueprint planning: resolve every scope's repository, compile all scopes, merge the plan.
//!
//! Repository lookups run concurrently (they are the only I/O in the flow); compilation is
//! sequential and pure. Errors always name the scope index they belong to.

use anyhow::{anyhow, Result};
use blueprint_planner_core::accumulator::{compile_scopes, PlanAccumulator, ScopeInput};
use blueprint_planner_core::contract::{
    PipelinePlan, RepositoryDescriptor, RepositoryResolver, ScopeEntry,
};
use futures::future::try_join_all;
use tracing::{error, info};

use crate::load_config::{BlueprintConfig, ScopeSection};

pub async fn make_pipeline_plan<R>(config: &BlueprintConfig, resolver: &R) -> Result<PipelinePlan>
where
    R: RepositoryResolver,
{
    info!(scopes = config.scopes.len(), "[PLAN] Starting blueprint planning");

    let entries: Vec<ScopeEntry> = config.scopes.iter().map(ScopeSection::entry).collect();

    let repositories = try_join_all(
        config
            .scopes
            .iter()
            .zip(&entries)
            .enumerate()
            .map(|(scope_index, (section, entry))| {
                resolve_repository(config, resolver, scope_index, section, entry)
            }),
    )
    .await?;
    info!(resolved = repositories.len(), "[PLAN] Repositories resolved");

    let inputs: Vec<ScopeInput<'_>> = entries
        .iter()
        .zip(&repositories)
        .map(|(scope, repository)| ScopeInput { scope, repository })
        .collect();

    let mut accumulator = PlanAccumulator::new(inputs.len());
    compile_scopes(
        &config.planner,
        &config.connection,
        &config.subtasks,
        &inputs,
        &mut accumulator,
    )?;

    let plan = accumulator.merge();
    info!(stages = plan.len(), "[PLAN] Blueprint planned");
    Ok(plan)
}

async fn resolve_repository<R>(
    config: &BlueprintConfig,
    resolver: &R,
    scope_index: usize,
    section: &ScopeSection,
    entry: &ScopeEntry,
) -> Result<RepositoryDescriptor>
where
    R: RepositoryResolver,
{
    if let Some(repository) = &section.repository {
        info!(scope_index, project_id = repository.native_id, "[PLAN] Using inline repository");
        return Ok(repository.clone());
    }

    let project_id = entry.project_id().ok_or_else(|| {
        error!(scope_index, "[PLAN][ERROR] Scope has neither a repository nor a projectId");
        anyhow!("scope #{scope_index}: options.projectId is required to resolve the repository")
    })?;

    resolver
        .resolve(&config.connection, project_id)
        .await
        .map_err(|e| {
            error!(scope_index, project_id, error = %e, "[PLAN][ERROR] Repository lookup failed");
            anyhow!("scope #{scope_index}: failed to resolve project {project_id}: {e}")
        })
}
