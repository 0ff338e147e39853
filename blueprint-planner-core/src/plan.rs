//! Scope compiler: turns one scope entry into the ordered stages that collect it.
//!
//! For a single scope the compiler emits, in this fixed order:
//!   1. the primary-plugin task (always), plus the version-control extraction task when the
//!      scope requests source code,
//!   2. a diff-tool stage when the transformation carries a diff-tool section,
//!   3. a delivery-metrics stage when the transformation carries a metrics section.
//!
//! Enrichers read what earlier stages collected, which is why the order never changes.
//!
//! # Responsibilities
//! - Pure and synchronous: no I/O, no network, no retries
//! - Writes only to the slot it was handed, and only once every step succeeded
//! - Tags every failure with the scope index so callers can report the offending entry
//!
//! # Navigation
//! - Main entrypoint: [`compile_scope`]
//! - Batch helper and plan merging: [`crate::accumulator`]

use serde_json::{Map, Value};
use tracing::{debug, error, info, info_span, warn};

use crate::config::{PlannerSettings, StageGrouping};
use crate::contract::{
    domain_types, ConnectionDescriptor, PipelineStage, PluginTask, RepositoryDescriptor,
    ScopeEntry, ScopePlan, SubtaskMeta,
};
use crate::error::{json_kind, CompileError, DecodeError, PlanError};
use crate::identifier::{credentialed_clone_url, repository_id};
use crate::options::{option_bag, sort_map, DoraOptions, GitextractorOptions};
use crate::subtasks::select_subtasks;
use crate::transformation::TransformationConfig;

/// Compiles `scope` and stores the resulting stages in `slot`.
///
/// On error `slot` keeps whatever it held before the call.
pub fn compile_scope(
    settings: &PlannerSettings,
    scope_index: usize,
    scope: &ScopeEntry,
    repository: &RepositoryDescriptor,
    connection: &ConnectionDescriptor,
    subtask_metas: &[SubtaskMeta],
    slot: &mut ScopePlan,
) -> Result<(), PlanError> {
    let span = info_span!(
        "compile_scope",
        scope_index,
        connection_id = connection.id,
        repository = repository.native_id
    );
    let _entered = span.enter();

    for entity in scope.entities.iter().filter(|e| !domain_types::ALL.contains(&e.as_str())) {
        warn!(entity = %entity, "Unknown entity tag, kept for subtask selection");
    }

    let stages = build_stages(settings, scope, repository, connection, subtask_metas).map_err(|kind| {
        error!(error = %kind, "Scope compilation failed");
        PlanError { scope_index, kind }
    })?;

    info!(
        stages = stages.len(),
        tasks = stages.iter().map(Vec::len).sum::<usize>(),
        "Scope compiled"
    );
    *slot = stages;
    Ok(())
}

fn build_stages(
    settings: &PlannerSettings,
    scope: &ScopeEntry,
    repository: &RepositoryDescriptor,
    connection: &ConnectionDescriptor,
    subtask_metas: &[SubtaskMeta],
) -> Result<ScopePlan, CompileError> {
    let transformation = TransformationConfig::decode(&scope.transformation, settings)?;
    let repo_id = repository_id(
        &settings.source,
        &settings.repository_type,
        connection.id,
        repository.native_id,
    );

    let primary = primary_task(settings, scope, repository, connection, subtask_metas, &transformation)?;
    let extraction = if scope.requests(&settings.code_entity) {
        Some(extraction_task(settings, repository, connection, &repo_id)?)
    } else {
        None
    };
    let refdiff = transformation
        .refdiff
        .as_ref()
        .map(|section| refdiff_task(settings, &section.raw))
        .transpose()?;
    let dora = transformation
        .dora
        .as_ref()
        .map(|section| dora_task(settings, &repo_id, &section.raw))
        .transpose()?;

    Ok(assemble(settings.stage_grouping, primary, extraction, refdiff, dora))
}

/// Lays the optional stages out in their fixed order and drops the absent ones.
fn assemble(
    grouping: StageGrouping,
    primary: PluginTask,
    extraction: Option<PluginTask>,
    refdiff: Option<PluginTask>,
    dora: Option<PluginTask>,
) -> ScopePlan {
    let (head, extraction_stage): (PipelineStage, Option<PipelineStage>) = match (grouping, extraction) {
        (_, None) => (vec![primary], None),
        (StageGrouping::Shared, Some(task)) => (vec![primary, task], None),
        (StageGrouping::Dedicated, Some(task)) => (vec![primary], Some(vec![task])),
    };

    [
        Some(head),
        extraction_stage,
        refdiff.map(|task| vec![task]),
        dora.map(|task| vec![task]),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn primary_task(
    settings: &PlannerSettings,
    scope: &ScopeEntry,
    repository: &RepositoryDescriptor,
    connection: &ConnectionDescriptor,
    subtask_metas: &[SubtaskMeta],
    transformation: &TransformationConfig,
) -> Result<PluginTask, CompileError> {
    let mut options = match &scope.options {
        Value::Null => Map::new(),
        Value::Object(options) => options.clone(),
        other => {
            return Err(DecodeError::NotAnObject {
                field: "options",
                found: json_kind(other),
            }
            .into())
        }
    };

    if scope.project_id().is_none() {
        if repository.native_id == 0 {
            return Err(CompileError::MissingPrerequisite {
                entity: settings.source.clone(),
                missing: "projectId",
            });
        }
        debug!(project_id = repository.native_id, "projectId taken from repository");
        options.insert("projectId".to_string(), Value::from(repository.native_id));
    }
    options.insert("connectionId".to_string(), Value::from(connection.id));
    options.insert(
        "transformationRules".to_string(),
        Value::Object(transformation.rules.clone()),
    );

    let subtasks = select_subtasks(subtask_metas, &scope.entities);
    debug!(plugin = %settings.source, ?subtasks, "Primary task built");

    Ok(PluginTask {
        plugin: settings.source.clone(),
        subtasks: Some(subtasks),
        options: sort_map(options),
    })
}

fn extraction_task(
    settings: &PlannerSettings,
    repository: &RepositoryDescriptor,
    connection: &ConnectionDescriptor,
    repo_id: &str,
) -> Result<PluginTask, CompileError> {
    if repository.native_id == 0 {
        return Err(CompileError::MissingPrerequisite {
            entity: settings.code_entity.clone(),
            missing: "repository id",
        });
    }
    if repository.clone_url.trim().is_empty() {
        return Err(CompileError::MissingPrerequisite {
            entity: settings.code_entity.clone(),
            missing: "repository clone URL",
        });
    }

    let url = credentialed_clone_url(
        &repository.clone_url,
        &settings.clone_username,
        &connection.access_token,
    )?;

    let options = GitextractorOptions {
        proxy: &connection.proxy,
        repo_id,
        url: &url,
    };
    debug!(plugin = %settings.extractor_plugin, repo_id, "Extraction task built");

    Ok(PluginTask {
        plugin: settings.extractor_plugin.clone(),
        subtasks: None,
        options: option_bag(&settings.extractor_plugin, &options)?,
    })
}

/// The section object as written becomes the task's options.
fn refdiff_task(settings: &PlannerSettings, section: &Map<String, Value>) -> Result<PluginTask, CompileError> {
    let options = option_bag(&settings.diff_plugin, section)?;
    debug!(plugin = %settings.diff_plugin, ?options, "Diff-tool task built");
    Ok(PluginTask {
        plugin: settings.diff_plugin.clone(),
        subtasks: None,
        options,
    })
}

fn dora_task(
    settings: &PlannerSettings,
    repo_id: &str,
    section: &Map<String, Value>,
) -> Result<PluginTask, CompileError> {
    let options = DoraOptions {
        repo_id,
        tasks: &settings.metrics_tasks,
        transformation: section,
    };
    let options = option_bag(&settings.metrics_plugin, &options)?;
    debug!(plugin = %settings.metrics_plugin, ?options, "Metrics task built");
    Ok(PluginTask {
        plugin: settings.metrics_plugin.clone(),
        subtasks: None,
        options,
    })
}
