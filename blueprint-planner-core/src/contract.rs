#![allow(unused)]

//! # contract: data model shared by the compiler and its callers
//!
//! This module defines the inputs of a compilation (connection, repository, scope entry,
//! subtask metadata), its outputs (plugin tasks, stages, plans) and the single trait
//! (`RepositoryResolver`) through which callers plug in repository lookup.
//!
//! ## Inputs
//! - [`ConnectionDescriptor`] and [`RepositoryDescriptor`] are resolved before compilation
//!   starts and are read-only from the compiler's point of view.
//! - [`ScopeEntry`] carries its options and transformation as raw JSON; they stay opaque
//!   until [`crate::transformation`] decodes them.
//!
//! ## Outputs
//! - A [`PluginTask`] serializes as `{"plugin", "subtasks", "options"}` in that order.
//! - [`PipelineStage`], [`ScopePlan`] and [`PipelinePlan`] are plain vectors so they
//!   serialize as bare JSON arrays.
//!
//! ## Mocking & Testing
//! - `RepositoryResolver` is annotated for `mockall`; enable the `test-export-mocks`
//!   feature (on by default) to use `MockRepositoryResolver` from other crates.

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entity category tags a scope can request.
pub mod domain_types {
    pub const CODE: &str = "CODE";
    pub const TICKET: &str = "TICKET";
    pub const CODE_REVIEW: &str = "CODEREVIEW";
    pub const CROSS: &str = "CROSS";
    pub const DEVOPS: &str = "DEVOPS";

    pub const ALL: [&str; 5] = [CODE, TICKET, CODE_REVIEW, CROSS, DEVOPS];
}

/// Resolved account and endpoint for one data-source instance.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub id: u64,
    pub endpoint: String,
    #[serde(default)]
    pub proxy: String,
    #[serde(default)]
    pub rate_limit_per_hour: u32,
    /// Injected from the environment, never read from or written to files.
    #[serde(skip)]
    pub access_token: String,
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("proxy", &self.proxy)
            .field("rate_limit_per_hour", &self.rate_limit_per_hour)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// One repository known to the data source. Field names follow the GitLab project API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    #[serde(rename = "id")]
    pub native_id: u64,
    /// Clone URL without credentials.
    #[serde(rename = "http_url_to_repo", default)]
    pub clone_url: String,
}

/// One user-declared unit of collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeEntry {
    #[serde(default)]
    pub entities: BTreeSet<String>,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub transformation: Value,
}

impl ScopeEntry {
    pub fn requests(&self, entity: &str) -> bool {
        self.entities.contains(entity)
    }

    /// The `projectId` option, if it is a positive integer.
    pub fn project_id(&self) -> Option<u64> {
        self.options
            .get("projectId")
            .and_then(Value::as_u64)
            .filter(|id| *id > 0)
    }
}

/// Caller-supplied description of one subtask of the primary plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskMeta {
    pub name: String,
    #[serde(default)]
    pub entity_types: Vec<String>,
    #[serde(default)]
    pub enabled_by_default: bool,
}

/// One unit of work for one plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginTask {
    pub plugin: String,
    pub subtasks: Option<Vec<String>>,
    /// Flat option bag; keys are kept in sorted order at every depth.
    pub options: Map<String, Value>,
}

/// Tasks that may run in parallel.
pub type PipelineStage = Vec<PluginTask>;

/// Ordered stages produced for one scope entry.
pub type ScopePlan = Vec<PipelineStage>;

/// Ordered stages for a whole blueprint, after merging every scope plan.
pub type PipelinePlan = Vec<PipelineStage>;

/// Error type for RepositoryResolver (boxed, like the other collaborator seams)
pub type ResolveError = Box<dyn std::error::Error + Send + Sync>;

/// Looks up the repository a scope points at.
///
/// The compiler never calls this itself: the outer planning flow resolves every scope's
/// repository first and then compiles with the resolved descriptors.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryResolver: Send + Sync {
    /// Resolve the repository identified by `project_id` on the given connection.
    async fn resolve(
        &self,
        connection: &ConnectionDescriptor,
        project_id: u64,
    ) -> Result<RepositoryDescriptor, ResolveError>;
}
