use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How the version-control extraction task is grouped relative to the primary task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageGrouping {
    /// Extraction runs alongside the primary task in stage 0.
    #[default]
    Shared,
    /// Extraction gets its own stage directly after the primary stage.
    Dedicated,
}

/// Source-specific constants used while compiling a scope.
///
/// The defaults describe the GitLab source; every field can be overridden from the
/// blueprint file so the compiler is not tied to a single data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Source name; also the name of the primary plugin.
    pub source: String,
    /// Type tag used inside composite repository ids.
    pub repository_type: String,
    pub extractor_plugin: String,
    /// Diff-tool plugin; its name is also the transformation key of its section.
    pub diff_plugin: String,
    /// Delivery-metrics plugin; its name is also the transformation key of its section.
    pub metrics_plugin: String,
    /// Post-processing tasks handed to the metrics plugin.
    pub metrics_tasks: Vec<String>,
    /// Username placed in front of the token in credentialed clone URLs.
    pub clone_username: String,
    /// Entity tag that requests version-control extraction.
    pub code_entity: String,
    pub stage_grouping: StageGrouping,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            source: "gitlab".to_string(),
            repository_type: "GitlabProject".to_string(),
            extractor_plugin: "gitextractor".to_string(),
            diff_plugin: "refdiff".to_string(),
            metrics_plugin: "dora".to_string(),
            metrics_tasks: vec!["EnrichTaskEnv".to_string()],
            clone_username: "git".to_string(),
            code_entity: crate::contract::domain_types::CODE.to_string(),
            stage_grouping: StageGrouping::Shared,
        }
    }
}

impl PlannerSettings {
    pub fn trace_loaded(&self) {
        info!(
            source = %self.source,
            stage_grouping = ?self.stage_grouping,
            "Loaded planner settings"
        );
        debug!(?self, "Planner settings loaded (full debug)");
    }
}
