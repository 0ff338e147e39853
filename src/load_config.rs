/// `load_config` module: Loads a static YAML blueprint file and injects the connection token from the environment.
///
/// This module is the only place where untrusted YAML is parsed and mapped to the core's strongly-typed inputs.
///
/// # Responsibilities
/// - Parse the user-supplied blueprint file (connection, planner settings, subtask metadata, scopes)
/// - Inject the access token from `GITLAB_TOKEN`; tokens never live in the file
/// - Keep scope options and transformations as raw JSON so the core decides what they mean
/// - Report every loading failure with a clear message for the CLI and tests
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
///
use anyhow::Result;
use blueprint_planner_core::config::PlannerSettings;
use blueprint_planner_core::contract::{
    ConnectionDescriptor, RepositoryDescriptor, ScopeEntry, SubtaskMeta,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Environment variable holding the connection's access token.
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

#[derive(Debug, Deserialize)]
pub struct BlueprintConfig {
    pub connection: ConnectionDescriptor,
    #[serde(default)]
    pub planner: PlannerSettings,
    #[serde(default)]
    pub subtasks: Vec<SubtaskMeta>,
    #[serde(default)]
    pub scopes: Vec<ScopeSection>,
}

/// One scope as written in the blueprint file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeSection {
    #[serde(default)]
    pub entities: BTreeSet<String>,
    #[serde(default)]
    pub options: serde_json::Value,
    #[serde(default)]
    pub transformation: serde_json::Value,
    /// Inline repository; when present the scope is never resolved remotely.
    #[serde(default)]
    pub repository: Option<RepositoryDescriptor>,
}

impl ScopeSection {
    pub fn entry(&self) -> ScopeEntry {
        ScopeEntry {
            entities: self.entities.clone(),
            options: self.options.clone(),
            transformation: self.transformation.clone(),
        }
    }
}

/// Loads a static YAML blueprint file (no secrets) and injects the token from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BlueprintConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading blueprint from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Blueprint file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read blueprint file");
            return Err(anyhow::anyhow!(
                "Failed to read blueprint file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: BlueprintConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed blueprint YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse blueprint YAML");
            return Err(anyhow::anyhow!("Failed to parse blueprint YAML: {e}"));
        }
    };

    config.connection.access_token = match std::env::var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => {
            info!("{TOKEN_ENV} found in env");
            token
        }
        Ok(_) => {
            error!("{TOKEN_ENV} is set but empty");
            anyhow::bail!("{TOKEN_ENV} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{TOKEN_ENV} environment variable not set");
            return Err(anyhow::anyhow!("{TOKEN_ENV} environment variable not set: {e}"));
        }
    };

    config.planner.trace_loaded();
    info!(
        connection_id = config.connection.id,
        endpoint = %config.connection.endpoint,
        scopes = config.scopes.len(),
        subtasks = config.subtasks.len(),
        "Blueprint loaded and merged successfully"
    );

    Ok(config)
}
