//! Configuration document loader: a thin, fallible,
//! pre-startup step that turns a TOML document into the maps the core's
//! `LoadPolicies`/`LoadGroups`/`LoadCustomRoles` operations expect. It never
//! watches the filesystem and never reloads; a malformed document simply
//! fails process startup with a clear message.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;
use crate::groups::GroupMap;
use crate::policy::{Binding, Policy};

#[derive(Debug, Deserialize, Default)]
struct ConfigDocument {
    #[serde(default)]
    projects: HashMap<String, ProjectSection>,
    #[serde(default)]
    groups: HashMap<String, GroupSection>,
    #[serde(default)]
    roles: HashMap<String, RoleSection>,
}

#[derive(Debug, Deserialize, Default)]
struct ProjectSection {
    #[serde(default)]
    bindings: Vec<Binding>,
    #[serde(default)]
    resources: HashMap<String, ResourceSection>,
    #[serde(default)]
    audit_configs: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
struct ResourceSection {
    #[serde(default)]
    bindings: Vec<Binding>,
    #[serde(default)]
    audit_configs: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GroupSection {
    members: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RoleSection {
    permissions: Vec<String>,
}

/// The flattened result of a configuration load, ready to hand to the store.
pub struct LoadedConfig {
    pub policies: HashMap<String, Policy>,
    pub groups: GroupMap,
    pub custom_roles: HashMap<String, Vec<String>>,
}

/// Reads and parses the TOML document at `path`.
pub fn load_file(path: &Path) -> Result<LoadedConfig, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::invalid_argument("config_read_failed", format!("failed to read config file {}: {e}", path.display())))?;
    parse(&text)
}

/// Parses a TOML document shaped and flattens it into the three
/// maps the core consumes.
pub fn parse(text: &str) -> Result<LoadedConfig, AppError> {
    let doc: ConfigDocument = toml::from_str(text).map_err(|e| AppError::invalid_argument("invalid_config", format!("malformed configuration document: {e}")))?;

    let mut policies = HashMap::new();
    for (project_id, project) in doc.projects {
        let project_key = format!("projects/{project_id}");
        policies.insert(project_key.clone(), Policy { version: 1, bindings: project.bindings, audit_configs: project.audit_configs, etag: String::new() });

        for (relative_path, resource) in project.resources {
            let resource_key = format!("{project_key}/{relative_path}");
            policies.insert(resource_key, Policy { version: 1, bindings: resource.bindings, audit_configs: resource.audit_configs, etag: String::new() });
        }
    }

    let groups: GroupMap = doc.groups.into_iter().map(|(name, section)| (name, section.members)).collect();
    let custom_roles: HashMap<String, Vec<String>> = doc.roles.into_iter().map(|(id, section)| (id, section.permissions)).collect();

    Ok(LoadedConfig { policies, groups, custom_roles })
}
