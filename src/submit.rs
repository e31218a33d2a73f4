use crate::api::{AccessApi, ApiError, KubeconfigRequest, RolePermission, RoleRequest};
use crate::catalog::rbac_api_group;
use crate::model::{SelectionState, Workflow};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ARTIFACT_MEDIA_TYPE: &str = "text/yaml";

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a name")]
    MissingName,
    #[error("Please select at least one resource")]
    NoResourcesSelected,
}

/// Gating checks run before any request leaves the process, in this order.
pub fn validate(name: &str, selection: &SelectionState) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    if !selection.any_selected() {
        return Err(ValidationError::NoResourcesSelected);
    }
    Ok(name.to_string())
}

/// Verbs are the union over every selected resource, so each resource in the
/// resulting Role receives the same verb list.
pub fn kubeconfig_request(
    name: &str,
    namespace: &str,
    selection: &SelectionState,
) -> Result<KubeconfigRequest, ValidationError> {
    let name = validate(name, selection)?;
    let mut resources = Vec::new();
    let mut verbs: Vec<String> = Vec::new();
    for entry in selection.selected_entries() {
        resources.push(entry.name.to_string());
        for verb in &entry.selected_verbs {
            if !verbs.iter().any(|known| known == verb) {
                verbs.push((*verb).to_string());
            }
        }
    }

    Ok(KubeconfigRequest {
        name,
        namespace: namespace.to_string(),
        resources,
        verbs,
    })
}

pub fn role_request(
    name: &str,
    namespace: &str,
    selection: &SelectionState,
) -> Result<RoleRequest, ValidationError> {
    let name = validate(name, selection)?;
    let permissions = selection
        .selected_entries()
        .map(|entry| RolePermission {
            resource: entry.name.to_string(),
            api_group: rbac_api_group(entry.api_group).to_string(),
            verbs: entry
                .selected_verbs
                .iter()
                .map(|verb| (*verb).to_string())
                .collect(),
        })
        .collect();

    Ok(RoleRequest {
        name,
        namespace: namespace.to_string(),
        permissions,
    })
}

/// A validated request for one workflow, ready to be sent.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Submission {
    Kubeconfig(KubeconfigRequest),
    Role(RoleRequest),
}

impl Submission {
    pub fn prepare(
        workflow: Workflow,
        name: &str,
        namespace: &str,
        selection: &SelectionState,
    ) -> Result<Self, ValidationError> {
        match workflow {
            Workflow::Kubeconfig => {
                kubeconfig_request(name, namespace, selection).map(Self::Kubeconfig)
            }
            Workflow::Role => role_request(name, namespace, selection).map(Self::Role),
        }
    }

    pub fn workflow(&self) -> Workflow {
        match self {
            Self::Kubeconfig(_) => Workflow::Kubeconfig,
            Self::Role(_) => Workflow::Role,
        }
    }

    pub fn account(&self) -> &str {
        match self {
            Self::Kubeconfig(request) => &request.name,
            Self::Role(request) => &request.name,
        }
    }

    pub async fn send(&self, api: &dyn AccessApi) -> Result<String, ApiError> {
        match self {
            Self::Kubeconfig(request) => api.generate_kubeconfig(request).await,
            Self::Role(request) => api.generate_role(request).await,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Artifact {
    pub file_name: String,
    pub media_type: &'static str,
    pub content: String,
}

impl Artifact {
    pub fn new(workflow: Workflow, account: &str, content: impl Into<String>) -> Self {
        Self {
            file_name: format!(
                "{}-{}.yaml",
                workflow.artifact_label(),
                file_safe_name(account)
            ),
            media_type: ARTIFACT_MEDIA_TYPE,
            content: content.into(),
        }
    }

    pub fn save_into(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        let path = dir.join(&self.file_name);
        fs::write(&path, self.content.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(
            "saved {} ({} bytes, {})",
            path.display(),
            self.content.len(),
            self.media_type
        );
        Ok(path)
    }
}

fn file_safe_name(account: &str) -> String {
    let name = account
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect::<String>();
    if name != account {
        debug!("artifact name sanitized from {account:?} to {name:?}");
    }
    name
}
