use anyhow::{Context, Result};
use k8s_openapi::api::rbac::v1::Role;
use kube::config::Kubeconfig;
use std::collections::HashMap;

use crate::model::Workflow;

/// Short human-readable facts about a generated file, shown next to its YAML.
pub fn summarize(workflow: Workflow, content: &str) -> Result<Vec<String>> {
    match workflow {
        Workflow::Kubeconfig => summarize_kubeconfig(content),
        Workflow::Role => summarize_role(content),
    }
}

fn summarize_kubeconfig(content: &str) -> Result<Vec<String>> {
    let kubeconfig =
        Kubeconfig::from_yaml(content).context("generated kubeconfig is not valid YAML")?;

    let servers = kubeconfig
        .clusters
        .iter()
        .map(|named| {
            let server = named
                .cluster
                .as_ref()
                .and_then(|cluster| cluster.server.clone());
            (named.name.clone(), server)
        })
        .collect::<HashMap<_, _>>();

    let current = kubeconfig
        .current_context
        .clone()
        .or_else(|| kubeconfig.contexts.first().map(|named| named.name.clone()))
        .unwrap_or_else(|| "-".to_string());
    let context = kubeconfig
        .contexts
        .iter()
        .find(|named| named.name == current)
        .and_then(|named| named.context.as_ref());

    let cluster = context
        .map(|context| context.cluster.clone())
        .unwrap_or_else(|| "-".to_string());
    let server = servers
        .get(&cluster)
        .cloned()
        .flatten()
        .unwrap_or_else(|| "-".to_string());
    let namespace = context
        .and_then(|context| context.namespace.clone())
        .unwrap_or_else(|| "default".to_string());
    let user = context
        .and_then(|context| context.user.clone())
        .or_else(|| kubeconfig.auth_infos.first().map(|named| named.name.clone()))
        .unwrap_or_else(|| "-".to_string());

    Ok(vec![
        format!("context:   {current}"),
        format!("cluster:   {cluster}"),
        format!("server:    {server}"),
        format!("namespace: {namespace}"),
        format!("user:      {user}"),
    ])
}

fn summarize_role(content: &str) -> Result<Vec<String>> {
    let role: Role = serde_yaml::from_str(content).context("generated role is not a Role")?;
    let name = role.metadata.name.as_deref().unwrap_or("-");
    let namespace = role.metadata.namespace.as_deref().unwrap_or("-");
    let rules = role.rules.unwrap_or_default();

    let mut lines = vec![
        format!("role:  {namespace}/{name}"),
        format!("rules: {}", rules.len()),
    ];
    for rule in rules {
        let groups = rule
            .api_groups
            .unwrap_or_default()
            .into_iter()
            .map(|group| if group.is_empty() { "core".to_string() } else { group })
            .collect::<Vec<_>>()
            .join(",");
        let resources = rule.resources.unwrap_or_default().join(",");
        lines.push(format!(
            "  {resources} ({groups}) [{}]",
            rule.verbs.join(", ")
        ));
    }
    Ok(lines)
}
