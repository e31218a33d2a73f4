/// Verbs every catalog resource supports, in display order.
pub const VERBS: [&str; 7] = ["get", "list", "watch", "create", "update", "patch", "delete"];

const ALL_VERBS: &[&str] = &VERBS;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ResourceSeed {
    pub name: &'static str,
    pub api_group: &'static str,
    pub verbs: &'static [&'static str],
}

const fn seed(name: &'static str, api_group: &'static str) -> ResourceSeed {
    ResourceSeed {
        name,
        api_group,
        verbs: ALL_VERBS,
    }
}

static CATALOG: [ResourceSeed; 19] = [
    seed("pods", ""),
    seed("services", ""),
    seed("configmaps", ""),
    seed("secrets", ""),
    seed("serviceaccounts", ""),
    seed("persistentvolumeclaims", ""),
    seed("persistentvolumes", ""),
    seed("deployments", "apps/v1"),
    seed("statefulsets", "apps/v1"),
    seed("daemonsets", "apps/v1"),
    seed("replicasets", "apps/v1"),
    seed("jobs", "batch/v1"),
    seed("networkpolicies", "networking.k8s.io/v1"),
    seed("ingresses", "networking.k8s.io/v1"),
    seed("horizontalpodautoscalers", "autoscaling/v2"),
    seed("poddisruptionbudgets", "policy/v1"),
    seed("roles", "rbac.authorization.k8s.io/v1"),
    seed("clusterroles", "rbac.authorization.k8s.io/v1"),
    seed("rolebindings", "rbac.authorization.k8s.io/v1"),
];

pub fn catalog() -> &'static [ResourceSeed] {
    &CATALOG
}

/// RBAC rules name groups without a version: `apps/v1` becomes `apps`, core stays empty.
pub fn rbac_api_group(api_group: &str) -> &str {
    match api_group.split_once('/') {
        Some((group, _version)) => group,
        None => api_group,
    }
}

pub fn group_label(api_group: &str) -> &str {
    if api_group.is_empty() {
        "core"
    } else {
        api_group
    }
}
