use crate::config::ProjectSettings;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub(crate) const DEFAULT_DESTINATION_SERVER: &str = "https://kubernetes.default.svc";
pub(crate) const RESOURCES_FINALIZER: &str = "resources-finalizer.argocd.argoproj.io";
pub(crate) const LABEL_KEY: &str = "backstage-name";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ArgoApplication {
    #[serde(default)]
    pub metadata: AppMetadata,
    #[serde(default)]
    pub spec: AppSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSpec {
    #[serde(default)]
    pub destination: AppDestination,
    #[serde(default)]
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_history_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<AppSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<SyncPolicy>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AppDestination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSource {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_revision: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    #[serde(default)]
    pub automated: Automated,
    #[serde(default)]
    pub retry: Retry,
    #[serde(default)]
    pub sync_options: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Automated {
    #[serde(default)]
    pub allow_empty: bool,
    #[serde(default)]
    pub prune: bool,
    #[serde(default)]
    pub self_heal: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Retry {
    #[serde(default)]
    pub backoff: Backoff,
    /// Negative means retry forever.
    #[serde(default)]
    pub limit: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Backoff {
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub factor: i64,
    #[serde(default)]
    pub max_duration: String,
}

/// The parts of an application that lookups read back. Anything else Argo CD
/// sends is ignored, so apps with unusual sync policies still deserialize.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AppSummary {
    #[serde(default)]
    pub metadata: SummaryMetadata,
    #[serde(default)]
    pub spec: SummarySpec,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    /// Set locally so results from different instances stay distinguishable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<InstanceRef>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SummarySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SummarySource>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct SummarySource {
    #[serde(default, rename = "repoURL", skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

impl AppSummary {
    pub fn repo_url(&self) -> Option<&str> {
        self.spec
            .source
            .as_ref()
            .and_then(|source| source.repo_url.as_deref())
            .filter(|repo| !repo.is_empty())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct InstanceRef {
    pub name: String,
}

/// Body of `GET /api/v1/applications`. Argo CD sends `items: null` when nothing matches.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ApplicationList {
    #[serde(default)]
    pub items: Option<Vec<AppSummary>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ArgoProject {
    #[serde(default)]
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub spec: ProjectSpec,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(default)]
    pub destinations: Vec<ProjectDestination>,
    #[serde(default)]
    pub source_repos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_resource_blacklist: Option<Vec<ResourceItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_resource_whitelist: Option<Vec<ResourceItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_resource_blacklist: Option<Vec<ResourceItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_resource_whitelist: Option<Vec<ResourceItem>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProjectDestination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub server: String,
}

/// Argo CD omits `group` for the core API group.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceItem {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub kind: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevisionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_info: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Success,
    Failure,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SyncResponse {
    pub status: SyncStatus,
    pub message: String,
}

impl SyncResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: SyncStatus::Failure,
            message: message.into(),
        }
    }
}

/// One repo or an explicit list; projects always store a list.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRepo {
    One(String),
    Many(Vec<String>),
}

impl SourceRepo {
    pub fn into_repos(self) -> Vec<String> {
        match self {
            SourceRepo::One(repo) => vec![repo],
            SourceRepo::Many(repos) => repos,
        }
    }
}

impl From<String> for SourceRepo {
    fn from(repo: String) -> Self {
        SourceRepo::One(repo)
    }
}

impl From<&str> for SourceRepo {
    fn from(repo: &str) -> Self {
        SourceRepo::One(repo.to_owned())
    }
}

impl From<Vec<String>> for SourceRepo {
    fn from(repos: Vec<String>) -> Self {
        SourceRepo::Many(repos)
    }
}

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct ProjectArgs {
    pub project_name: String,
    pub namespace: String,
    pub source_repo: SourceRepo,
    #[builder(default)]
    pub destination_server: Option<String>,
    #[builder(default)]
    pub resource_version: Option<String>,
}

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct ApplicationArgs {
    pub app_name: String,
    pub project_name: String,
    pub namespace: String,
    pub source_repo: String,
    pub source_path: String,
    pub label_value: String,
    #[builder(default)]
    pub destination_server: Option<String>,
    #[builder(default)]
    pub resource_version: Option<String>,
}

pub(crate) fn build_argo_project_payload(args: ProjectArgs, settings: &ProjectSettings) -> ArgoProject {
    ArgoProject {
        metadata: ProjectMetadata {
            name: args.project_name,
            resource_version: args.resource_version,
        },
        spec: ProjectSpec {
            destinations: vec![ProjectDestination {
                name: Some("local".to_owned()),
                namespace: args.namespace,
                server: args
                    .destination_server
                    .unwrap_or_else(|| DEFAULT_DESTINATION_SERVER.to_owned()),
            }],
            source_repos: args.source_repo.into_repos(),
            cluster_resource_blacklist: settings.cluster_resource_blacklist.clone(),
            cluster_resource_whitelist: settings.cluster_resource_whitelist.clone(),
            namespace_resource_blacklist: settings.namespace_resource_blacklist.clone(),
            namespace_resource_whitelist: settings.namespace_resource_whitelist.clone(),
        },
    }
}

pub(crate) fn build_argo_application_payload(args: ApplicationArgs) -> ArgoApplication {
    ArgoApplication {
        metadata: AppMetadata {
            name: args.app_name,
            labels: BTreeMap::from([(LABEL_KEY.to_owned(), args.label_value)]),
            finalizers: vec![RESOURCES_FINALIZER.to_owned()],
            resource_version: args.resource_version,
            ..Default::default()
        },
        spec: AppSpec {
            destination: AppDestination {
                server: Some(
                    args.destination_server
                        .unwrap_or_else(|| DEFAULT_DESTINATION_SERVER.to_owned()),
                ),
                namespace: args.namespace,
            },
            project: args.project_name,
            revision_history_limit: Some(10),
            source: Some(AppSource {
                repo_url: args.source_repo,
                path: args.source_path,
                target_revision: None,
            }),
            sync_policy: Some(SyncPolicy {
                automated: Automated {
                    allow_empty: true,
                    prune: true,
                    self_heal: true,
                },
                retry: Retry {
                    backoff: Backoff {
                        duration: "5s".to_owned(),
                        factor: 2,
                        max_duration: "5m".to_owned(),
                    },
                    limit: 10,
                },
                sync_options: vec![
                    "CreateNamespace=false".to_owned(),
                    "FailOnSharedResource=true".to_owned(),
                ],
            }),
        },
        status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project_args(source_repo: impl Into<SourceRepo>) -> ProjectArgs {
        ProjectArgsBuilder::default()
            .project_name("payments")
            .namespace("payments-ns")
            .source_repo(source_repo)
            .build()
            .unwrap()
    }

    #[test]
    fn single_source_repo_becomes_one_element_list() {
        let project = build_argo_project_payload(
            project_args("https://github.com/acme/payments"),
            &ProjectSettings::default(),
        );
        assert_eq!(
            project.spec.source_repos,
            vec!["https://github.com/acme/payments".to_owned()]
        );
    }

    #[test]
    fn source_repo_list_is_passed_through() {
        let repos = vec![
            "https://github.com/acme/new".to_owned(),
            "https://github.com/acme/old".to_owned(),
        ];
        let project =
            build_argo_project_payload(project_args(repos.clone()), &ProjectSettings::default());
        assert_eq!(project.spec.source_repos, repos);
    }

    #[test]
    fn project_payload_emits_only_configured_policy_lists() {
        let settings = ProjectSettings {
            cluster_resource_blacklist: Some(vec![ResourceItem {
                group: "*".to_owned(),
                kind: "*".to_owned(),
            }]),
            ..Default::default()
        };
        let project = build_argo_project_payload(project_args("repo"), &settings);
        let body = serde_json::to_value(&project).unwrap();

        assert_eq!(
            body,
            json!({
                "metadata": { "name": "payments" },
                "spec": {
                    "destinations": [{
                        "name": "local",
                        "namespace": "payments-ns",
                        "server": "https://kubernetes.default.svc"
                    }],
                    "sourceRepos": ["repo"],
                    "clusterResourceBlacklist": [{ "group": "*", "kind": "*" }]
                }
            })
        );
    }

    #[test]
    fn application_payload_carries_fixed_sync_policy() {
        let args = ApplicationArgsBuilder::default()
            .app_name("payments")
            .project_name("payments-proj")
            .namespace("payments-ns")
            .source_repo("https://github.com/acme/payments")
            .source_path("kubernetes")
            .label_value("payments-label")
            .resource_version(Some("42".to_owned()))
            .build()
            .unwrap();
        let body = serde_json::to_value(build_argo_application_payload(args)).unwrap();

        assert_eq!(
            body,
            json!({
                "metadata": {
                    "name": "payments",
                    "labels": { "backstage-name": "payments-label" },
                    "finalizers": ["resources-finalizer.argocd.argoproj.io"],
                    "resourceVersion": "42"
                },
                "spec": {
                    "destination": {
                        "server": "https://kubernetes.default.svc",
                        "namespace": "payments-ns"
                    },
                    "project": "payments-proj",
                    "revisionHistoryLimit": 10,
                    "source": {
                        "repoURL": "https://github.com/acme/payments",
                        "path": "kubernetes"
                    },
                    "syncPolicy": {
                        "automated": { "allowEmpty": true, "prune": true, "selfHeal": true },
                        "retry": {
                            "backoff": { "duration": "5s", "factor": 2, "maxDuration": "5m" },
                            "limit": 10
                        },
                        "syncOptions": ["CreateNamespace=false", "FailOnSharedResource=true"]
                    }
                }
            })
        );
    }

    #[test]
    fn application_payload_honours_destination_server() {
        let args = ApplicationArgsBuilder::default()
            .app_name("a")
            .project_name("p")
            .namespace("n")
            .source_repo("r")
            .source_path(".")
            .label_value("a")
            .destination_server(Some("https://remote:6443".to_owned()))
            .build()
            .unwrap();
        let app = build_argo_application_payload(args);
        assert_eq!(
            app.spec.destination.server.as_deref(),
            Some("https://remote:6443")
        );
    }

    #[test]
    fn empty_item_list_deserializes_as_none() {
        let list: ApplicationList = serde_json::from_value(json!({ "items": null })).unwrap();
        assert!(list.items.is_none());
    }

    #[test]
    fn summary_ignores_unlimited_retry_and_unknown_fields() {
        let app: AppSummary = serde_json::from_value(json!({
            "metadata": { "name": "payments", "resourceVersion": "7", "uid": "abc" },
            "spec": {
                "source": { "repoURL": "https://github.com/acme/payments", "path": "." },
                "syncPolicy": {
                    "automated": null,
                    "retry": { "limit": -1, "backoff": { "factor": 2 } }
                }
            },
            "status": { "sync": { "status": "Synced" } }
        }))
        .unwrap();
        assert_eq!(app.metadata.name, "payments");
        assert_eq!(app.metadata.resource_version.as_deref(), Some("7"));
        assert_eq!(app.repo_url(), Some("https://github.com/acme/payments"));
    }

    #[test]
    fn summary_without_source_has_no_repo() {
        let app: AppSummary = serde_json::from_value(
            json!({ "metadata": { "name": "multi" }, "spec": { "sources": [] } }),
        )
        .unwrap();
        assert_eq!(app.repo_url(), None);
    }

    #[test]
    fn core_group_resource_items_deserialize() {
        let project: ArgoProject = serde_json::from_value(json!({
            "metadata": { "name": "payments", "resourceVersion": "3" },
            "spec": { "namespaceResourceWhitelist": [{ "kind": "ConfigMap" }] }
        }))
        .unwrap();
        assert_eq!(
            project.spec.namespace_resource_whitelist,
            Some(vec![ResourceItem {
                group: String::new(),
                kind: "ConfigMap".to_owned(),
            }])
        );
    }

    #[test]
    fn retry_accepts_unlimited_limit() {
        let retry: Retry = serde_json::from_value(json!({ "limit": -1 })).unwrap();
        assert_eq!(retry.limit, -1);
    }
}
