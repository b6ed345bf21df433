use crate::argocd::ResourceItem;
use crate::error::{ArgoError, Result};
use anyhow::Context as anyhowContext;
use serde::Deserialize;
use std::{path::Path, time::Duration};

const DEFAULT_WAIT_CYCLES: u32 = 1;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    #[serde(default)]
    argocd: ArgoSection,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ArgoSection {
    username: Option<String>,
    password: Option<String>,
    wait_cycles: Option<u32>,
    delete_poll_interval: Option<u64>,
    #[serde(default)]
    app_locator_methods: Vec<LocatorMethod>,
    #[serde(default)]
    project_settings: ProjectSettings,
}

#[derive(Deserialize, Debug)]
struct LocatorMethod {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    instances: Vec<InstanceConfig>,
}

/// One Argo CD server and the credentials used to reach it.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct InstanceConfig {
    pub name: String,
    pub url: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl InstanceConfig {
    /// The configured URL without trailing slashes, ready for `/api/v1/...` routes.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

/// Resource allow/deny lists applied to every project this tool writes.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectSettings {
    pub cluster_resource_blacklist: Option<Vec<ResourceItem>>,
    pub cluster_resource_whitelist: Option<Vec<ResourceItem>>,
    pub namespace_resource_blacklist: Option<Vec<ResourceItem>>,
    pub namespace_resource_whitelist: Option<Vec<ResourceItem>>,
}

/// Fallback login used for instances without their own username/password.
#[derive(Debug, Default, Clone)]
pub(crate) struct DefaultCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct InstanceRegistry {
    instances: Vec<InstanceConfig>,
}

impl InstanceRegistry {
    pub fn new(instances: Vec<InstanceConfig>) -> Self {
        Self { instances }
    }

    pub fn resolve(&self, name: &str) -> Result<&InstanceConfig> {
        self.instances
            .iter()
            .find(|instance| instance.name == name)
            .ok_or_else(|| ArgoError::NoMatchingInstance(name.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstanceConfig> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }
}

#[derive(Debug)]
pub(crate) struct Settings {
    pub registry: InstanceRegistry,
    pub project_settings: ProjectSettings,
    pub credentials: DefaultCredentials,
    pub wait_cycles: u32,
    pub poll_interval: Duration,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(raw).map_err(anyhow::Error::msg)?;
        let argocd = file.argocd;

        let instances = argocd
            .app_locator_methods
            .into_iter()
            .filter(|method| method._type == "config")
            .flat_map(|method| method.instances)
            .collect();

        Ok(Self {
            registry: InstanceRegistry::new(instances),
            project_settings: argocd.project_settings,
            credentials: DefaultCredentials {
                username: argocd.username,
                password: argocd.password,
            },
            // zero is treated as unset
            wait_cycles: argocd
                .wait_cycles
                .filter(|cycles| *cycles > 0)
                .unwrap_or(DEFAULT_WAIT_CYCLES),
            poll_interval: Duration::from_secs(
                argocd
                    .delete_poll_interval
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
        })
    }
}
