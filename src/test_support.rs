use crate::config::{DefaultCredentials, InstanceConfig, InstanceRegistry, ProjectSettings, Settings};
use crate::Context;
use std::time::Duration;

pub(crate) fn instance(name: &str, url: &str, token: Option<&str>) -> InstanceConfig {
    InstanceConfig {
        name: name.to_owned(),
        url: url.to_owned(),
        token: token.map(str::to_owned),
        username: None,
        password: None,
    }
}

pub(crate) fn context(instances: Vec<InstanceConfig>) -> Context {
    context_with_cycles(instances, 1)
}

pub(crate) fn context_with_cycles(instances: Vec<InstanceConfig>, wait_cycles: u32) -> Context {
    Context::new(Settings {
        registry: InstanceRegistry::new(instances),
        project_settings: ProjectSettings::default(),
        credentials: DefaultCredentials {
            username: Some("admin".to_owned()),
            password: Some("password".to_owned()),
        },
        wait_cycles,
        poll_interval: Duration::from_millis(1),
    })
}
