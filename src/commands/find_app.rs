use crate::cli::FindArgs;
use crate::config::InstanceConfig;
use crate::error::{ArgoError, Result};
use crate::Context;
use futures::future::join_all;
use itertools::Itertools;
use log::{debug, error};
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub(crate) struct AppQuery {
    pub name: Option<String>,
    pub selector: Option<String>,
    pub namespace: Option<String>,
}

impl From<FindArgs> for AppQuery {
    fn from(args: FindArgs) -> Self {
        Self {
            name: args.name,
            selector: args.selector,
            namespace: args.namespace,
        }
    }
}

enum Lookup<'a> {
    Name(&'a str),
    Selector(&'a str),
}

impl AppQuery {
    fn lookup(&self) -> Result<Lookup<'_>> {
        match (&self.selector, &self.name) {
            (Some(selector), _) => Ok(Lookup::Selector(selector)),
            (None, Some(name)) => Ok(Lookup::Name(name)),
            (None, None) => Err(ArgoError::MissingLookup),
        }
    }
}

/// Instance that produced at least one matching application.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindAppResult {
    pub name: String,
    pub url: String,
    pub app_name: Vec<String>,
}

#[derive(Debug)]
pub(crate) enum InstanceOutcome {
    Matched(FindAppResult),
    InstanceError { instance: String, error: ArgoError },
    NoMatch { instance: String },
}

/// Queries every configured instance concurrently and reports what each one produced.
pub(crate) async fn find_argo_app_outcomes(
    ctx: &Context,
    query: &AppQuery,
) -> Result<Vec<InstanceOutcome>> {
    let lookup = query.lookup()?;
    let namespace = query.namespace.as_deref();

    Ok(join_all(
        ctx.settings
            .registry
            .iter()
            .map(|instance| lookup_on_instance(ctx, instance, &lookup, namespace)),
    )
    .await)
}

/// Instances that matched, in configuration order. Failing instances are logged and left out.
pub(crate) async fn find_argo_app(ctx: &Context, query: &AppQuery) -> Result<Vec<FindAppResult>> {
    Ok(find_argo_app_outcomes(ctx, query)
        .await?
        .into_iter()
        .filter_map(|outcome| match outcome {
            InstanceOutcome::Matched(found) => Some(found),
            InstanceOutcome::InstanceError { instance, error } => {
                debug!("leaving {instance} out of results: {error}");
                None
            }
            InstanceOutcome::NoMatch { instance } => {
                debug!("leaving {instance} out of results: no matching apps");
                None
            }
        })
        .collect())
}

async fn lookup_on_instance(
    ctx: &Context,
    instance: &InstanceConfig,
    lookup: &Lookup<'_>,
    namespace: Option<&str>,
) -> InstanceOutcome {
    let client = match ctx.connect(instance).await {
        Ok(client) => client,
        Err(error) => {
            error!(
                "Error getting token from Argo Instance {}: {error}",
                instance.name
            );
            return InstanceOutcome::InstanceError {
                instance: instance.name.to_owned(),
                error,
            };
        }
    };

    let app_names = match lookup {
        Lookup::Name(name) => client
            .get_application(name, namespace)
            .await
            .map(|_| vec![name.to_string()]),
        Lookup::Selector(selector) => client
            .list_applications(selector, namespace)
            .await
            .map(|list| {
                list.items
                    .unwrap_or_default()
                    .into_iter()
                    .map(|item| item.metadata.name)
                    .collect()
            }),
    };

    match app_names {
        Err(error) => {
            error!(
                "Error getting Argo App Data from Argo Instance {}: {error}",
                instance.name
            );
            InstanceOutcome::InstanceError {
                instance: instance.name.to_owned(),
                error,
            }
        }
        Ok(names) if names.is_empty() => {
            debug!("no matching apps on {}", instance.name);
            InstanceOutcome::NoMatch {
                instance: instance.name.to_owned(),
            }
        }
        Ok(names) => {
            debug!("{} matched {}", instance.name, names.iter().join(", "));
            InstanceOutcome::Matched(FindAppResult {
                name: instance.name.to_owned(),
                url: instance.url.to_owned(),
                app_name: names,
            })
        }
    }
}
