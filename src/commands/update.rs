use crate::argocd::{
    build_argo_application_payload, build_argo_project_payload, ApplicationArgsBuilder,
    ProjectArgsBuilder, SourceRepo,
};
use crate::cli::UpdateArgs;
use crate::client::ArgoClient;
use crate::error::{ArgoError, Result};
use crate::Context;
use log::{error, info};
use serde::Serialize;

#[derive(Debug, Clone)]
pub(crate) struct UpdateProjectAndApp {
    pub instance_name: String,
    pub app_name: String,
    pub project_name: String,
    pub namespace: String,
    pub source_repo: String,
    pub source_path: String,
    pub label_value: String,
    pub destination_server: Option<String>,
}

impl From<UpdateArgs> for UpdateProjectAndApp {
    fn from(args: UpdateArgs) -> Self {
        Self {
            label_value: args.label.unwrap_or_else(|| args.app.to_owned()),
            instance_name: args.instance,
            app_name: args.app,
            project_name: args.project,
            namespace: args.namespace,
            source_repo: args.repo,
            source_path: args.path,
            destination_server: args.destination_server,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub(crate) enum UpdateOutcome {
    /// Source repo unchanged: one project write, one application write.
    InPlace,
    /// Source repo moved: project widened, app moved, project narrowed.
    #[serde(rename_all = "camelCase")]
    RepoMigrated { previous_repo: String },
}

/// Updates a project and its application, keeping the project's allowed repos
/// valid for the application at every step.
pub(crate) async fn update_argo_project_and_app(
    ctx: &Context,
    request: &UpdateProjectAndApp,
) -> Result<UpdateOutcome> {
    let client = ctx.client_for(&request.instance_name).await?;
    let app_name = &request.app_name;
    let project_name = &request.project_name;

    let app = client.get_application(app_name, None).await?;
    let Some(current_repo) = app.repo_url().map(str::to_owned) else {
        error!("No repo URL found for argo app {app_name}");
        return Err(ArgoError::MissingField("repo URL", format!("argo app {app_name}")));
    };
    let Some(app_version) = app.metadata.resource_version else {
        error!("No resourceVersion found for argo app {app_name}");
        return Err(ArgoError::MissingField(
            "resourceVersion",
            format!("argo app {app_name}"),
        ));
    };
    let project_version = current_project_version(&client, project_name).await?;

    if current_repo == request.source_repo {
        update_project(ctx, &client, request, request.source_repo.as_str(), project_version).await?;
        update_app(&client, request, app_version).await?;
        return Ok(UpdateOutcome::InPlace);
    }

    info!(
        "moving {app_name} from {current_repo} to {}",
        request.source_repo
    );
    update_project(
        ctx,
        &client,
        request,
        vec![request.source_repo.to_owned(), current_repo.to_owned()],
        project_version,
    )
    .await?;
    update_app(&client, request, app_version).await?;
    let project_version = current_project_version(&client, project_name).await?;
    update_project(ctx, &client, request, request.source_repo.as_str(), project_version).await?;

    Ok(UpdateOutcome::RepoMigrated {
        previous_repo: current_repo,
    })
}

async fn current_project_version(client: &ArgoClient, project_name: &str) -> Result<String> {
    match client.get_project(project_name).await?.metadata.resource_version {
        Some(version) => Ok(version),
        None => {
            error!("No resourceVersion found for argo project {project_name}");
            Err(ArgoError::MissingField(
                "resourceVersion",
                format!("argo project {project_name}"),
            ))
        }
    }
}

async fn update_project(
    ctx: &Context,
    client: &ArgoClient,
    request: &UpdateProjectAndApp,
    source_repo: impl Into<SourceRepo>,
    resource_version: String,
) -> Result<()> {
    let args = ProjectArgsBuilder::default()
        .project_name(request.project_name.as_str())
        .namespace(request.namespace.as_str())
        .source_repo(source_repo)
        .destination_server(request.destination_server.clone())
        .resource_version(resource_version)
        .build()?;
    client
        .update_project(&build_argo_project_payload(
            args,
            &ctx.settings.project_settings,
        ))
        .await?;
    Ok(())
}

async fn update_app(
    client: &ArgoClient,
    request: &UpdateProjectAndApp,
    resource_version: String,
) -> Result<()> {
    let args = ApplicationArgsBuilder::default()
        .app_name(request.app_name.as_str())
        .project_name(request.project_name.as_str())
        .namespace(request.namespace.as_str())
        .source_repo(request.source_repo.as_str())
        .source_path(request.source_path.as_str())
        .label_value(request.label_value.as_str())
        .destination_server(request.destination_server.clone())
        .resource_version(resource_version)
        .build()?;
    client
        .update_application(&build_argo_application_payload(args))
        .await?;
    Ok(())
}
