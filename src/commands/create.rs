use crate::argocd::{
    build_argo_application_payload, build_argo_project_payload, ApplicationArgsBuilder,
    ProjectArgsBuilder,
};
use crate::cli::CreateArgs;
use crate::error::Result;
use crate::Context;
use log::info;

#[derive(Debug, Clone)]
pub(crate) struct CreateResources {
    pub instance_name: String,
    pub app_name: String,
    /// Defaults to the application name.
    pub project_name: Option<String>,
    pub namespace: String,
    pub source_repo: String,
    pub source_path: String,
    /// Defaults to the application name.
    pub label_value: Option<String>,
    pub destination_server: Option<String>,
}

impl From<CreateArgs> for CreateResources {
    fn from(args: CreateArgs) -> Self {
        Self {
            instance_name: args.instance,
            app_name: args.app,
            project_name: args.project,
            namespace: args.namespace,
            source_repo: args.repo,
            source_path: args.path,
            label_value: args.label,
            destination_server: args.destination_server,
        }
    }
}

/// Creates the project first, then the application that belongs to it.
pub(crate) async fn create_argo_resources(ctx: &Context, request: &CreateResources) -> Result<()> {
    info!(
        "Creating app {} on {}",
        request.app_name, request.instance_name
    );
    let client = ctx.client_for(&request.instance_name).await?;
    let project_name = request
        .project_name
        .as_deref()
        .unwrap_or(&request.app_name);

    let project = ProjectArgsBuilder::default()
        .project_name(project_name)
        .namespace(request.namespace.as_str())
        .source_repo(request.source_repo.as_str())
        .destination_server(request.destination_server.clone())
        .build()?;
    client
        .create_project(&build_argo_project_payload(
            project,
            &ctx.settings.project_settings,
        ))
        .await?;

    let app = ApplicationArgsBuilder::default()
        .app_name(request.app_name.as_str())
        .project_name(project_name)
        .namespace(request.namespace.as_str())
        .source_repo(request.source_repo.as_str())
        .source_path(request.source_path.as_str())
        .label_value(request.label_value.as_deref().unwrap_or(&request.app_name))
        .destination_server(request.destination_server.clone())
        .build()?;
    client
        .create_application(&build_argo_application_payload(app))
        .await?;

    Ok(())
}
