use crate::cli::DeleteTarget;
use crate::client::{ArgoClient, StatusResponse};
use crate::delay::delay;
use crate::error::Result;
use crate::Context;
use log::{info, warn};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub(crate) struct DeleteRequest {
    pub instance_name: String,
    pub app_name: String,
    /// Defaults to the application name.
    pub project_name: Option<String>,
    pub namespace: Option<String>,
    pub terminate_operation: bool,
}

impl DeleteRequest {
    pub fn project_name(&self) -> &str {
        self.project_name.as_deref().unwrap_or(&self.app_name)
    }
}

impl From<DeleteTarget> for DeleteRequest {
    fn from(args: DeleteTarget) -> Self {
        Self {
            instance_name: args.instance,
            app_name: args.app,
            project_name: args.project,
            namespace: args.namespace,
            terminate_operation: args.terminate,
        }
    }
}

/// Where one half of the delete lifecycle ended up.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum DeletionState {
    /// Accepted by Argo CD but still present.
    Pending,
    /// Confirmed absent.
    Confirmed,
    /// Not attempted because the application is not confirmed gone.
    Skipped,
    Failed,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum DeleteStatus {
    Success,
    Failed,
    Skipped,
}

impl DeletionState {
    fn status(self) -> DeleteStatus {
        match self {
            DeletionState::Pending | DeletionState::Confirmed => DeleteStatus::Success,
            DeletionState::Skipped => DeleteStatus::Skipped,
            DeletionState::Failed => DeleteStatus::Failed,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponseSchema {
    pub status: DeleteStatus,
    pub state: DeletionState,
    pub message: String,
    pub argo_response: Value,
}

impl ResponseSchema {
    fn new(state: DeletionState, message: impl Into<String>, argo_response: Value) -> Self {
        Self {
            status: state.status(),
            state,
            message: message.into(),
            argo_response,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteApplicationAndProjectResponse {
    pub argo_delete_app_resp: ResponseSchema,
    pub argo_delete_project_resp: ResponseSchema,
}

enum Classification {
    Gone,
    Accepted,
    Rejected,
}

fn classify(status: StatusCode) -> Classification {
    if status == StatusCode::NOT_FOUND {
        Classification::Gone
    } else if status.is_success() {
        Classification::Accepted
    } else {
        Classification::Rejected
    }
}

/// Deletes an application and, only once it is confirmed gone, its project.
pub(crate) async fn delete_app_and_project(
    ctx: &Context,
    request: &DeleteRequest,
) -> Result<DeleteApplicationAndProjectResponse> {
    let client = ctx.client_for(&request.instance_name).await?;
    let app_name = &request.app_name;
    let namespace = request.namespace.as_deref();

    if request.terminate_operation {
        // Best effort; the delete goes ahead whatever happens here.
        match client.terminate_operation(app_name, namespace).await {
            Ok(resp) if !resp.status().is_success() => warn!(
                "terminating operation on {app_name} returned {}: {}",
                resp.status(),
                resp.message()
            ),
            Ok(_) => {}
            Err(err) => warn!("could not terminate operation on {app_name}: {err}"),
        }
    }

    let deleted = client.delete_application(app_name, namespace).await?;
    let app_resp = match classify(deleted.status()) {
        Classification::Gone => ResponseSchema::new(
            DeletionState::Confirmed,
            "application does not exist and therefore does not need to be deleted",
            deleted.body,
        ),
        Classification::Rejected => {
            ResponseSchema::new(DeletionState::Failed, deleted.message(), deleted.body)
        }
        Classification::Accepted => {
            info!("attempting to wait for argo application {app_name} to delete");
            wait_for_app_deletion(
                ctx,
                &client,
                request,
                ResponseSchema::new(
                    DeletionState::Pending,
                    "application pending deletion",
                    deleted.body,
                ),
            )
            .await
        }
    };

    let project_resp = match app_resp.state {
        DeletionState::Confirmed => delete_project(&client, request.project_name()).await,
        _ => ResponseSchema::new(
            DeletionState::Skipped,
            "project deletion skipped due to application still existing and pending deletion, or the application failed to delete",
            Value::Null,
        ),
    };

    Ok(DeleteApplicationAndProjectResponse {
        argo_delete_app_resp: app_resp,
        argo_delete_project_resp: project_resp,
    })
}

/// Polls the application until it is gone, an error shows up, or the cycles run out.
async fn wait_for_app_deletion(
    ctx: &Context,
    client: &ArgoClient,
    request: &DeleteRequest,
    accepted: ResponseSchema,
) -> ResponseSchema {
    let cycles = ctx.settings.wait_cycles;
    let mut state = accepted;

    for attempt in 0..cycles {
        let info = match client
            .get_application_info(&request.app_name, request.namespace.as_deref())
            .await
        {
            Ok(info) => info,
            Err(err) => {
                return ResponseSchema::new(
                    DeletionState::Failed,
                    format!("a request was successfully sent to delete your application, but when getting your application information we received {err}"),
                    Value::Null,
                )
            }
        };

        state = match classify(info.status()) {
            Classification::Gone => {
                return ResponseSchema::new(
                    DeletionState::Confirmed,
                    format!("application deleted successfully - {}", info.message()),
                    info.body,
                )
            }
            Classification::Rejected => {
                return ResponseSchema::new(
                    DeletionState::Failed,
                    format!("a request was successfully sent to delete your application, but when getting your application information we received {}", info.message()),
                    info.body,
                )
            }
            Classification::Accepted => still_pending(info),
        };

        if attempt + 1 < cycles {
            if let Err(err) = delay(ctx.settings.poll_interval, &ctx.cancel).await {
                warn!("stopped waiting for {} to delete: {err}", request.app_name);
                return ResponseSchema {
                    message: format!("{} ({err})", state.message),
                    ..state
                };
            }
        }
    }

    state
}

fn still_pending(info: StatusResponse) -> ResponseSchema {
    let metadata = info.body.get("metadata");
    let field = |key: &str| {
        metadata
            .and_then(|m| m.get(key))
            .map(|v| v.as_str().map(str::to_owned).unwrap_or_else(|| v.to_string()))
            .unwrap_or_else(|| "undefined".to_owned())
    };
    let message = format!(
        "application still pending deletion with the deletion timestamp of {} and deletionGracePeriodSeconds of {}",
        field("deletionTimestamp"),
        field("deletionGracePeriodSeconds"),
    );
    ResponseSchema::new(DeletionState::Pending, message, info.body)
}

async fn delete_project(client: &ArgoClient, project_name: &str) -> ResponseSchema {
    let deleted = match client.delete_project(project_name).await {
        Ok(deleted) => deleted,
        Err(err) => {
            return ResponseSchema::new(
                DeletionState::Failed,
                format!("project deletion failed - {err}"),
                Value::Null,
            )
        }
    };

    match classify(deleted.status()) {
        Classification::Gone => ResponseSchema::new(
            DeletionState::Confirmed,
            format!(
                "project does not exist and therefore does not need to be deleted - {}",
                deleted.message()
            ),
            deleted.body,
        ),
        Classification::Accepted => ResponseSchema::new(
            DeletionState::Pending,
            "project is pending deletion",
            deleted.body,
        ),
        Classification::Rejected => ResponseSchema::new(
            DeletionState::Failed,
            format!("project deletion failed - {}", deleted.message()),
            deleted.body,
        ),
    }
}

pub(crate) async fn terminate_argo_app_operation(
    ctx: &Context,
    instance_name: &str,
    app_name: &str,
    namespace: Option<&str>,
) -> Result<StatusResponse> {
    ctx.client_for(instance_name)
        .await?
        .terminate_operation(app_name, namespace)
        .await
}
