use crate::argocd::{
    AppSummary, ApplicationList, ArgoApplication, ArgoProject, InstanceRef, RevisionMetadata,
    SyncResponse,
};
use crate::config::InstanceConfig;
use crate::error::{ArgoError, Result};
use log::{error, info};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};

const APP_NAMESPACE_QUERY_PARAM: &str = "appNamespace";
const DUPLICATE_PROJECT_MARKER: &str = "existing project spec is different";

/// A response whose status the caller has to reason about, e.g. 404 on delete.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status_code: u16,
    pub body: Value,
}

impl StatusResponse {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn message(&self) -> String {
        message_of(&self.body)
    }
}

fn message_of(body: &Value) -> String {
    match body.get("message").and_then(Value::as_str) {
        Some(message) => message.to_owned(),
        None => match body {
            Value::String(text) => text.to_owned(),
            Value::Null => String::new(),
            other => other.to_string(),
        },
    }
}

async fn read_body(resp: Response) -> Result<(StatusCode, Value)> {
    let status = resp.status();
    let text = resp.text().await?;
    if text.trim().is_empty() {
        return Ok((status, Value::Null));
    }
    let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
    Ok((status, body))
}

/// Gateway to a single Argo CD instance, authenticated with one bearer token.
pub(crate) struct ArgoClient {
    client: reqwest::Client,
    instance_name: String,
    base_url: String,
    token: String,
}

impl ArgoClient {
    pub fn new(client: reqwest::Client, instance: &InstanceConfig, token: String) -> Self {
        Self {
            client,
            instance_name: instance.name.to_owned(),
            base_url: instance.base_url().to_owned(),
            token,
        }
    }

    fn request(&self, method: Method, route: &str, namespace: Option<&str>) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/api/v1/{route}", self.base_url))
            .bearer_auth(&self.token);
        match namespace {
            Some(namespace) => builder.query(&[(APP_NAMESPACE_QUERY_PARAM, namespace)]),
            None => builder,
        }
    }

    /// Fetches one application by name, tagged with this instance's name.
    pub async fn get_application(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<AppSummary> {
        let resp = self
            .request(Method::GET, &format!("applications/{name}"), namespace)
            .send()
            .await?;
        let (status, body) = read_body(resp).await?;
        if !status.is_success() {
            return Err(ArgoError::remote(
                format!("getting argo app {name}"),
                status,
                message_of(&body),
            ));
        }
        let mut app: AppSummary = serde_json::from_value(body)?;
        app.metadata.instance = Some(self.instance_ref());
        Ok(app)
    }

    /// Lists applications matching a label selector, each tagged with this instance's name.
    pub async fn list_applications(
        &self,
        selector: &str,
        namespace: Option<&str>,
    ) -> Result<ApplicationList> {
        let resp = self
            .request(Method::GET, "applications", namespace)
            .query(&[("selector", selector)])
            .send()
            .await?;
        let (status, body) = read_body(resp).await?;
        if !status.is_success() {
            return Err(ArgoError::remote(
                format!("listing argo apps for selector {selector}"),
                status,
                message_of(&body),
            ));
        }
        let mut list: ApplicationList = serde_json::from_value(body)?;
        for item in list.items.iter_mut().flatten() {
            item.metadata.instance = Some(self.instance_ref());
        }
        Ok(list)
    }

    fn instance_ref(&self) -> InstanceRef {
        InstanceRef {
            name: self.instance_name.to_owned(),
        }
    }

    pub async fn get_application_info(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<StatusResponse> {
        self.send_for_status(
            self.request(Method::GET, &format!("applications/{name}"), namespace),
            &format!("getting argo application information for {name}"),
        )
        .await
    }

    pub async fn get_revision_data(
        &self,
        name: &str,
        namespace: Option<&str>,
        revision: &str,
    ) -> Result<RevisionMetadata> {
        let resp = self
            .request(
                Method::GET,
                &format!("applications/{name}/revisions/{revision}/metadata"),
                namespace,
            )
            .send()
            .await?;
        let (status, body) = read_body(resp).await?;
        if !status.is_success() {
            return Err(ArgoError::remote(
                format!("getting revision {revision} of {name}"),
                status,
                message_of(&body),
            ));
        }
        Ok(serde_json::from_value(body)?)
    }

    pub async fn get_project(&self, name: &str) -> Result<ArgoProject> {
        let resp = self
            .request(Method::GET, &format!("projects/{name}"), None)
            .send()
            .await?;
        let (status, body) = read_body(resp).await?;
        if status != StatusCode::OK {
            let message = message_of(&body);
            error!("Failed to get argo project {name}: {message}");
            return Err(ArgoError::remote("failed to get argo project", status, message));
        }
        Ok(serde_json::from_value(body)?)
    }

    /// Creates a project. A 404 body is handed back as-is for the caller to inspect.
    pub async fn create_project(&self, project: &ArgoProject) -> Result<Value> {
        let resp = self
            .request(Method::POST, "projects", None)
            .json(&json!({ "project": project }))
            .send()
            .await?;
        let (status, body) = read_body(resp).await?;
        if status == StatusCode::FORBIDDEN {
            return Err(ArgoError::Forbidden(message_of(&body)));
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(body);
        }
        // Argo CD has no dedicated status for this conflict.
        if body.to_string().contains(DUPLICATE_PROJECT_MARKER) {
            return Err(ArgoError::DuplicateProject);
        }
        if !status.is_success() {
            let message = message_of(&body);
            error!("Error creating argo project {}: {message}", project.metadata.name);
            return Err(ArgoError::remote("error creating argo project", status, message));
        }
        Ok(body)
    }

    pub async fn update_project(&self, project: &ArgoProject) -> Result<Value> {
        let name = &project.metadata.name;
        let resp = self
            .request(Method::PUT, &format!("projects/{name}"), None)
            .json(&json!({ "project": project }))
            .send()
            .await?;
        let (status, body) = read_body(resp).await?;
        if status != StatusCode::OK {
            let message = message_of(&body);
            error!("Error updating argo project {name}: {message}");
            return Err(ArgoError::remote("error updating argo project", status, message));
        }
        Ok(body)
    }

    pub async fn create_application(&self, app: &ArgoApplication) -> Result<Value> {
        let resp = self
            .request(Method::POST, "applications", None)
            .json(app)
            .send()
            .await?;
        let (status, body) = read_body(resp).await?;
        if !status.is_success() {
            let message = message_of(&body);
            error!("Error creating argo app {}: {message}", app.metadata.name);
            return Err(ArgoError::remote("error creating argo app", status, message));
        }
        Ok(body)
    }

    pub async fn update_application(&self, app: &ArgoApplication) -> Result<Value> {
        let name = &app.metadata.name;
        let resp = self
            .request(Method::PUT, &format!("applications/{name}"), None)
            .json(app)
            .send()
            .await?;
        let (status, body) = read_body(resp).await?;
        if status != StatusCode::OK {
            let message = message_of(&body);
            error!("Error updating argo app {name}: {message}");
            return Err(ArgoError::remote("error updating argo app", status, message));
        }
        Ok(body)
    }

    pub async fn sync_application(&self, app_name: &str) -> Result<SyncResponse> {
        let resp = self
            .request(Method::POST, &format!("applications/{app_name}/sync"), None)
            .json(&json!({
                "prune": false,
                "dryRun": false,
                "strategy": { "hook": { "force": true } },
                "resources": null,
            }))
            .send()
            .await?;
        let instance = &self.instance_name;
        if resp.status().is_success() {
            return Ok(SyncResponse::success(format!(
                "Re-synced {app_name} on {instance}"
            )));
        }
        Ok(SyncResponse::failure(format!(
            "Failed to resync {app_name} on {instance}"
        )))
    }

    /// Deletes an application together with the resources it manages.
    pub async fn delete_application(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<StatusResponse> {
        self.send_for_status(
            self.request(Method::DELETE, &format!("applications/{name}"), namespace)
                .query(&[("cascade", "true")]),
            &format!("deleting argo application {name}"),
        )
        .await
    }

    pub async fn delete_project(&self, name: &str) -> Result<StatusResponse> {
        self.send_for_status(
            self.request(Method::DELETE, &format!("projects/{name}"), None),
            &format!("deleting argo project {name}"),
        )
        .await
    }

    pub async fn terminate_operation(
        &self,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<StatusResponse> {
        info!(
            "Terminating current operation for {} and {name}",
            self.instance_name
        );
        self.send_for_status(
            self.request(
                Method::DELETE,
                &format!("applications/{name}/operation"),
                namespace,
            ),
            &format!("terminating operation for {name}"),
        )
        .await
    }

    async fn send_for_status(&self, request: RequestBuilder, what: &str) -> Result<StatusResponse> {
        let resp = request.send().await.map_err(|err| {
            error!("Error {what} in {}: {err}", self.instance_name);
            err
        })?;
        let (status, body) = read_body(resp).await?;
        Ok(StatusResponse {
            status_code: status.as_u16(),
            body,
        })
    }
}
