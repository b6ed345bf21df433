use crate::argocd::{ArgoProject, RevisionMetadata};
use crate::client::StatusResponse;
use crate::error::Result;
use crate::Context;
use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct InstanceSummary {
    pub name: String,
    pub url: String,
}

pub(crate) fn list_instances(ctx: &Context) -> Vec<InstanceSummary> {
    ctx.settings
        .registry
        .iter()
        .map(|instance| InstanceSummary {
            name: instance.name.to_owned(),
            url: instance.url.to_owned(),
        })
        .collect()
}

/// Raw application document plus status code; a 404 is reported, not raised.
pub(crate) async fn get_argo_application_info(
    ctx: &Context,
    instance_name: &str,
    app_name: &str,
    namespace: Option<&str>,
) -> Result<StatusResponse> {
    ctx.client_for(instance_name)
        .await?
        .get_application_info(app_name, namespace)
        .await
}

pub(crate) async fn get_argo_project(
    ctx: &Context,
    instance_name: &str,
    project_name: &str,
) -> Result<ArgoProject> {
    ctx.client_for(instance_name)
        .await?
        .get_project(project_name)
        .await
}

pub(crate) async fn get_revision_data(
    ctx: &Context,
    instance_name: &str,
    app_name: &str,
    namespace: Option<&str>,
    revision: &str,
) -> Result<RevisionMetadata> {
    ctx.client_for(instance_name)
        .await?
        .get_revision_data(app_name, namespace, revision)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArgoError;
    use crate::test_support::{context, instance};
    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn lists_instances_in_config_order() {
        let ctx = context(vec![
            instance("prod", "https://prod", Some("tok")),
            instance("staging", "https://staging", None),
        ]);
        assert_eq!(
            list_instances(&ctx),
            vec![
                InstanceSummary {
                    name: "prod".to_owned(),
                    url: "https://prod".to_owned()
                },
                InstanceSummary {
                    name: "staging".to_owned(),
                    url: "https://staging".to_owned()
                },
            ]
        );
    }

    #[tokio::test]
    async fn application_info_logs_in_when_no_static_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "fresh" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/applications/payments"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
            .mount(&server)
            .await;

        let ctx = context(vec![instance("prod", &server.uri(), None)]);
        let info = get_argo_application_info(&ctx, "prod", "payments", None)
            .await
            .unwrap();
        assert_eq!(info.status(), StatusCode::NOT_FOUND);
        assert_eq!(info.message(), "not found");
    }

    #[tokio::test]
    async fn revision_metadata_passes_app_namespace() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/applications/payments/revisions/abc123/metadata"))
            .and(query_param("appNamespace", "team-a"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "author": "Jo <jo@example.com>",
                "message": "bump image",
                "tags": ["v1.2.0"]
            })))
            .mount(&server)
            .await;

        let ctx = context(vec![instance("prod", &server.uri(), Some("tok"))]);
        let meta = get_revision_data(&ctx, "prod", "payments", Some("team-a"), "abc123")
            .await
            .unwrap();
        assert_eq!(meta.message.as_deref(), Some("bump image"));
        assert_eq!(meta.tags, vec!["v1.2.0".to_owned()]);
    }

    #[tokio::test]
    async fn project_lookup_on_unknown_instance_fails() {
        let ctx = context(vec![]);
        let err = get_argo_project(&ctx, "nowhere", "payments").await.unwrap_err();
        assert!(matches!(err, ArgoError::NoMatchingInstance(_)));
    }
}
