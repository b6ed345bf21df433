use crate::argocd::SyncResponse;
use crate::commands::find_app::{find_argo_app, AppQuery, FindAppResult};
use crate::error::Result;
use crate::Context;
use futures::future::{join_all, try_join_all};
use log::{error, info};

pub(crate) async fn sync_argo_app(
    ctx: &Context,
    instance_name: &str,
    app_name: &str,
) -> Result<SyncResponse> {
    ctx.client_for(instance_name)
        .await?
        .sync_application(app_name)
        .await
}

/// Syncs every application matching `selector` on every instance that has one.
///
/// Instances are synced concurrently. A failing instance contributes a single
/// failure entry and does not affect the others.
pub(crate) async fn resync_app_on_all_argos(
    ctx: &Context,
    selector: &str,
) -> Result<Vec<Vec<SyncResponse>>> {
    let query = AppQuery {
        selector: Some(selector.to_owned()),
        ..Default::default()
    };
    let found = find_argo_app(ctx, &query).await?;
    info!("resyncing {selector} on {} instances", found.len());

    Ok(join_all(found.iter().map(|instance| resync_instance(ctx, instance))).await)
}

async fn resync_instance(ctx: &Context, found: &FindAppResult) -> Vec<SyncResponse> {
    let synced = async {
        let client = ctx.client_for(&found.name).await?;
        try_join_all(
            found
                .app_name
                .iter()
                .map(|app_name| client.sync_application(app_name)),
        )
        .await
    }
    .await;

    match synced {
        Ok(responses) => responses,
        Err(err) => {
            error!("Error resyncing apps on {}: {err}", found.name);
            vec![SyncResponse::failure(err.to_string())]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argocd::SyncStatus;
    use crate::test_support::{context, instance};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_list(server: &MockServer, names: &[&str]) {
        let items: Vec<_> = names
            .iter()
            .map(|name| json!({ "metadata": { "name": name } }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/v1/applications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": items })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn syncs_every_matched_app_per_instance() {
        let prod = MockServer::start().await;
        mount_list(&prod, &["payments-api", "payments-worker"]).await;
        for app in ["payments-api", "payments-worker"] {
            Mock::given(method("POST"))
                .and(path(format!("/api/v1/applications/{app}/sync")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
                .expect(1)
                .mount(&prod)
                .await;
        }

        let staging = MockServer::start().await;
        mount_list(&staging, &["payments-api"]).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/applications/payments-api/sync"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&staging)
            .await;

        let ctx = context(vec![
            instance("prod", &prod.uri(), Some("tok")),
            instance("staging", &staging.uri(), Some("tok")),
        ]);
        let resp = resync_app_on_all_argos(&ctx, "backstage-name=payments")
            .await
            .unwrap();

        assert_eq!(
            resp,
            vec![
                vec![
                    SyncResponse::success("Re-synced payments-api on prod"),
                    SyncResponse::success("Re-synced payments-worker on prod"),
                ],
                vec![SyncResponse::failure("Failed to resync payments-api on staging")],
            ]
        );
    }

    #[tokio::test]
    async fn nothing_matched_means_nothing_synced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/applications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": null })))
            .mount(&server)
            .await;

        let ctx = context(vec![instance("prod", &server.uri(), Some("tok"))]);
        let resp = resync_app_on_all_argos(&ctx, "backstage-name=nothing")
            .await
            .unwrap();
        assert!(resp.is_empty());
    }

    #[tokio::test]
    async fn single_sync_uses_named_instance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/applications/payments/sync"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context(vec![instance("prod", &server.uri(), Some("tok"))]);
        let resp = sync_argo_app(&ctx, "prod", "payments").await.unwrap();
        assert_eq!(resp.status, SyncStatus::Success);
    }
}
