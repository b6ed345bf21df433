use crate::config::{DefaultCredentials, InstanceConfig};
use crate::error::{ArgoError, Result};
use log::{debug, error};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct SessionRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    token: String,
}

/// Logs into the instance's session endpoint and returns a bearer token.
///
/// Per-instance credentials take precedence over the defaults. Nothing is cached.
pub(crate) async fn get_argo_token(
    http: &reqwest::Client,
    instance: &InstanceConfig,
    defaults: &DefaultCredentials,
) -> Result<String> {
    let username = instance
        .username
        .as_deref()
        .or(defaults.username.as_deref());
    let password = instance
        .password
        .as_deref()
        .or(defaults.password.as_deref());
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ArgoError::MissingCredentials(instance.name.to_owned()));
    };

    debug!("requesting session token from {}", instance.url);
    let resp = http
        .post(format!("{}/api/v1/session", instance.base_url()))
        .json(&SessionRequest { username, password })
        .send()
        .await?;

    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        error!("unauthorized for argo instance {}", instance.url);
        return Err(ArgoError::Unauthorized {
            url: instance.url.to_owned(),
        });
    }
    if !status.is_success() {
        error!("failed to get argo token: {} ({status})", instance.url);
        return Err(ArgoError::TokenFetch {
            url: instance.url.to_owned(),
            status,
        });
    }

    Ok(resp.json::<SessionResponse>().await?.token)
}

/// The static token when one is configured, otherwise a fresh session token.
pub(crate) async fn token_for(
    http: &reqwest::Client,
    instance: &InstanceConfig,
    defaults: &DefaultCredentials,
) -> Result<String> {
    match &instance.token {
        Some(token) => Ok(token.to_owned()),
        None => get_argo_token(http, instance, defaults).await,
    }
}
