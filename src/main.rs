extern crate log;

use anyhow::{Context as anyhowContext, Result};
use clap::Parser;
use cli::Command;
use dialoguer::Confirm;
use log::{info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

mod argocd;
mod cli;
mod client;
mod commands;
mod config;
mod delay;
mod error;
mod session;
#[cfg(test)]
mod test_support;

use crate::client::ArgoClient;
use crate::config::{InstanceConfig, Settings};

/// Everything a request needs: the shared HTTP client, read-only settings and
/// the shutdown signal that interrupts delete polling.
pub(crate) struct Context {
    http: reqwest::Client,
    settings: Settings,
    cancel: CancellationToken,
}

impl Context {
    fn new(settings: Settings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    async fn connect(&self, instance: &InstanceConfig) -> error::Result<ArgoClient> {
        let token = session::token_for(&self.http, instance, &self.settings.credentials).await?;
        Ok(ArgoClient::new(self.http.clone(), instance, token))
    }

    async fn client_for(&self, instance_name: &str) -> error::Result<ArgoClient> {
        let instance = self.settings.registry.resolve(instance_name)?;
        self.connect(instance).await
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = cli::App::parse();
    let opts = args.global_opts;

    let mut settings = Settings::load(&opts.config)?;
    if opts.username.is_some() {
        settings.credentials.username = opts.username;
    }
    if opts.password.is_some() {
        settings.credentials.password = opts.password;
    }
    info!("{} argo instances configured", settings.registry.len());
    let ctx = Context::new(settings);

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            cancel.cancel();
        }
    });

    match args.command {
        Command::Instances {} => print_json(&commands::list_instances(&ctx))?,
        Command::Find(args) => {
            let found = commands::find_argo_app(&ctx, &args.into())
                .await
                .context("finding argo apps")?;
            print_json(&found)?;
        }
        Command::Create(args) => {
            commands::create_argo_resources(&ctx, &args.into())
                .await
                .context("creating argo project and application")?;
            println!("Done");
        }
        Command::Update(args) => {
            let outcome = commands::update_argo_project_and_app(&ctx, &args.into())
                .await
                .context("updating argo project and application")?;
            print_json(&outcome)?;
        }
        Command::Delete(args) => {
            let request: commands::DeleteRequest = args.delete.into();
            let project = request.project_name().to_owned();
            if !args.yes
                && !Confirm::new()
                    .with_prompt(format!(
                        "Delete application {} and project {project} on {}?",
                        request.app_name, request.instance_name
                    ))
                    .interact()?
            {
                println!("Aborted");
                return Ok(());
            }
            let resp = commands::delete_app_and_project(&ctx, &request)
                .await
                .context(format!("deleting {}", request.app_name))?;
            print_json(&resp)?;
        }
        Command::Sync(args) => {
            let resp = commands::sync_argo_app(&ctx, &args.instance, &args.app)
                .await
                .context(format!("syncing {}", args.app))?;
            print_json(&resp)?;
        }
        Command::Resync { selector } => {
            let resp = commands::resync_app_on_all_argos(&ctx, &selector)
                .await
                .context(format!("resyncing apps matching {selector}"))?;
            print_json(&resp)?;
        }
        Command::Terminate(args) => {
            let resp = commands::terminate_argo_app_operation(
                &ctx,
                &args.instance,
                &args.app,
                args.namespace.as_deref(),
            )
            .await
            .context(format!("terminating operation on {}", args.app))?;
            print_json(&resp)?;
        }
        Command::Status(args) => {
            let resp = commands::get_argo_application_info(
                &ctx,
                &args.instance,
                &args.app,
                args.namespace.as_deref(),
            )
            .await
            .context(format!("getting status of {}", args.app))?;
            print_json(&resp)?;
        }
        Command::Project { instance, project } => {
            let resp = commands::get_argo_project(&ctx, &instance, &project)
                .await
                .context(format!("getting project {project}"))?;
            print_json(&resp)?;
        }
        Command::Revision(args) => {
            let resp = commands::get_revision_data(
                &ctx,
                &args.app.instance,
                &args.app.app,
                args.app.namespace.as_deref(),
                &args.revision,
            )
            .await
            .context(format!("getting revision {}", args.revision))?;
            print_json(&resp)?;
        }
    }

    Ok(())
}
