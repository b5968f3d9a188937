#[macro_use]
extern crate lazy_static;

use std::sync::Arc;

use anyhow::Context;
use kube::Client;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod container;
mod contexts;
mod deployment;
mod dispatcher;
mod error;
mod events;
mod mcp;
mod pod;
mod prometheus;
mod reader;
mod slack;
mod snapshot;
mod supervisor;

use crate::{
    api::KubeApi,
    config::Config,
    contexts::ContextRegistry,
    dispatcher::Dispatcher,
    reader::ClusterReader,
    slack::{client::SlackApiClient, ChatFrontend},
    supervisor::{shutdown_signal, Supervisor},
};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,kube=warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    if let Err(e) = run().await {
        error!("Fatal: {e:#}");
        return Err(e);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let client = Client::try_default()
        .await
        .context("could not create a kubernetes client")?;
    let contexts = ContextRegistry::discover();
    info!("Using kubernetes context {}", contexts.active_context().name);

    let slack = SlackApiClient::new(&config.slack_api_base, &config.slack_app_token, &config.slack_bot_token)?;
    let dispatcher = Dispatcher::new(
        ClusterReader::new(Arc::new(KubeApi::new(client))),
        Arc::new(contexts),
        Arc::new(slack.clone()),
    );
    let chat = ChatFrontend::new(slack, dispatcher.clone(), config.reconnect_delay);

    let state = Supervisor::new(dispatcher, chat, config.mcp_port, config.metrics_port)
        .run(shutdown_signal())
        .await?;
    info!("Shut down ({state})");
    Ok(())
}
