mod catalog;
mod config;
mod dispatch;
mod envelope;
mod errors;
mod logging;
mod mcp;
mod security;
mod server;
mod tools;


use crate::{
    config::{Config, Transport},
    dispatch::Dispatcher,
    mcp::registry::ToolRegistry,
};
use anyhow::Context;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut transport: Option<String> = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--config requires a path");
                    std::process::exit(2);
                }
                config_path = Some(PathBuf::from(&args[i]));
            }
            "--transport" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("--transport requires stdio or http");
                    std::process::exit(2);
                }
                transport = Some(args[i].clone());
            }
            _ => {}
        }
        i += 1;
    }

    let mut cfg = match &config_path {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    cfg.apply_env(|k| std::env::var(k).ok()).context("reading environment")?;
    if let Some(t) = transport {
        cfg.server.transport = t.parse()?;
    }
    cfg.validate().context("validating config")?;

    let dispatcher = Dispatcher::new(&cfg.api, &cfg.limits).context("building HTTP client")?;
    let registry = ToolRegistry::new(dispatcher)?;

    info!(
        transport = ?cfg.server.transport,
        api = %cfg.api.base_url,
        auth = cfg.api.token.is_some(),
        tools = registry.catalog().len(),
        "notebook-mcp ready"
    );

    match cfg.server.transport {
        Transport::Stdio => mcp::stdio::serve(Arc::new(registry)).await,
        Transport::Http => server::serve(cfg, registry).await,
    }
}
