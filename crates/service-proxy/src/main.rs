use anyhow::Context;
use clap::Parser;
use serde_json::{json, Value};
use service_proxy::{MockConfig, MockServiceProxy, ServiceCallOptions, ServiceProxy, Verb};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Replay one request against a mock service described by a config file.
#[derive(Parser, Debug)]
#[command(name = "service-proxy")]
struct Args {
    /// Mock config (YAML, or JSON with a .json extension)
    #[arg(short, long, env = "SERVICE_PROXY_CONFIG")]
    config: PathBuf,

    /// create | read | update | patch | delete (HTTP methods accepted too)
    #[arg(short, long, default_value = "read")]
    verb: Verb,

    /// Resource path, e.g. /orders/42
    #[arg(short, long)]
    path: String,

    /// JSON request body
    #[arg(short, long)]
    body: Option<String>,

    /// Request header as name:value (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("Header '{raw}' is not in name:value form"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = MockConfig::from_file(&args.config)?;
    let proxy = MockServiceProxy::from_config(&config).context("Failed to build mock")?;

    let body = args
        .body
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--body is not valid JSON")?;

    let mut options = ServiceCallOptions::default();
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        options.headers.insert(name, value);
    }

    match proxy.dispatch(args.verb, &args.path, body, &options).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            let report = json!({
                "status": e.status(),
                "error": e.to_string(),
                "responseText": e.response_text(),
                "details": e.details(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            std::process::exit(1);
        }
    }
}
