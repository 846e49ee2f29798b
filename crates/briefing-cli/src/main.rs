use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use briefing_protocol::{default_socket_path, JsonRpcRequest, SocketClient};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::io::AsyncReadExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "briefing", version, about = "Talk to a running briefingd")]
struct Args {
    /// Socket path (defaults to ~/.briefing/briefing.sock)
    #[arg(long, global = true, env = "BRIEFING_SOCKET")]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Daemon, model and rate limiter status
    Status,
    /// Summarize text given inline, from a file, or on stdin
    Summarize {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        max_length: Option<u64>,
    },
    /// List action items found in text
    Tasks {
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Categorize file names
    Categorize {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Meeting-load insights for a JSON file of calendar events
    Calendar {
        file: PathBuf,
        /// Day to count meetings for, YYYY-MM-DD
        #[arg(long)]
        today: Option<String>,
    },
    /// Retry loading the summarization model
    Reload,
}

async fn read_text(text: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()));
    }

    let mut buf = String::new();
    tokio::io::stdin().read_to_string(&mut buf).await?;
    Ok(buf)
}

async fn read_events(path: &Path) -> anyhow::Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;

    // accept a bare array or a calendar export with an `events` field
    match parsed {
        Value::Array(_) => Ok(parsed),
        Value::Object(mut obj) => match obj.remove("events") {
            Some(events @ Value::Array(_)) => Ok(events),
            _ => bail!("{} has no `events` array", path.display()),
        },
        _ => bail!("{} must contain a JSON array of events", path.display()),
    }
}

async fn build_request(command: Command) -> anyhow::Result<JsonRpcRequest> {
    let (method, params) = match command {
        Command::Status => ("server.status", json!({})),
        Command::Summarize {
            text,
            file,
            max_length,
        } => {
            let text = read_text(text, file).await?;
            let mut params = json!({ "text": text });
            if let Some(max_length) = max_length {
                params["max_length"] = json!(max_length);
            }
            ("text.summarize", params)
        }
        Command::Tasks { text, file } => {
            let text = read_text(text, file).await?;
            ("text.tasks", json!({ "text": text }))
        }
        Command::Categorize { names } => {
            let files: Vec<Value> = names.into_iter().map(|name| json!({ "name": name })).collect();
            ("files.categorize", json!({ "files": files }))
        }
        Command::Calendar { file, today } => {
            let mut params = json!({ "events": read_events(&file).await? });
            if let Some(today) = today {
                params["today"] = json!(today);
            }
            ("calendar.insights", params)
        }
        Command::Reload => ("model.reload", json!({})),
    };

    Ok(JsonRpcRequest::new(method, params))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let socket = match args.socket {
        Some(path) => path,
        None => default_socket_path().context("could not determine home directory")?,
    };

    let request = build_request(args.command).await?;
    debug!("Calling {} on {:?}", request.method, socket);

    let mut client = SocketClient::connect_to(socket).await?;
    let response = client.call(request).await?;

    if let Some(error) = response.error {
        match error.data {
            Some(data) => bail!("{} ({}): {}", error.message, error.code, data),
            None => bail!("{} ({})", error.message, error.code),
        }
    }

    let result = response.result.unwrap_or(Value::Null);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
