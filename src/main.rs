//! Demo dispatcher binary.
//!
//! Loads a TOML config, wires the standard middleware stack and serves a
//! couple of routes. Mostly useful as a living example of embedding the
//! dispatcher; real applications depend on the library crate.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use trellis::config::{load_config, ServerConfig};
use trellis::middleware::{access_log, record_metrics, request_id, ErrorPages, Recovery};
use trellis::observability;
use trellis::{Context, HttpServer};

#[derive(Parser, Debug)]
#[command(name = "trellis", about = "HTTP request dispatcher demo server")]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match args.config {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("{error}");
                return ExitCode::FAILURE;
            }
        },
        None => ServerConfig::default(),
    };
    if let Some(addr) = args.addr {
        config.listener.bind_address = addr;
    }

    observability::logging::init(&config.logging);
    observability::metrics::describe();

    let server = match build_server(&config) {
        Ok(server) => server,
        Err(error) => {
            // Invalid route table: refuse to start.
            tracing::error!(%error, "route registration failed");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(address = %config.listener.bind_address, %error, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.listener.max_body_bytes,
        "configuration loaded"
    );

    if let Err(error) = server.run(listener).await {
        tracing::error!(%error, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn build_server(config: &ServerConfig) -> Result<HttpServer, trellis::RouteError> {
    Ok(HttpServer::builder()
        .max_body_bytes(config.listener.max_body_bytes)
        .middleware(Recovery::default().build())
        .middleware(request_id())
        .middleware(access_log())
        .middleware(record_metrics())
        .middleware(
            ErrorPages::new()
                .page(404, &b"<h1>nothing here</h1>"[..])
                .build(),
        )
        .get("/healthz", |ctx: &mut Context| {
            if ctx.resp_json(200, &serde_json::json!({ "status": "ok" })).is_err() {
                ctx.resp_status = 500;
            }
        })?
        .get("/greet/:name", |ctx: &mut Context| {
            match ctx.path_value("name") {
                Ok(name) => {
                    let body = format!("hello, {name}!");
                    ctx.resp_status = 200;
                    ctx.resp_data = body.into_bytes();
                }
                Err(_) => ctx.resp_status = 400,
            }
        })?
        .get("/files/*", |ctx: &mut Context| {
            let body = format!("would serve {}", ctx.path());
            ctx.resp_status = 200;
            ctx.resp_data = body.into_bytes();
        })?
        .build())
}
