use anyhow::{Context, Result};
use clap::Parser;
use common::config::{self, DEFAULT_REDUCER_COUNT};
use coordinator::{inputs::expand_inputs, serve, Coordinator};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Cada cuánto el driver pregunta si el job terminó.
const DONE_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "coordinator")]
#[command(about = "Coordinador MapReduce: reparte tareas map/reduce a los workers")]
struct Args {
    /// Archivos de entrada (rutas o patrones glob), uno por tarea map
    #[arg(value_name = "ARCHIVOS", required = true)]
    inputs: Vec<String>,

    /// Cantidad de tareas reduce (R)
    #[arg(short = 'r', long, default_value_t = DEFAULT_REDUCER_COUNT,
          value_parser = clap::value_parser!(u32).range(1..))]
    n_reduce: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coordinator=debug,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let files = expand_inputs(&args.inputs)?;

    let coordinator = Coordinator::new(files, args.n_reduce, config::lease_timeout());

    let addr = config::coordinator_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {addr}"))?;
    info!("coordinador escuchando en {}", listener.local_addr()?);

    let server_state = coordinator.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = serve(listener, server_state).await {
            error!("servidor RPC terminó con error: {:?}", e);
        }
    });

    while !coordinator.is_job_done() {
        tokio::time::sleep(DONE_POLL_INTERVAL).await;
    }
    info!("job terminado");

    // margen para que los workers vean `done` antes de cerrar el socket
    tokio::time::sleep(DONE_POLL_INTERVAL).await;

    coordinator.shutdown();
    server.abort();
    Ok(())
}
