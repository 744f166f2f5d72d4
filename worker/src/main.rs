use anyhow::{bail, Result};
use clap::Parser;
use common::{apps, config};
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker::{CoordinatorClient, Worker, WorkerExit};

#[derive(Parser)]
#[command(name = "worker")]
#[command(about = "Worker MapReduce: pide tareas al coordinador y las ejecuta")]
struct Args {
    /// Aplicación map/reduce a ejecutar (wc, indexer, nocrash, rtiming, crash)
    #[arg(value_name = "APP", default_value = "wc")]
    app: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=debug,reqwest=info")),
        )
        .init();

    let args = Args::parse();
    let Some(app) = apps::lookup(&args.app) else {
        bail!(
            "aplicación desconocida '{}' (disponibles: {})",
            args.app,
            apps::names().join(", ")
        );
    };

    // Nombre de host (solo para info)
    let hostname = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let client = CoordinatorClient::new(config::coordinator_base_url());
    let work_dir = config::work_dir();
    info!(
        "worker {}-{} arrancando app {} contra {} (dir={})",
        hostname,
        std::process::id(),
        app.name,
        client.base_url(),
        work_dir.display()
    );

    let worker = Worker::new(client, work_dir, config::poll_interval(), app.map, app.reduce);

    match worker.run().await? {
        WorkerExit::JobDone => info!("job completo"),
        WorkerExit::CoordinatorGone => info!("coordinador no disponible, saliendo"),
    }
    Ok(())
}
