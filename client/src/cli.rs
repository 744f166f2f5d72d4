use anyhow::Result;
use clap::{Parser, Subcommand};
use common::{config, JobStatusResponse, TaskState, HEALTH_PATH, STATUS_PATH};
use reqwest::Client;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para consultar al coordinador")]
struct Cli {
    /// URL base del coordinador (default: http://$MR_COORDINATOR_ADDR)
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verifica que el coordinador responda
    Health,
    /// Muestra fase, conteos y tareas del job
    Status {
        /// Lista también cada tarea
        #[arg(long)]
        tasks: bool,
    },
}

fn print_status(job: &JobStatusResponse, with_tasks: bool) {
    println!("Job:");
    println!("  fase: {:?}", job.phase);
    println!("  terminado: {}", job.done);
    println!("  reducers (R): {}", job.reducer_count);
    println!(
        "  map   : total={}, idle={}, leased={}, completadas={}",
        job.map.total(),
        job.map.idle,
        job.map.leased,
        job.map.completed
    );
    if job.reduce.total() == 0 {
        println!("  reduce: (todavía no habilitado)");
    } else {
        println!(
            "  reduce: total={}, idle={}, leased={}, completadas={}",
            job.reduce.total(),
            job.reduce.idle,
            job.reduce.leased,
            job.reduce.completed
        );
    }

    if !with_tasks {
        return;
    }
    println!("  tareas:");
    for t in &job.tasks {
        let since = match (t.state, t.leased_at) {
            (TaskState::Leased, Some(at)) => format!(" desde {}", at),
            _ => String::new(),
        };
        println!(
            "    - {:?} {} {:?} intentos={}{}{}",
            t.kind,
            t.id,
            t.state,
            t.attempts,
            since,
            t.filename
                .as_deref()
                .map(|f| format!(" input={f}"))
                .unwrap_or_default()
        );
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = cli.url.unwrap_or_else(config::coordinator_base_url);

    match cli.command {
        Commands::Health => {
            let url = format!("{}{}", base_url, HEALTH_PATH);
            let resp = client.get(&url).send().await?;
            if resp.status().is_success() {
                println!("coordinador OK en {}", base_url);
            } else {
                println!("coordinador respondió status {}", resp.status());
            }
        }

        Commands::Status { tasks } => {
            let url = format!("{}{}", base_url, STATUS_PATH);
            let resp = client.get(&url).send().await?;
            if resp.status().is_success() {
                let job: JobStatusResponse = resp.json().await?;
                print_status(&job, tasks);
            } else {
                println!("Error consultando {} (status {})", STATUS_PATH, resp.status());
            }
        }
    }

    Ok(())
}
