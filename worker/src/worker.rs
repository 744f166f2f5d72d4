use anyhow::{Context, Result};
use common::{
    store::{
        group_by_key, output_file_name, read_partitions, write_output, write_partitions,
    },
    KeyValue, MapAssignment, ReduceAssignment,
};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::CoordinatorClient;

/// Por qué terminó el loop del worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// El coordinador avisó que todas las tareas reduce están completas
    JobDone,
    /// Falló una RPC: se asume que el coordinador ya no está
    CoordinatorGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Mapping,
    Reducing,
}

/// Loop del worker, genérico sobre la función map y la función reduce.
///
/// Procesa una tarea a la vez: pide un lease, la ejecuta, escribe los archivos
/// y reporta. Si no hay trabajo duerme `poll_interval` y vuelve a pedir.
pub struct Worker<M, R> {
    client: CoordinatorClient,
    work_dir: PathBuf,
    poll_interval: Duration,
    mapf: Arc<M>,
    reducef: Arc<R>,
}

fn coordinator_gone(e: reqwest::Error) -> WorkerExit {
    warn!("no se pudo hablar con el coordinador ({}), terminando", e);
    WorkerExit::CoordinatorGone
}

impl<M, R> Worker<M, R>
where
    M: Fn(&str, &str) -> Vec<KeyValue> + Send + Sync + 'static,
    R: Fn(&str, &[String]) -> String + Send + Sync + 'static,
{
    pub fn new(
        client: CoordinatorClient,
        work_dir: impl Into<PathBuf>,
        poll_interval: Duration,
        mapf: M,
        reducef: R,
    ) -> Self {
        Self {
            client,
            work_dir: work_dir.into(),
            poll_interval,
            mapf: Arc::new(mapf),
            reducef: Arc::new(reducef),
        }
    }

    /// Corre hasta que el job termina o el coordinador desaparece.
    /// Los errores de I/O se devuelven como `Err`: son fatales para el worker.
    pub async fn run(&self) -> Result<WorkerExit> {
        let mut phase = Phase::Mapping;

        loop {
            match phase {
                Phase::Mapping => {
                    let resp = match self.client.lease_map_task().await {
                        Ok(r) => r,
                        Err(e) => return Ok(coordinator_gone(e)),
                    };

                    if resp.done {
                        info!("todos los maps completados, pasando a reduce");
                        phase = Phase::Reducing;
                        continue;
                    }

                    let Some(task) = resp.task else {
                        debug!("no hay maps libres, esperando {:?}", self.poll_interval);
                        sleep(self.poll_interval).await;
                        continue;
                    };

                    let id = task.map_task_id;
                    self.run_map(task).await?;

                    if let Err(e) = self.client.complete_map_task(id).await {
                        return Ok(coordinator_gone(e));
                    }
                }

                Phase::Reducing => {
                    let resp = match self.client.lease_reduce_task().await {
                        Ok(r) => r,
                        Err(e) => return Ok(coordinator_gone(e)),
                    };

                    if resp.done {
                        info!("job terminado, worker sale");
                        return Ok(WorkerExit::JobDone);
                    }

                    let Some(task) = resp.task else {
                        debug!("no hay reduces libres, esperando {:?}", self.poll_interval);
                        sleep(self.poll_interval).await;
                        continue;
                    };

                    let id = task.reduce_task_id;
                    self.run_reduce(task).await?;

                    if let Err(e) = self.client.complete_reduce_task(id).await {
                        return Ok(coordinator_gone(e));
                    }
                }
            }
        }
    }

    async fn run_map(&self, task: MapAssignment) -> Result<()> {
        info!(
            "tengo map {} (input={}, R={})",
            task.map_task_id, task.filename, task.reducer_count
        );

        let mapf = Arc::clone(&self.mapf);
        let dir = self.work_dir.clone();
        let id = task.map_task_id;

        // funciones de usuario y disco fuera del runtime async
        let paths = tokio::task::spawn_blocking(move || execute_map(&*mapf, &dir, &task))
            .await
            .with_context(|| format!("la tarea map {id} entró en pánico"))??;

        info!("terminé map {} ({} particiones)", id, paths.len());
        Ok(())
    }

    async fn run_reduce(&self, task: ReduceAssignment) -> Result<()> {
        info!(
            "tengo reduce {} ({} particiones)",
            task.reduce_task_id,
            task.partition_files.len()
        );

        let reducef = Arc::clone(&self.reducef);
        let dir = self.work_dir.clone();
        let id = task.reduce_task_id;

        let out = tokio::task::spawn_blocking(move || execute_reduce(&*reducef, &dir, &task))
            .await
            .with_context(|| format!("la tarea reduce {id} entró en pánico"))??;

        info!("terminé reduce {} -> {}", id, out.display());
        Ok(())
    }
}

/// Ejecuta un map completo: lee el archivo de entrada, aplica `mapf` y
/// escribe las `reducer_count` particiones en `dir`.
pub fn execute_map<M>(mapf: &M, dir: &Path, task: &MapAssignment) -> Result<Vec<PathBuf>>
where
    M: Fn(&str, &str) -> Vec<KeyValue> + ?Sized,
{
    let bytes = fs::read(&task.filename)
        .with_context(|| format!("no se pudo leer la entrada {}", task.filename))?;
    let contents = String::from_utf8_lossy(&bytes);

    let records = mapf(&task.filename, &contents);

    write_partitions(dir, task.map_task_id, records, task.reducer_count).with_context(|| {
        format!(
            "no se pudieron escribir las particiones del map {}",
            task.map_task_id
        )
    })
}

/// Ejecuta un reduce completo: junta las particiones, ordena por clave,
/// llama a `reducef` una vez por clave y escribe `mr-out-<id>` en `dir`.
pub fn execute_reduce<R>(reducef: &R, dir: &Path, task: &ReduceAssignment) -> Result<PathBuf>
where
    R: Fn(&str, &[String]) -> String + ?Sized,
{
    let records = read_partitions(dir, &task.partition_files).with_context(|| {
        format!(
            "no se pudieron leer las particiones del reduce {}",
            task.reduce_task_id
        )
    })?;

    let lines: Vec<(String, String)> = group_by_key(records)
        .into_iter()
        .map(|(key, values)| {
            let out = reducef(&key, &values);
            (key, out)
        })
        .collect();

    let path = dir.join(output_file_name(task.reduce_task_id));
    write_output(&path, &lines)
        .with_context(|| format!("no se pudo escribir {}", path.display()))?;
    Ok(path)
}
