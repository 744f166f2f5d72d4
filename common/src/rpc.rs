use serde::{Deserialize, Serialize};

use crate::task::{JobPhase, StateCounts, TaskId, TaskStatus};

/* --------- Rutas HTTP del coordinador --------- */

pub const HEALTH_PATH: &str = "/health";
pub const STATUS_PATH: &str = "/api/v1/status";
pub const MAP_LEASE_PATH: &str = "/api/v1/map/lease";
pub const MAP_COMPLETE_PATH: &str = "/api/v1/map/complete";
pub const REDUCE_LEASE_PATH: &str = "/api/v1/reduce/lease";
pub const REDUCE_COMPLETE_PATH: &str = "/api/v1/reduce/complete";

/* --------- Map --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapAssignment {
    /// Archivo de entrada de esta tarea
    pub filename: String,
    pub map_task_id: TaskId,
    /// R: cantidad de particiones que tiene que escribir el map
    pub reducer_count: u32,
}

/// Respuesta de LeaseMapTask:
/// - `task: Some(..)`              -> tarea concedida
/// - `task: None, done: false`     -> esperar y volver a pedir
/// - `done: true`                  -> todos los maps completados, pasar a reduce
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseMapTaskResponse {
    pub task: Option<MapAssignment>,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteMapTaskRequest {
    pub map_task_id: TaskId,
}

/* --------- Reduce --------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReduceAssignment {
    /// Un archivo de partición por cada tarea map, en orden de map id.
    /// Son nombres relativos al directorio de trabajo compartido.
    pub partition_files: Vec<String>,
    pub reduce_task_id: TaskId,
}

/// Respuesta de LeaseReduceTask. `done: true` indica que no queda nada
/// por hacer y el worker puede terminar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseReduceTaskResponse {
    pub task: Option<ReduceAssignment>,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteReduceTaskRequest {
    pub reduce_task_id: TaskId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteTaskResponse {
    pub ok: bool,
}

/* --------- Estado del job --------- */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub phase: JobPhase,
    pub reducer_count: u32,
    pub map: StateCounts,
    pub reduce: StateCounts,
    pub done: bool,
    pub tasks: Vec<TaskStatus>,
}
